use crate::error::Result;
use crate::nbt::primitive::*;
use crate::protocol::packet::{id, Packet};
use crate::types::{PlayerLook, PlayerPosition};
use std::io::{Read, Write};

/// Flying (serverbound). Sent every tick the player neither moves nor turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlyingPacket {
    pub on_ground: bool,
}

/// Player Position (serverbound). Four doubles (x, y, stance, z) followed by the on-ground
/// flag the client always sends; without that byte the next packet would be misread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPositionPacket {
    pub position: PlayerPosition,
    pub on_ground: bool,
}

/// Player Look (serverbound)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerLookPacket {
    pub look: PlayerLook,
    pub on_ground: bool,
}

/// Player Move And Look. Sent by the client whenever it moves and turns at once, and by the
/// server to place the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerMoveLookPacket {
    pub position: PlayerPosition,
    pub look: PlayerLook,
    pub on_ground: bool,
}

fn read_position<R: Read>(reader: &mut R) -> Result<PlayerPosition> {
    Ok(PlayerPosition {
        x: read_f64(reader)?,
        y: read_f64(reader)?,
        stance: read_f64(reader)?,
        z: read_f64(reader)?,
    })
}

fn write_position<W: Write>(writer: &mut W, position: &PlayerPosition) -> Result<()> {
    write_f64(writer, position.x)?;
    write_f64(writer, position.y)?;
    write_f64(writer, position.stance)?;
    write_f64(writer, position.z)
}

fn read_look<R: Read>(reader: &mut R) -> Result<PlayerLook> {
    Ok(PlayerLook {
        rotation: read_f32(reader)?,
        pitch: read_f32(reader)?,
    })
}

fn write_look<W: Write>(writer: &mut W, look: &PlayerLook) -> Result<()> {
    write_f32(writer, look.rotation)?;
    write_f32(writer, look.pitch)
}

impl Packet for FlyingPacket {
    fn packet_id() -> i8 {
        id::FLYING
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(FlyingPacket {
            on_ground: read_bool(reader)?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_bool(writer, self.on_ground)
    }
}

impl Packet for PlayerPositionPacket {
    fn packet_id() -> i8 {
        id::PLAYER_POSITION
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(PlayerPositionPacket {
            position: read_position(reader)?,
            on_ground: read_bool(reader)?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_position(writer, &self.position)?;
        write_bool(writer, self.on_ground)
    }
}

impl Packet for PlayerLookPacket {
    fn packet_id() -> i8 {
        id::PLAYER_LOOK
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(PlayerLookPacket {
            look: read_look(reader)?,
            on_ground: read_bool(reader)?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_look(writer, &self.look)?;
        write_bool(writer, self.on_ground)
    }
}

impl Packet for PlayerMoveLookPacket {
    fn packet_id() -> i8 {
        id::PLAYER_MOVE_LOOK
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(PlayerMoveLookPacket {
            position: read_position(reader)?,
            look: read_look(reader)?,
            on_ground: read_bool(reader)?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_position(writer, &self.position)?;
        write_look(writer, &self.look)?;
        write_bool(writer, self.on_ground)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_move_look_layout() {
        let packet = PlayerMoveLookPacket {
            position: PlayerPosition {
                x: 1.0,
                y: 64.0,
                stance: 65.62,
                z: -3.5,
            },
            look: PlayerLook {
                rotation: 90.0,
                pitch: -10.0,
            },
            on_ground: true,
        };

        let mut buffer = Vec::new();
        packet.write_packet(&mut buffer).unwrap();
        // id + 4 doubles + 2 floats + flag
        assert_eq!(buffer.len(), 1 + 32 + 8 + 1);
        assert_eq!(buffer[0], 0x0D);
        assert_eq!(&buffer[1..9], &1.0f64.to_be_bytes());
        assert_eq!(&buffer[33..37], &90.0f32.to_be_bytes());

        let read = PlayerMoveLookPacket::read_from(&mut Cursor::new(&buffer[1..])).unwrap();
        assert_eq!(read, packet);
    }

    #[test]
    fn test_position_reads_trailing_on_ground_flag() {
        let mut bytes = Vec::new();
        for value in [8.5f64, 71.0, 72.62, -39.5] {
            bytes.extend_from_slice(&value.to_be_bytes());
        }
        bytes.push(0x01);
        // start of the next packet in the stream
        bytes.push(0x00);

        let mut reader = Cursor::new(&bytes[..]);
        let packet = PlayerPositionPacket::read_from(&mut reader).unwrap();
        assert_eq!(reader.position(), 33);
        assert!(packet.on_ground);
        assert_eq!(packet.position.stance, 72.62);
        assert_eq!(packet.position.z, -39.5);
    }

    #[test]
    fn test_position_and_look_lengths() {
        let mut buffer = Vec::new();
        PlayerPositionPacket {
            position: PlayerPosition::default(),
            on_ground: false,
        }
        .write_to(&mut buffer)
        .unwrap();
        assert_eq!(buffer.len(), 33);

        buffer.clear();
        PlayerLookPacket {
            look: PlayerLook::default(),
            on_ground: true,
        }
        .write_to(&mut buffer)
        .unwrap();
        assert_eq!(buffer, vec![0, 0, 0, 0, 0, 0, 0, 0, 1]);
    }
}
