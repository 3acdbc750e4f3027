use crate::error::Result;
use crate::nbt::primitive::{read_i32, write_i32};
use crate::protocol::packet::{id, Packet};
use crate::types::BlockPosition;
use std::io::{Read, Write};

/// Spawn Position (clientbound). Sent once after login; the compass points here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnPositionPacket {
    pub position: BlockPosition,
}

impl Packet for SpawnPositionPacket {
    fn packet_id() -> i8 {
        id::SPAWN_POSITION
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(SpawnPositionPacket {
            position: BlockPosition {
                x: read_i32(reader)?,
                y: read_i32(reader)?,
                z: read_i32(reader)?,
            },
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_i32(writer, self.position.x)?;
        write_i32(writer, self.position.y)?;
        write_i32(writer, self.position.z)
    }
}
