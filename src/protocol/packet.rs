use crate::error::Result;
use crate::nbt::primitive::{read_i8, write_i8};
use crate::protocol::chunk::{MapChunkPacket, PreChunkPacket};
use crate::protocol::handshake::{HandshakeRequestPacket, HandshakeResponsePacket};
use crate::protocol::keep_alive::KeepAlivePacket;
use crate::protocol::kick::KickPacket;
use crate::protocol::login::{LoginRequestPacket, LoginResponsePacket};
use crate::protocol::player_position_and_look::{
    FlyingPacket, PlayerLookPacket, PlayerMoveLookPacket, PlayerPositionPacket,
};
use crate::protocol::spawn_position::SpawnPositionPacket;
use std::io::{Read, Write};

/// Packet identifiers. Each packet starts with one of these as a signed byte; the fields that
/// follow are fixed per packet and carry no names.
pub mod id {
    pub const KEEP_ALIVE: i8 = 0x00;
    pub const LOGIN: i8 = 0x01;
    pub const HANDSHAKE: i8 = 0x02;
    pub const SPAWN_POSITION: i8 = 0x06;
    pub const FLYING: i8 = 0x0A;
    pub const PLAYER_POSITION: i8 = 0x0B;
    pub const PLAYER_LOOK: i8 = 0x0C;
    pub const PLAYER_MOVE_LOOK: i8 = 0x0D;
    pub const PRE_CHUNK: i8 = 0x32;
    pub const MAP_CHUNK: i8 = 0x33;
    /// 0xFF on the wire
    pub const KICK: i8 = -1;
}

/// Packet trait. Contains the packet ID and the functions to write and read the packet body.
/// The ID byte itself is handled by [`Packet::write_packet`] and the frame codecs.
pub trait Packet: Sized {
    /// Packet ID
    fn packet_id() -> i8;

    /// Reads the fields that follow the packet ID.
    fn read_from<R: Read>(reader: &mut R) -> Result<Self>;

    /// Writes the fields that follow the packet ID.
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()>;

    /// Writes the packet ID followed by the fields.
    fn write_packet<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_i8(writer, Self::packet_id())?;
        self.write_to(writer)
    }
}

/// Result of reading one packet: either a packet this side understands, or an ID it does not.
/// Only the ID byte of an unknown packet is consumed.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame<P> {
    Known(P),
    Unknown(i8),
}

/// Packets sent by the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientPacket {
    KeepAlive(KeepAlivePacket),
    Login(LoginRequestPacket),
    Handshake(HandshakeRequestPacket),
    Flying(FlyingPacket),
    PlayerPosition(PlayerPositionPacket),
    PlayerLook(PlayerLookPacket),
    PlayerMoveLook(PlayerMoveLookPacket),
}

impl ClientPacket {
    pub fn read<R: Read>(reader: &mut R) -> Result<Frame<ClientPacket>> {
        let packet_id = read_i8(reader)?;
        let packet = match packet_id {
            id::KEEP_ALIVE => ClientPacket::KeepAlive(KeepAlivePacket::read_from(reader)?),
            id::LOGIN => ClientPacket::Login(LoginRequestPacket::read_from(reader)?),
            id::HANDSHAKE => ClientPacket::Handshake(HandshakeRequestPacket::read_from(reader)?),
            id::FLYING => ClientPacket::Flying(FlyingPacket::read_from(reader)?),
            id::PLAYER_POSITION => {
                ClientPacket::PlayerPosition(PlayerPositionPacket::read_from(reader)?)
            }
            id::PLAYER_LOOK => ClientPacket::PlayerLook(PlayerLookPacket::read_from(reader)?),
            id::PLAYER_MOVE_LOOK => {
                ClientPacket::PlayerMoveLook(PlayerMoveLookPacket::read_from(reader)?)
            }
            unknown => return Ok(Frame::Unknown(unknown)),
        };
        Ok(Frame::Known(packet))
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            ClientPacket::KeepAlive(packet) => packet.write_packet(writer),
            ClientPacket::Login(packet) => packet.write_packet(writer),
            ClientPacket::Handshake(packet) => packet.write_packet(writer),
            ClientPacket::Flying(packet) => packet.write_packet(writer),
            ClientPacket::PlayerPosition(packet) => packet.write_packet(writer),
            ClientPacket::PlayerLook(packet) => packet.write_packet(writer),
            ClientPacket::PlayerMoveLook(packet) => packet.write_packet(writer),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClientPacket::KeepAlive(_) => "KeepAlive",
            ClientPacket::Login(_) => "Login",
            ClientPacket::Handshake(_) => "Handshake",
            ClientPacket::Flying(_) => "Flying",
            ClientPacket::PlayerPosition(_) => "PlayerPosition",
            ClientPacket::PlayerLook(_) => "PlayerLook",
            ClientPacket::PlayerMoveLook(_) => "PlayerMoveLook",
        }
    }
}

/// Packets sent by the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerPacket {
    KeepAlive(KeepAlivePacket),
    Login(LoginResponsePacket),
    Handshake(HandshakeResponsePacket),
    SpawnPosition(SpawnPositionPacket),
    PlayerMoveLook(PlayerMoveLookPacket),
    PreChunk(PreChunkPacket),
    MapChunk(MapChunkPacket),
    Kick(KickPacket),
}

impl ServerPacket {
    pub fn read<R: Read>(reader: &mut R) -> Result<Frame<ServerPacket>> {
        let packet_id = read_i8(reader)?;
        let packet = match packet_id {
            id::KEEP_ALIVE => ServerPacket::KeepAlive(KeepAlivePacket::read_from(reader)?),
            id::LOGIN => ServerPacket::Login(LoginResponsePacket::read_from(reader)?),
            id::HANDSHAKE => ServerPacket::Handshake(HandshakeResponsePacket::read_from(reader)?),
            id::SPAWN_POSITION => {
                ServerPacket::SpawnPosition(SpawnPositionPacket::read_from(reader)?)
            }
            id::PLAYER_MOVE_LOOK => {
                ServerPacket::PlayerMoveLook(PlayerMoveLookPacket::read_from(reader)?)
            }
            id::PRE_CHUNK => ServerPacket::PreChunk(PreChunkPacket::read_from(reader)?),
            id::MAP_CHUNK => ServerPacket::MapChunk(MapChunkPacket::read_from(reader)?),
            id::KICK => ServerPacket::Kick(KickPacket::read_from(reader)?),
            unknown => return Ok(Frame::Unknown(unknown)),
        };
        Ok(Frame::Known(packet))
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            ServerPacket::KeepAlive(packet) => packet.write_packet(writer),
            ServerPacket::Login(packet) => packet.write_packet(writer),
            ServerPacket::Handshake(packet) => packet.write_packet(writer),
            ServerPacket::SpawnPosition(packet) => packet.write_packet(writer),
            ServerPacket::PlayerMoveLook(packet) => packet.write_packet(writer),
            ServerPacket::PreChunk(packet) => packet.write_packet(writer),
            ServerPacket::MapChunk(packet) => packet.write_packet(writer),
            ServerPacket::Kick(packet) => packet.write_packet(writer),
        }
    }

    /// Short name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            ServerPacket::KeepAlive(_) => "KeepAlive",
            ServerPacket::Login(_) => "Login",
            ServerPacket::Handshake(_) => "Handshake",
            ServerPacket::SpawnPosition(_) => "SpawnPosition",
            ServerPacket::PlayerMoveLook(_) => "PlayerMoveLook",
            ServerPacket::PreChunk(_) => "PreChunk",
            ServerPacket::MapChunk(_) => "MapChunk",
            ServerPacket::Kick(_) => "Kick",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::{BlockPosition, PlayerLook, PlayerPosition};
    use std::io::Cursor;

    fn read_client(bytes: Vec<u8>) -> Frame<ClientPacket> {
        ClientPacket::read(&mut Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn test_login_request_layout() {
        let mut bytes = vec![0x01, 0, 0, 0, 2];
        bytes.extend_from_slice(&[0, 5]);
        bytes.extend_from_slice(b"alice");
        bytes.extend_from_slice(&[0, 0]);

        assert_eq!(
            read_client(bytes),
            Frame::Known(ClientPacket::Login(LoginRequestPacket {
                protocol_version: 2,
                username: "alice".to_owned(),
                password: String::new(),
            }))
        );
    }

    #[test]
    fn test_handshake_and_keep_alive_layout() {
        assert_eq!(
            read_client(vec![0x00]),
            Frame::Known(ClientPacket::KeepAlive(KeepAlivePacket))
        );
        assert_eq!(
            read_client(vec![0x02, 0, 3, b'b', b'o', b'b']),
            Frame::Known(ClientPacket::Handshake(HandshakeRequestPacket {
                username: "bob".to_owned()
            }))
        );
        assert_eq!(
            read_client(vec![0x0A, 1]),
            Frame::Known(ClientPacket::Flying(FlyingPacket { on_ground: true }))
        );
    }

    #[test]
    fn test_unknown_id_consumes_only_the_id() {
        let mut cursor = Cursor::new(vec![0x7F, 0x00]);
        assert_eq!(
            ClientPacket::read(&mut cursor).unwrap(),
            Frame::Unknown(0x7F)
        );
        assert_eq!(cursor.position(), 1);
        assert_eq!(
            ClientPacket::read(&mut cursor).unwrap(),
            Frame::Known(ClientPacket::KeepAlive(KeepAlivePacket))
        );
    }

    #[test]
    fn test_server_packet_ids() {
        let cases = vec![
            (ServerPacket::KeepAlive(KeepAlivePacket), 0x00u8),
            (
                ServerPacket::Login(LoginResponsePacket {
                    player_id: 3,
                    server_name: "s".to_owned(),
                    motd: "m".to_owned(),
                }),
                0x01,
            ),
            (
                ServerPacket::Handshake(HandshakeResponsePacket {
                    server_id: "-".to_owned(),
                }),
                0x02,
            ),
            (
                ServerPacket::SpawnPosition(SpawnPositionPacket {
                    position: BlockPosition::new(1, 2, 3),
                }),
                0x06,
            ),
            (
                ServerPacket::PlayerMoveLook(PlayerMoveLookPacket {
                    position: PlayerPosition::default(),
                    look: PlayerLook::default(),
                    on_ground: false,
                }),
                0x0D,
            ),
            (
                ServerPacket::PreChunk(PreChunkPacket {
                    x: 0,
                    z: 0,
                    mode: true,
                }),
                0x32,
            ),
            (
                ServerPacket::Kick(KickPacket {
                    reason: "bye".to_owned(),
                }),
                0xFF,
            ),
        ];

        for (packet, expected_id) in cases {
            let mut bytes = Vec::new();
            packet.write(&mut bytes).unwrap();
            assert_eq!(bytes[0], expected_id, "{}", packet.name());
            let read = ServerPacket::read(&mut Cursor::new(bytes)).unwrap();
            assert_eq!(read, Frame::Known(packet));
        }
    }

    #[test]
    fn test_truncated_packet_is_incomplete() {
        let err = ClientPacket::read(&mut Cursor::new(vec![0x01, 0, 0])).unwrap_err();
        assert!(err.is_incomplete());
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_negative_string_length_is_decode_error() {
        let err = ClientPacket::read(&mut Cursor::new(vec![0x02, 0x80, 0x00])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
