use crate::error::Result;
use crate::nbt::primitive::{read_string, write_string};
use crate::protocol::packet::{id, Packet};
use std::io::{Read, Write};

/// Handshake (serverbound). First packet of every connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRequestPacket {
    pub username: String,
}

/// Handshake (clientbound). `server_id` is "-" for servers that skip authentication, otherwise
/// a connection hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeResponsePacket {
    pub server_id: String,
}

impl Packet for HandshakeRequestPacket {
    fn packet_id() -> i8 {
        id::HANDSHAKE
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(HandshakeRequestPacket {
            username: read_string(reader)?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_string(writer, &self.username)
    }
}

impl Packet for HandshakeResponsePacket {
    fn packet_id() -> i8 {
        id::HANDSHAKE
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(HandshakeResponsePacket {
            server_id: read_string(reader)?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_string(writer, &self.server_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_response_bytes() {
        let mut buffer = Vec::new();
        HandshakeResponsePacket {
            server_id: "ab".to_owned(),
        }
        .write_packet(&mut buffer)
        .unwrap();
        assert_eq!(buffer, vec![0x02, 0x00, 0x02, b'a', b'b']);
    }
}
