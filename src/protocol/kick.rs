use crate::error::Result;
use crate::nbt::primitive::{read_string, write_string};
use crate::protocol::packet::{id, Packet};
use std::io::{Read, Write};

/// Disconnect/Kick (clientbound). The client shows `reason` and closes the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KickPacket {
    pub reason: String,
}

impl Packet for KickPacket {
    fn packet_id() -> i8 {
        id::KICK
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(KickPacket {
            reason: read_string(reader)?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_string(writer, &self.reason)
    }
}
