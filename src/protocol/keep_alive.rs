use crate::error::Result;
use crate::protocol::packet::{id, Packet};
use std::io::{Read, Write};

/// Keep alive. Has no fields; the client sends it periodically and the server may echo it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeepAlivePacket;

impl Packet for KeepAlivePacket {
    fn packet_id() -> i8 {
        id::KEEP_ALIVE
    }

    fn read_from<R: Read>(_reader: &mut R) -> Result<Self> {
        Ok(KeepAlivePacket)
    }

    fn write_to<W: Write>(&self, _writer: &mut W) -> Result<()> {
        Ok(())
    }
}
