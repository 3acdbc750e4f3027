use crate::error::Result;
use crate::nbt::primitive::{read_i32, read_string, write_i32, write_string};
use crate::protocol::packet::{id, Packet};
use std::io::{Read, Write};

/// Login (serverbound). The password is taken at face value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequestPacket {
    pub protocol_version: i32,
    pub username: String,
    pub password: String,
}

/// Login (clientbound). Carries the session identifier the player was assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResponsePacket {
    pub player_id: i32,
    pub server_name: String,
    pub motd: String,
}

impl Packet for LoginRequestPacket {
    fn packet_id() -> i8 {
        id::LOGIN
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(LoginRequestPacket {
            protocol_version: read_i32(reader)?,
            username: read_string(reader)?,
            password: read_string(reader)?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_i32(writer, self.protocol_version)?;
        write_string(writer, &self.username)?;
        write_string(writer, &self.password)
    }
}

impl Packet for LoginResponsePacket {
    fn packet_id() -> i8 {
        id::LOGIN
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(LoginResponsePacket {
            player_id: read_i32(reader)?,
            server_name: read_string(reader)?,
            motd: read_string(reader)?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_i32(writer, self.player_id)?;
        write_string(writer, &self.server_name)?;
        write_string(writer, &self.motd)
    }
}
