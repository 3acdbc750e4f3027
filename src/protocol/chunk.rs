use crate::error::{CobbleError, Result};
use crate::nbt::primitive::*;
use crate::protocol::packet::{id, Packet};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Pre-Chunk (clientbound). `mode` true allocates the column on the client, false frees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreChunkPacket {
    pub x: i32,
    pub z: i32,
    pub mode: bool,
}

/// Map Chunk (clientbound). Covers a cuboid of blocks starting at the block origin (x, y, z);
/// the size fields are one less than the extent along each axis. `data` holds the
/// uncompressed block ids, metadata, block light and sky light; it is zlib-compressed on the
/// wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapChunkPacket {
    pub x: i32,
    pub y: i16,
    pub z: i32,
    pub size_x: i8,
    pub size_y: i8,
    pub size_z: i8,
    pub data: Vec<u8>,
}

impl Packet for PreChunkPacket {
    fn packet_id() -> i8 {
        id::PRE_CHUNK
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(PreChunkPacket {
            x: read_i32(reader)?,
            z: read_i32(reader)?,
            mode: read_bool(reader)?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_i32(writer, self.x)?;
        write_i32(writer, self.z)?;
        write_bool(writer, self.mode)
    }
}

impl Packet for MapChunkPacket {
    fn packet_id() -> i8 {
        id::MAP_CHUNK
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let x = read_i32(reader)?;
        let y = read_i16(reader)?;
        let z = read_i32(reader)?;
        let size_x = read_i8(reader)?;
        let size_y = read_i8(reader)?;
        let size_z = read_i8(reader)?;
        let compressed = read_byte_array(reader)?;

        let mut data = Vec::new();
        ZlibDecoder::new(compressed.as_slice())
            .read_to_end(&mut data)
            .map_err(|err| CobbleError::decode(format!("could not inflate map chunk: {}", err)))?;

        Ok(MapChunkPacket {
            x,
            y,
            z,
            size_x,
            size_y,
            size_z,
            data,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_i32(writer, self.x)?;
        write_i16(writer, self.y)?;
        write_i32(writer, self.z)?;
        write_i8(writer, self.size_x)?;
        write_i8(writer, self.size_y)?;
        write_i8(writer, self.size_z)?;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.data)?;
        let compressed = encoder.finish()?;
        write_byte_array(writer, &compressed)
    }
}
