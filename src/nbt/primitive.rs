//! Fixed-width primitives shared by the tag format and the wire protocol. Everything is
//! big-endian; floats travel as the bit pattern of the same-width integer.

use crate::error::{CobbleError, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

/// Largest allocation made up front for a length-prefixed value. Longer values grow as bytes
/// actually arrive, so a forged length cannot reserve gigabytes.
const PREALLOCATION_LIMIT: usize = 64 * 1024;

pub fn read_i8<R: Read>(reader: &mut R) -> Result<i8> {
    Ok(reader.read_i8()?)
}

pub fn read_i16<R: Read>(reader: &mut R) -> Result<i16> {
    Ok(reader.read_i16::<BigEndian>()?)
}

pub fn read_i32<R: Read>(reader: &mut R) -> Result<i32> {
    Ok(reader.read_i32::<BigEndian>()?)
}

pub fn read_i64<R: Read>(reader: &mut R) -> Result<i64> {
    Ok(reader.read_i64::<BigEndian>()?)
}

pub fn read_f32<R: Read>(reader: &mut R) -> Result<f32> {
    Ok(reader.read_f32::<BigEndian>()?)
}

pub fn read_f64<R: Read>(reader: &mut R) -> Result<f64> {
    Ok(reader.read_f64::<BigEndian>()?)
}

/// Any non-zero byte reads as `true`.
pub fn read_bool<R: Read>(reader: &mut R) -> Result<bool> {
    Ok(read_i8(reader)? != 0)
}

pub fn write_i8<W: Write>(writer: &mut W, value: i8) -> Result<()> {
    Ok(writer.write_i8(value)?)
}

pub fn write_i16<W: Write>(writer: &mut W, value: i16) -> Result<()> {
    Ok(writer.write_i16::<BigEndian>(value)?)
}

pub fn write_i32<W: Write>(writer: &mut W, value: i32) -> Result<()> {
    Ok(writer.write_i32::<BigEndian>(value)?)
}

pub fn write_i64<W: Write>(writer: &mut W, value: i64) -> Result<()> {
    Ok(writer.write_i64::<BigEndian>(value)?)
}

pub fn write_f32<W: Write>(writer: &mut W, value: f32) -> Result<()> {
    Ok(writer.write_f32::<BigEndian>(value)?)
}

pub fn write_f64<W: Write>(writer: &mut W, value: f64) -> Result<()> {
    Ok(writer.write_f64::<BigEndian>(value)?)
}

pub fn write_bool<W: Write>(writer: &mut W, value: bool) -> Result<()> {
    write_i8(writer, value as i8)
}

/// Reads a string prefixed by a signed 16-bit byte count.
pub fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let length = read_i16(reader)?;
    if length < 0 {
        return Err(CobbleError::decode(format!(
            "string length cannot be negative, got {}",
            length
        )));
    }
    let bytes = read_exact_bytes(reader, length as usize)?;
    String::from_utf8(bytes)
        .map_err(|err| CobbleError::decode(format!("string is not valid UTF-8: {}", err)))
}

pub fn write_string<W: Write>(writer: &mut W, value: &str) -> Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() > i16::MAX as usize {
        return Err(CobbleError::encode(format!(
            "string of {} bytes does not fit a 16-bit length",
            bytes.len()
        )));
    }
    write_i16(writer, bytes.len() as i16)?;
    writer.write_all(bytes)?;
    Ok(())
}

/// Reads a byte array prefixed by a signed 32-bit length.
pub fn read_byte_array<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let length = read_i32(reader)?;
    if length < 0 {
        return Err(CobbleError::decode(format!(
            "byte array length cannot be negative, got {}",
            length
        )));
    }
    read_exact_bytes(reader, length as usize)
}

pub fn write_byte_array<W: Write>(writer: &mut W, value: &[u8]) -> Result<()> {
    write_length(writer, value.len(), "byte array")?;
    writer.write_all(value)?;
    Ok(())
}

/// Writes a signed 32-bit element count, failing if `length` does not fit.
pub fn write_length<W: Write>(writer: &mut W, length: usize, what: &str) -> Result<()> {
    if length > i32::MAX as usize {
        return Err(CobbleError::encode(format!(
            "{} of {} elements does not fit a 32-bit length",
            what, length
        )));
    }
    write_i32(writer, length as i32)
}

fn read_exact_bytes<R: Read>(reader: &mut R, length: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(length.min(PREALLOCATION_LIMIT));
    reader.by_ref().take(length as u64).read_to_end(&mut bytes)?;
    if bytes.len() != length {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, stream ended after {}", length, bytes.len()),
        )
        .into());
    }
    Ok(bytes)
}
