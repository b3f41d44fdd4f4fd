//! Little-endian primitives shared by every record in the model file.

use std::io::{Read, Write};

use crate::error::{ModelError, Result};

/// Upper bound on up-front allocation for length-prefixed arrays, so that a
/// corrupt length fails on the short read rather than on allocation.
const MAX_PREALLOC: usize = 1 << 20;

pub(crate) fn read_u8(reader: &mut impl Read) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub(crate) fn read_u32(reader: &mut impl Read) -> Result<u32> {
    let mut buf4 = [0u8; 4];
    reader.read_exact(&mut buf4)?;
    Ok(u32::from_le_bytes(buf4))
}

pub(crate) fn read_i32(reader: &mut impl Read) -> Result<i32> {
    let mut buf4 = [0u8; 4];
    reader.read_exact(&mut buf4)?;
    Ok(i32::from_le_bytes(buf4))
}

pub(crate) fn read_u64(reader: &mut impl Read) -> Result<u64> {
    let mut buf8 = [0u8; 8];
    reader.read_exact(&mut buf8)?;
    Ok(u64::from_le_bytes(buf8))
}

pub(crate) fn read_i64(reader: &mut impl Read) -> Result<i64> {
    let mut buf8 = [0u8; 8];
    reader.read_exact(&mut buf8)?;
    Ok(i64::from_le_bytes(buf8))
}

pub(crate) fn read_f32(reader: &mut impl Read) -> Result<f32> {
    let mut buf4 = [0u8; 4];
    reader.read_exact(&mut buf4)?;
    Ok(f32::from_le_bytes(buf4))
}

pub(crate) fn read_f64(reader: &mut impl Read) -> Result<f64> {
    let mut buf8 = [0u8; 8];
    reader.read_exact(&mut buf8)?;
    Ok(f64::from_le_bytes(buf8))
}

pub(crate) fn read_bool(reader: &mut impl Read) -> Result<bool> {
    Ok(read_u8(reader)? != 0)
}

/// Read a length prefix and convert it to `usize`.
pub(crate) fn read_len(reader: &mut impl Read) -> Result<usize> {
    let len = read_u64(reader)?;
    usize::try_from(len).map_err(|_| ModelError::Other(format!("length {} does not fit in memory", len)))
}

/// Read a string: u64 length then that many UTF-8 bytes.
pub(crate) fn read_string(reader: &mut impl Read) -> Result<String> {
    let len = read_len(reader)?;
    let mut buf = Vec::with_capacity(len.min(MAX_PREALLOC));
    reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(ModelError::Io(std::io::ErrorKind::UnexpectedEof.into()));
    }
    Ok(String::from_utf8(buf)?)
}

/// Read a u64 count followed by that many values.
pub(crate) fn read_array<R: Read, T>(
    reader: &mut R,
    mut read_one: impl FnMut(&mut R) -> Result<T>,
) -> Result<Vec<T>> {
    let len = read_len(reader)?;
    let mut out = Vec::with_capacity(len.min(MAX_PREALLOC));
    for _ in 0..len {
        out.push(read_one(reader)?);
    }
    Ok(out)
}

pub(crate) fn write_u8(writer: &mut impl Write, v: u8) -> Result<()> {
    writer.write_all(&[v])?;
    Ok(())
}

pub(crate) fn write_u32(writer: &mut impl Write, v: u32) -> Result<()> {
    writer.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_i32(writer: &mut impl Write, v: i32) -> Result<()> {
    writer.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_u64(writer: &mut impl Write, v: u64) -> Result<()> {
    writer.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_i64(writer: &mut impl Write, v: i64) -> Result<()> {
    writer.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_f32(writer: &mut impl Write, v: f32) -> Result<()> {
    writer.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_f64(writer: &mut impl Write, v: f64) -> Result<()> {
    writer.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_bool(writer: &mut impl Write, v: bool) -> Result<()> {
    write_u8(writer, u8::from(v))
}

pub(crate) fn write_len(writer: &mut impl Write, len: usize) -> Result<()> {
    write_u64(writer, len as u64)
}

pub(crate) fn write_string(writer: &mut impl Write, s: &str) -> Result<()> {
    write_len(writer, s.len())?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}
