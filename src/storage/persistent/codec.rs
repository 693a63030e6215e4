//! Wire framing for journal entries.
//!
//! Each entry is stored as a small self-describing frame: a version byte, a
//! little-endian length, the JSON payload, and a CRC32 of the payload. The
//! file itself opens with a five-byte header (magic plus version) so a
//! foreign or damaged file is rejected before any entry is parsed.

use std::io::{Error as IoError, ErrorKind, Read, Result as IoResult, Write};

use serde::{de::DeserializeOwned, Serialize};

/// Format revision written into the file header and every frame.
const FORMAT_VERSION: u8 = 1;

/// Leading bytes of every gradebook journal file.
pub const MAGIC: [u8; 4] = *b"GRDB";

/// Byte length of the file header (magic plus version).
pub const HEADER_LEN: u64 = 5;

/// Frames hold one student record each; a length beyond this is damage,
/// not data.
const MAX_FRAME_BYTES: usize = 1024 * 1024;

fn invalid(message: String) -> IoError {
    IoError::new(ErrorKind::InvalidData, message)
}

/// Frame a value: `[version][len: u32 LE][payload JSON][crc32: u32 LE]`.
///
/// # Errors
/// `ErrorKind::InvalidData` if the value cannot be serialized.
pub fn encode<T: Serialize>(value: &T) -> IoResult<Vec<u8>> {
    let payload = serde_json::to_vec(value).map_err(|e| invalid(format!("encode failed: {e}")))?;

    #[allow(clippy::cast_possible_truncation)]
    let len = payload.len() as u32;
    let crc = crc32fast::hash(&payload);

    let mut frame = Vec::with_capacity(payload.len() + 9);
    frame.push(FORMAT_VERSION);
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&payload);
    frame.extend_from_slice(&crc.to_le_bytes());
    Ok(frame)
}

fn read_u32(reader: &mut impl Read) -> IoResult<u32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

/// Unframe one value, verifying the checksum.
///
/// # Errors
/// - `ErrorKind::UnexpectedEof` when the frame is cut short (torn write)
/// - `ErrorKind::InvalidData` on a version, size, checksum, or JSON failure
pub fn decode<T: DeserializeOwned>(reader: &mut impl Read) -> IoResult<T> {
    let mut version = [0u8; 1];
    reader.read_exact(&mut version)?;
    if version[0] != FORMAT_VERSION {
        return Err(invalid(format!(
            "frame version {} is not {FORMAT_VERSION}",
            version[0]
        )));
    }

    let len = read_u32(reader)? as usize;
    if len > MAX_FRAME_BYTES {
        return Err(invalid(format!(
            "frame of {len} bytes exceeds the {MAX_FRAME_BYTES}-byte limit"
        )));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    let expected = read_u32(reader)?;

    let actual = crc32fast::hash(&payload);
    if expected != actual {
        return Err(invalid(format!(
            "CRC mismatch: frame says {expected:08x}, payload hashes to {actual:08x}"
        )));
    }

    serde_json::from_slice(&payload).map_err(|e| invalid(format!("decode failed: {e}")))
}

/// The bytes a fresh journal file starts with.
#[must_use]
pub fn header() -> [u8; HEADER_LEN as usize] {
    let mut bytes = [0u8; HEADER_LEN as usize];
    bytes[..4].copy_from_slice(&MAGIC);
    bytes[4] = FORMAT_VERSION;
    bytes
}

/// Write the journal file header.
///
/// # Errors
/// Any I/O error from the underlying writer.
pub fn write_header(writer: &mut impl Write) -> IoResult<()> {
    writer.write_all(&header())
}

/// Check the journal file header, returning the format version.
///
/// # Errors
/// - `ErrorKind::UnexpectedEof` if the file is shorter than a header
/// - `ErrorKind::InvalidData` if the magic bytes do not match
pub fn read_header(reader: &mut impl Read) -> IoResult<u8> {
    let mut found = [0u8; HEADER_LEN as usize];
    reader.read_exact(&mut found)?;
    if found[..4] != MAGIC {
        return Err(invalid(format!(
            "not a gradebook journal: file starts with {:?}",
            &found[..4]
        )));
    }
    Ok(found[4])
}
