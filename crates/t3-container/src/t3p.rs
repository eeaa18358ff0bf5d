//! `.t3p` single-frame container.
//!
//! Layout: `"T3P6"`, version, subword code, width, height, meta length,
//! words count, header CRC32 (over version..count), meta bytes, words
//! payload, payload CRC32. The payload CRC of an empty frame is the fixed
//! value 0.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use t3_codec::{SubwordMode, Word27};
use tracing::{debug, warn};

use crate::error::ContainerError;
use crate::io::{
    crc32, read_exact, read_u16, read_u32, read_u64, read_u8, read_vec, words_from_bytes,
    words_to_bytes, write_all,
};

const MAGIC: [u8; 4] = *b"T3P6";
const VERSION: u8 = 6;

/// Parsed `.t3p` header plus meta.
#[derive(Debug, Clone)]
pub struct T3pHeader {
    /// Subword tag.
    pub subword: SubwordMode,
    /// Image width.
    pub width: u16,
    /// Image height.
    pub height: u16,
    /// Meta JSON blob.
    pub meta: String,
    /// Word count of the payload.
    pub words_count: u64,
}

/// The byte run the header CRC32 covers: version through words count.
fn header_crc_input(
    subword: SubwordMode,
    width: u16,
    height: u16,
    meta_len: u32,
    words_count: u64,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(18);
    buf.push(VERSION);
    buf.push(subword.code());
    buf.extend_from_slice(&width.to_le_bytes());
    buf.extend_from_slice(&height.to_le_bytes());
    buf.extend_from_slice(&meta_len.to_le_bytes());
    buf.extend_from_slice(&words_count.to_le_bytes());
    buf
}

/// Write a `.t3p` file atomically (temp file + rename in the target
/// directory).
///
/// # Errors
///
/// [`ContainerError::Io`] on filesystem failures.
pub fn t3p_write(
    path: &Path,
    subword: SubwordMode,
    width: u16,
    height: u16,
    words: &[Word27],
    meta: &str,
) -> Result<(), ContainerError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut w = BufWriter::new(tmp.as_file());

        let meta_len = meta.len() as u32;
        let words_count = words.len() as u64;
        write_all(&mut w, &MAGIC)?;
        write_all(&mut w, &[VERSION, subword.code()])?;
        write_all(&mut w, &width.to_le_bytes())?;
        write_all(&mut w, &height.to_le_bytes())?;
        write_all(&mut w, &meta_len.to_le_bytes())?;
        write_all(&mut w, &words_count.to_le_bytes())?;

        let hdr_crc = crc32(&header_crc_input(
            subword,
            width,
            height,
            meta_len,
            words_count,
        ));
        write_all(&mut w, &hdr_crc.to_le_bytes())?;
        write_all(&mut w, meta.as_bytes())?;

        let payload = words_to_bytes(words);
        write_all(&mut w, &payload)?;
        let payload_crc = if payload.is_empty() { 0 } else { crc32(&payload) };
        write_all(&mut w, &payload_crc.to_le_bytes())?;
        w.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| ContainerError::Io(e.error))?;
    debug!(path = %path.display(), words = words.len(), "t3p written");
    Ok(())
}

struct RawHeader {
    subword: SubwordMode,
    width: u16,
    height: u16,
    meta: String,
    words_count: u64,
}

fn read_verified_header(r: &mut impl Read) -> Result<RawHeader, ContainerError> {
    let magic: [u8; 4] = read_exact(r)?;
    if magic != MAGIC {
        return Err(ContainerError::BadMagic {
            expected: MAGIC,
            got: magic,
        });
    }
    let version = read_u8(r)?;
    if version != VERSION {
        return Err(ContainerError::BadVersion {
            expected: VERSION,
            got: version,
        });
    }
    let sub_code = read_u8(r)?;
    let subword =
        SubwordMode::from_code(sub_code).map_err(|_| ContainerError::InvalidSubword { code: sub_code })?;
    let width = read_u16(r)?;
    let height = read_u16(r)?;
    let meta_len = read_u32(r)?;
    let words_count = read_u64(r)?;
    let stored = read_u32(r)?;
    let computed = crc32(&header_crc_input(
        subword,
        width,
        height,
        meta_len,
        words_count,
    ));
    if stored != computed {
        return Err(ContainerError::HeaderCrcMismatch { stored, computed });
    }
    let meta_bytes = read_vec(r, meta_len as usize)?;
    let meta = String::from_utf8_lossy(&meta_bytes).into_owned();
    Ok(RawHeader {
        subword,
        width,
        height,
        meta,
        words_count,
    })
}

/// Read and verify the header and meta of a `.t3p` file. The payload is not
/// touched.
///
/// # Errors
///
/// All integrity error kinds of [`ContainerError`].
pub fn t3p_read_header(path: &Path) -> Result<T3pHeader, ContainerError> {
    let mut r = BufReader::new(File::open(path)?);
    let raw = read_verified_header(&mut r)?;
    Ok(T3pHeader {
        subword: raw.subword,
        width: raw.width,
        height: raw.height,
        meta: raw.meta,
        words_count: raw.words_count,
    })
}

/// Read the payload of a `.t3p` file, gated by `approve`.
///
/// The header CRC32 is verified first; `approve` then sees the meta alone.
/// Only on approval are the words read and checked against the payload
/// CRC32.
///
/// # Errors
///
/// [`ContainerError::MetaNotApproved`] when `approve` returns false, plus
/// all integrity error kinds.
pub fn t3p_read_payload(
    path: &Path,
    mut approve: impl FnMut(&str) -> bool,
) -> Result<Vec<Word27>, ContainerError> {
    let mut r = BufReader::new(File::open(path)?);
    let raw = read_verified_header(&mut r)?;

    if !approve(&raw.meta) {
        warn!(path = %path.display(), "t3p meta refused; payload untouched");
        return Err(ContainerError::MetaNotApproved);
    }

    let payload = read_vec(&mut r, raw.words_count as usize * 9)?;
    let stored = read_u32(&mut r)?;
    let computed = if payload.is_empty() { 0 } else { crc32(&payload) };
    if stored != computed {
        return Err(ContainerError::PayloadCrcMismatch { stored, computed });
    }
    debug!(path = %path.display(), words = raw.words_count, "t3p payload read");
    words_from_bytes(&payload)
}
