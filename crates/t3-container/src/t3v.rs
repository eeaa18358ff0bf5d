//! `.t3v` multi-frame container with random access.
//!
//! Layout: `"T3V6"`, version, subword code, width, height, frame count,
//! global meta length, header CRC32, global meta, frame index
//! (offset/words/meta length per frame), then each frame as meta bytes,
//! words payload, payload CRC32.
//!
//! The writer emits placeholder index entries, writes the frames, then
//! rewrites the index in place with the true offsets; the whole file goes
//! through a temp file and a final rename, so readers never observe a
//! half-written index.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use t3_codec::{SubwordMode, Word27};
use tracing::{debug, warn};

use crate::error::ContainerError;
use crate::io::{
    crc32, read_exact, read_u16, read_u32, read_u64, read_u8, read_vec, words_from_bytes,
    words_to_bytes, write_all,
};

const MAGIC: [u8; 4] = *b"T3V6";
const VERSION: u8 = 6;

/// Bytes per frame index entry: offset (u64) + words (u64) + meta len (u32).
const INDEX_ENTRY_BYTES: u64 = 20;

/// One frame index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct T3vFrameEntry {
    /// Absolute file offset of the frame's meta bytes.
    pub offset: u64,
    /// Word count of the frame payload.
    pub words: u64,
    /// Length of the per-frame meta.
    pub meta_len: u32,
}

/// Parsed `.t3v` header, global meta, and the frame index.
#[derive(Debug, Clone)]
pub struct T3vHeader {
    /// Subword tag.
    pub subword: SubwordMode,
    /// Canvas width.
    pub width: u16,
    /// Canvas height.
    pub height: u16,
    /// Global meta JSON blob.
    pub global_meta: String,
    /// Frame count.
    pub frame_count: u64,
    /// Frame index, validated against the file size at read time.
    pub index: Vec<T3vFrameEntry>,
}

fn header_crc_input(
    subword: SubwordMode,
    width: u16,
    height: u16,
    frame_count: u64,
    meta_g_len: u32,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(18);
    buf.push(VERSION);
    buf.push(subword.code());
    buf.extend_from_slice(&width.to_le_bytes());
    buf.extend_from_slice(&height.to_le_bytes());
    buf.extend_from_slice(&frame_count.to_le_bytes());
    buf.extend_from_slice(&meta_g_len.to_le_bytes());
    buf
}

/// Write a `.t3v` file atomically.
///
/// `frame_metas` must be empty (no per-frame meta) or have one entry per
/// frame.
///
/// # Errors
///
/// [`ContainerError::OutOfRange`] when `frame_metas` disagrees with the
/// frame count, otherwise [`ContainerError::Io`].
pub fn t3v_write(
    path: &Path,
    subword: SubwordMode,
    width: u16,
    height: u16,
    frames: &[Vec<Word27>],
    global_meta: &str,
    frame_metas: &[String],
) -> Result<(), ContainerError> {
    if !frame_metas.is_empty() && frame_metas.len() != frames.len() {
        return Err(ContainerError::OutOfRange {
            what: "frame meta count",
            value: frame_metas.len() as u64,
            limit: frames.len() as u64,
        });
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    let mut index = vec![
        T3vFrameEntry {
            offset: 0,
            words: 0,
            meta_len: 0,
        };
        frames.len()
    ];
    {
        let f = tmp.as_file_mut();

        let frame_count = frames.len() as u64;
        let meta_g_len = global_meta.len() as u32;
        write_all(f, &MAGIC)?;
        write_all(f, &[VERSION, subword.code()])?;
        write_all(f, &width.to_le_bytes())?;
        write_all(f, &height.to_le_bytes())?;
        write_all(f, &frame_count.to_le_bytes())?;
        write_all(f, &meta_g_len.to_le_bytes())?;
        let hdr_crc = crc32(&header_crc_input(
            subword,
            width,
            height,
            frame_count,
            meta_g_len,
        ));
        write_all(f, &hdr_crc.to_le_bytes())?;
        write_all(f, global_meta.as_bytes())?;

        // Placeholder index; rewritten below once offsets are known.
        let index_pos = f.stream_position()?;
        let placeholder = [0u8; INDEX_ENTRY_BYTES as usize];
        for _ in frames {
            write_all(f, &placeholder)?;
        }

        for (i, words) in frames.iter().enumerate() {
            let meta = frame_metas.get(i).map_or("", String::as_str);
            index[i] = T3vFrameEntry {
                offset: f.stream_position()?,
                words: words.len() as u64,
                meta_len: meta.len() as u32,
            };
            write_all(f, meta.as_bytes())?;
            let payload = words_to_bytes(words);
            write_all(f, &payload)?;
            let payload_crc = if payload.is_empty() { 0 } else { crc32(&payload) };
            write_all(f, &payload_crc.to_le_bytes())?;
        }

        f.seek(SeekFrom::Start(index_pos))?;
        for entry in &index {
            write_all(f, &entry.offset.to_le_bytes())?;
            write_all(f, &entry.words.to_le_bytes())?;
            write_all(f, &entry.meta_len.to_le_bytes())?;
        }
        f.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| ContainerError::Io(e.error))?;
    debug!(path = %path.display(), frames = frames.len(), "t3v written");
    Ok(())
}

fn read_verified_header(
    r: &mut (impl Read + Seek),
    file_len: u64,
) -> Result<T3vHeader, ContainerError> {
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
    let subword = SubwordMode::from_code(sub_code)
        .map_err(|_| ContainerError::InvalidSubword { code: sub_code })?;
    let width = read_u16(r)?;
    let height = read_u16(r)?;
    let frame_count = read_u64(r)?;
    let meta_g_len = read_u32(r)?;
    let stored = read_u32(r)?;
    let computed = crc32(&header_crc_input(
        subword,
        width,
        height,
        frame_count,
        meta_g_len,
    ));
    if stored != computed {
        return Err(ContainerError::HeaderCrcMismatch { stored, computed });
    }
    let meta_bytes = read_vec(r, meta_g_len as usize)?;
    let global_meta = String::from_utf8_lossy(&meta_bytes).into_owned();

    let mut index = Vec::with_capacity(frame_count as usize);
    for _ in 0..frame_count {
        let entry = T3vFrameEntry {
            offset: read_u64(r)?,
            words: read_u64(r)?,
            meta_len: read_u32(r)?,
        };
        if entry.offset > file_len {
            return Err(ContainerError::OutOfRange {
                what: "frame offset",
                value: entry.offset,
                limit: file_len,
            });
        }
        index.push(entry);
    }

    Ok(T3vHeader {
        subword,
        width,
        height,
        global_meta,
        frame_count,
        index,
    })
}

/// Read and verify the header, global meta, and frame index of a `.t3v`
/// file. No frame payload is touched.
///
/// # Errors
///
/// All integrity error kinds of [`ContainerError`].
pub fn t3v_read_header(path: &Path) -> Result<T3vHeader, ContainerError> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut r = BufReader::new(file);
    read_verified_header(&mut r, file_len)
}

/// Random-access read of one frame, gated by `approve` on the per-frame
/// meta.
///
/// # Errors
///
/// [`ContainerError::OutOfRange`] for a bad frame index,
/// [`ContainerError::MetaNotApproved`] on refusal, plus all integrity error
/// kinds.
pub fn t3v_read_frame(
    path: &Path,
    frame: u64,
    mut approve: impl FnMut(&str) -> bool,
) -> Result<Vec<Word27>, ContainerError> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut r = BufReader::new(file);
    let header = read_verified_header(&mut r, file_len)?;

    let entry = header
        .index
        .get(frame as usize)
        .copied()
        .ok_or(ContainerError::OutOfRange {
            what: "frame index",
            value: frame,
            limit: header.frame_count,
        })?;

    r.seek(SeekFrom::Start(entry.offset))?;
    let meta_bytes = read_vec(&mut r, entry.meta_len as usize)?;
    let meta = String::from_utf8_lossy(&meta_bytes).into_owned();

    if !approve(&meta) {
        warn!(path = %path.display(), frame, "t3v frame meta refused; payload untouched");
        return Err(ContainerError::MetaNotApproved);
    }

    let payload = read_vec(&mut r, entry.words as usize * 9)?;
    let stored = read_u32(&mut r)?;
    let computed = if payload.is_empty() { 0 } else { crc32(&payload) };
    if stored != computed {
        return Err(ContainerError::PayloadCrcMismatch { stored, computed });
    }
    debug!(path = %path.display(), frame, words = entry.words, "t3v frame read");
    words_from_bytes(&payload)
}
