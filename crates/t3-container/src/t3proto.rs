//! `.t3proto` prototype-pipeline container.
//!
//! A single blob carrying optional balanced trits and/or optional base-243
//! packed bytes for the Haar/AnisoRC prototype pipelines. Layout: `"T3PT"`,
//! version, profile, flags, width, height, `n_trits`, `n_bytes`, meta
//! length, meta, balanced bytes, packed bytes. No CRC: integrity comes from
//! upstream containers and tooling.
//!
//! `n_trits` is always written, inferred from meta counters when only the
//! packed stream is present.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use t3_trit::{bal_to_unb, unb_to_bal, BTrit};
use tracing::debug;

use crate::error::ContainerError;
use crate::io::{read_exact, read_u16, read_u32, read_u64, read_u8, read_vec, write_all};

const MAGIC: [u8; 4] = *b"T3PT";
const VERSION: u8 = 1;

/// Flag bit: a packed base-243 stream is present.
pub const FLAG_PACK_PRESENT: u16 = 1 << 0;

/// Flag bit: a balanced trit stream is present.
pub const FLAG_BAL_PRESENT: u16 = 1 << 1;

/// Prototype pipeline tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtoProfile {
    /// Untagged stream.
    #[default]
    None,
    /// Haar-ternary tiling pipeline.
    HaarTernary,
    /// Anisotropic Radon/Haar pipeline.
    AnisoRc,
}

impl ProtoProfile {
    /// One-byte wire code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::HaarTernary => 1,
            Self::AnisoRc => 2,
        }
    }

    /// Parse a wire code; unknown codes fold to `None`.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::HaarTernary,
            2 => Self::AnisoRc,
            _ => Self::None,
        }
    }
}

/// In-memory form of a `.t3proto` file.
#[derive(Debug, Clone, Default)]
pub struct T3Proto {
    /// Prototype pipeline tag.
    pub profile: ProtoProfile,
    /// Source image width.
    pub width: u32,
    /// Source image height.
    pub height: u32,
    /// Meta JSON blob.
    pub meta: String,
    /// Balanced trit stream, if present.
    pub balanced: Option<Vec<BTrit>>,
    /// Base-243 packed stream, if present.
    pub packed: Option<Vec<u8>>,
    /// Exact trit count (authoritative once read).
    pub n_trits: u64,
}

/// Pull an unsigned integer value for `key` out of a meta JSON blob with a
/// pragmatic scan (no full JSON parse).
fn meta_find_uint(meta: &str, key: &str) -> Option<u64> {
    let needle = format!("\"{key}\"");
    let pos = meta.find(&needle)?;
    let rest = &meta[pos + needle.len()..];
    let colon = rest.find(':')?;
    let digits: String = rest[colon + 1..]
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Infer the exact trit count behind a packed stream from meta counters.
///
/// Resolution order: explicit `n_trits`; `len_tiles + len_sketch`;
/// `trits_per_block × ⌈W/block⌉ × ⌈H/block⌉`; a `tail_trits` hint applied to
/// the byte count; else the `5 × n_bytes` upper bound.
#[must_use]
pub fn infer_n_trits(width: u32, height: u32, meta: &str, packed_bytes: u64) -> u64 {
    if let Some(n) = meta_find_uint(meta, "n_trits") {
        if n > 0 {
            return n;
        }
    }

    let tiles = meta_find_uint(meta, "len_tiles");
    let sketch = meta_find_uint(meta, "len_sketch");
    if tiles.is_some() || sketch.is_some() {
        let sum = tiles.unwrap_or(0) + sketch.unwrap_or(0);
        if sum > 0 {
            return sum;
        }
    }

    if let (Some(tpb), Some(block)) = (
        meta_find_uint(meta, "trits_per_block"),
        meta_find_uint(meta, "block"),
    ) {
        if block > 0 {
            let bx = u64::from(width).div_ceil(block);
            let by = u64::from(height).div_ceil(block);
            let sum = tpb * bx * by;
            if sum > 0 {
                return sum;
            }
        }
    }

    if let Some(tail) = meta_find_uint(meta, "tail_trits") {
        if packed_bytes == 0 {
            return 0;
        }
        if tail == 0 {
            return packed_bytes * 5;
        }
        if tail <= 5 {
            return (packed_bytes - 1) * 5 + tail;
        }
    }
    packed_bytes * 5
}

/// Write a `.t3proto` file atomically.
///
/// # Errors
///
/// [`ContainerError::Io`] on filesystem failures.
pub fn t3proto_write(path: &Path, proto: &T3Proto) -> Result<(), ContainerError> {
    let has_bal = proto.balanced.as_ref().is_some_and(|b| !b.is_empty());
    let has_pack = proto.packed.as_ref().is_some_and(|p| !p.is_empty());
    let flags = u16::from(has_pack) * FLAG_PACK_PRESENT | u16::from(has_bal) * FLAG_BAL_PRESENT;

    let n_bytes = proto.packed.as_ref().map_or(0, |p| p.len() as u64);
    let n_trits = if has_bal {
        proto.balanced.as_ref().map_or(0, |b| b.len() as u64)
    } else if has_pack {
        infer_n_trits(proto.width, proto.height, &proto.meta, n_bytes)
    } else {
        0
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut w = BufWriter::new(tmp.as_file());
        write_all(&mut w, &MAGIC)?;
        write_all(&mut w, &[VERSION, proto.profile.code()])?;
        write_all(&mut w, &flags.to_le_bytes())?;
        write_all(&mut w, &proto.width.to_le_bytes())?;
        write_all(&mut w, &proto.height.to_le_bytes())?;
        write_all(&mut w, &n_trits.to_le_bytes())?;
        write_all(&mut w, &n_bytes.to_le_bytes())?;
        write_all(&mut w, &(proto.meta.len() as u32).to_le_bytes())?;
        write_all(&mut w, proto.meta.as_bytes())?;
        if has_bal {
            if let Some(bal) = &proto.balanced {
                let unb: Vec<u8> = bal.iter().map(|&b| bal_to_unb(b)).collect();
                write_all(&mut w, &unb)?;
            }
        }
        if has_pack {
            if let Some(packed) = &proto.packed {
                write_all(&mut w, packed)?;
            }
        }
        w.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| ContainerError::Io(e.error))?;
    debug!(path = %path.display(), n_trits, n_bytes, "t3proto written");
    Ok(())
}

/// Read a `.t3proto` file.
///
/// # Errors
///
/// [`ContainerError::BadMagic`], [`ContainerError::BadVersion`], or
/// [`ContainerError::Io`] on short streams.
pub fn t3proto_read(path: &Path) -> Result<T3Proto, ContainerError> {
    let mut r = BufReader::new(File::open(path)?);
    let magic: [u8; 4] = read_exact(&mut r)?;
    if magic != MAGIC {
        return Err(ContainerError::BadMagic {
            expected: MAGIC,
            got: magic,
        });
    }
    let version = read_u8(&mut r)?;
    if version != VERSION {
        return Err(ContainerError::BadVersion {
            expected: VERSION,
            got: version,
        });
    }
    let profile = ProtoProfile::from_code(read_u8(&mut r)?);
    let flags = read_u16(&mut r)?;
    let width = read_u32(&mut r)?;
    let height = read_u32(&mut r)?;
    let n_trits = read_u64(&mut r)?;
    let n_bytes = read_u64(&mut r)?;
    let meta_len = read_u32(&mut r)?;
    let meta_bytes = read_vec(&mut r, meta_len as usize)?;
    let meta = String::from_utf8_lossy(&meta_bytes).into_owned();

    let balanced = if flags & FLAG_BAL_PRESENT != 0 {
        let raw = read_vec(&mut r, n_trits as usize)?;
        Some(raw.into_iter().map(unb_to_bal).collect())
    } else {
        None
    };
    let packed = if flags & FLAG_PACK_PRESENT != 0 {
        Some(read_vec(&mut r, n_bytes as usize)?)
    } else {
        None
    };

    Ok(T3Proto {
        profile,
        width,
        height,
        meta,
        balanced,
        packed,
        n_trits,
    })
}
