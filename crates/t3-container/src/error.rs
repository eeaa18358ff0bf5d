//! Container error types.

use thiserror::Error;

/// Errors from container reads and writes.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Underlying I/O failure (short read/write, missing file, ...).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not start with the expected magic.
    #[error("bad magic: expected {expected:?}, got {got:?}")]
    BadMagic {
        /// Magic the format requires.
        expected: [u8; 4],
        /// Magic found in the file.
        got: [u8; 4],
    },

    /// Unsupported container version.
    #[error("bad version: expected {expected}, got {got}")]
    BadVersion {
        /// Version the reader understands.
        expected: u8,
        /// Version found in the file.
        got: u8,
    },

    /// The fixed header failed its CRC32.
    #[error("header crc32 mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    HeaderCrcMismatch {
        /// CRC stored in the file.
        stored: u32,
        /// CRC recomputed over the header fields.
        computed: u32,
    },

    /// The payload failed its CRC32.
    #[error("payload crc32 mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    PayloadCrcMismatch {
        /// CRC stored in the file.
        stored: u32,
        /// CRC recomputed over the payload bytes.
        computed: u32,
    },

    /// The approve callback refused the meta; no payload was read.
    ///
    /// This is the designed security outcome, not stream corruption.
    #[error("meta not approved; payload not read")]
    MetaNotApproved,

    /// An index or count outside the container's bounds.
    #[error("{what} out of range: {value} (limit {limit})")]
    OutOfRange {
        /// What was being indexed.
        what: &'static str,
        /// Observed value.
        value: u64,
        /// The bound it violated.
        limit: u64,
    },

    /// Unknown subword code in a header.
    #[error("invalid subword code {code}")]
    InvalidSubword {
        /// Offending code.
        code: u8,
    },

    /// A symbol byte outside the GF(27) alphabet.
    #[error("invalid symbol byte {value} at offset {offset}")]
    InvalidSymbol {
        /// Offending byte.
        value: u8,
        /// Offset within the words payload.
        offset: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_wraps() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        let err: ContainerError = io.into();
        assert!(err.to_string().contains("short read"));
    }

    #[test]
    fn crc_errors_render_hex() {
        let err = ContainerError::HeaderCrcMismatch {
            stored: 0xDEAD_BEEF,
            computed: 0x1234_5678,
        };
        assert!(err.to_string().contains("0xdeadbeef"));
        assert!(err.to_string().contains("0x12345678"));
    }
}
