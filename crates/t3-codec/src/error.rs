//! Codec error types.

use t3_gf::RsError;
use thiserror::Error;

/// Errors from the Word27 transport pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The superframe header failed its ternary CRC-12.
    #[error("superframe header CRC-12 mismatch")]
    HeaderCrcMismatch,

    /// An RS block could not be corrected.
    #[error("reed-solomon failure: {0}")]
    RsUncorrectable(#[from] RsError),

    /// A profile code outside the known set.
    #[error("invalid profile code {code}")]
    InvalidProfile {
        /// Offending code.
        code: u8,
    },

    /// A subword code outside the known set.
    #[error("invalid subword code {code}")]
    InvalidSubword {
        /// Offending code.
        code: u8,
    },

    /// A tile unusable for 2D interleaving.
    #[error("invalid tile {w}x{h}")]
    InvalidTile {
        /// Tile width.
        w: u16,
        /// Tile height.
        h: u16,
    },

    /// A stream too short or a count that does not fit the layout.
    #[error("{what} out of range: {value} (limit {limit})")]
    OutOfRange {
        /// What was being measured.
        what: &'static str,
        /// Observed value.
        value: usize,
        /// The bound it violated.
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rs_error_converts() {
        let rs = RsError::Uncorrectable {
            reason: "too many error positions",
        };
        let err: CodecError = rs.into();
        assert!(matches!(err, CodecError::RsUncorrectable(_)));
        assert!(err.to_string().contains("reed-solomon"));
    }
}
