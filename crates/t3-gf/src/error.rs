//! Reed-Solomon error types.

use thiserror::Error;

/// Errors from RS(26, k) encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RsError {
    /// Block length does not match the codec parameters.
    #[error("wrong block length: expected {expected}, got {got}")]
    WrongLength {
        /// Length the codec requires.
        expected: usize,
        /// Length supplied.
        got: usize,
    },

    /// The error pattern exceeds the correction capability of the code.
    #[error("uncorrectable block: {reason}")]
    Uncorrectable {
        /// Which decoding stage gave up.
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let err = RsError::WrongLength {
            expected: 26,
            got: 12,
        };
        assert_eq!(err.to_string(), "wrong block length: expected 26, got 12");

        let err = RsError::Uncorrectable {
            reason: "too many error positions",
        };
        assert!(err.to_string().contains("too many error positions"));
    }
}
