//! Trit algebra and base-243 packing for the T3 codec.
//!
//! Two trit alphabets coexist in the codec:
//! - **balanced** trits in `{-1, 0, +1}`, used at external interfaces
//!   (image front-ends, `.t3proto` balanced payloads, tests);
//! - **unbalanced** trits in `{0, 1, 2}`, used by the GF(27)/RS internals
//!   and the base-243 packer.
//!
//! The bijection is `unbalanced = balanced + 1`. Conversions are value
//! copies; callers never hold both forms of the same stream at once.
//!
//! Base-243 packing stores 5 unbalanced trits per byte (`Σ tᵢ·3ⁱ`,
//! LSD-first), so packed bytes are in `[0, 242]` and a final partial byte
//! carries values in `[0, 3ᵏ - 1]`. The packed form does not record the trit
//! count; containers transporting packed bytes must also store `n` (or a
//! `tail = n mod 5` hint) to reconstruct the stream exactly.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unbalanced trit: `{0, 1, 2}`.
pub type UTrit = u8;

/// Balanced trit: `{-1, 0, +1}`.
pub type BTrit = i8;

/// Trits carried by one base-243 byte.
pub const TRITS_PER_BYTE: usize = 5;

/// Errors from trit stream packing and unpacking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TritError {
    /// Packed input is too short for the requested trit count.
    #[error("packed input too short: need {needed} bytes for {trits} trits, got {got}")]
    ShortInput {
        /// Bytes required (`⌈trits/5⌉`).
        needed: usize,
        /// Requested trit count.
        trits: usize,
        /// Bytes supplied.
        got: usize,
    },

    /// A packed byte is outside its admissible range.
    #[error("packed byte {value} at index {index} exceeds limit {limit}")]
    ByteOutOfRange {
        /// Offending byte value.
        value: u8,
        /// Byte index in the packed stream.
        index: usize,
        /// Exclusive upper bound for this byte (243, or 3^k for a tail byte).
        limit: u16,
    },
}

/// Map a balanced trit to its unbalanced form, clamping out-of-range input.
#[must_use]
pub fn bal_to_unb(b: BTrit) -> UTrit {
    (b.clamp(-1, 1) + 1) as UTrit
}

/// Map an unbalanced trit to its balanced form, clamping out-of-range input.
#[must_use]
pub fn unb_to_bal(u: UTrit) -> BTrit {
    u.min(2) as BTrit - 1
}

/// Pack unbalanced trits into base-243 bytes, 5 trits per byte, LSD-first.
///
/// The final byte may carry fewer than 5 trits; missing trits pack as zero.
#[must_use]
pub fn pack_base243(trits: &[UTrit]) -> Vec<u8> {
    let mut out = Vec::with_capacity(trits.len().div_ceil(TRITS_PER_BYTE));
    for chunk in trits.chunks(TRITS_PER_BYTE) {
        let mut val: u16 = 0;
        let mut pow: u16 = 1;
        for &t in chunk {
            val += u16::from(t.min(2)) * pow;
            pow *= 3;
        }
        out.push(val as u8);
    }
    out
}

/// Unpack `n_trits` unbalanced trits from a base-243 byte stream.
///
/// `n_trits` is authoritative: the packed form stores no length.
///
/// # Errors
///
/// Returns [`TritError::ShortInput`] when fewer than `⌈n_trits/5⌉` bytes are
/// supplied, and [`TritError::ByteOutOfRange`] when a byte exceeds 242 or a
/// tail byte exceeds `3^(n_trits mod 5) - 1`.
pub fn unpack_base243(bytes: &[u8], n_trits: usize) -> Result<Vec<UTrit>, TritError> {
    let needed = n_trits.div_ceil(TRITS_PER_BYTE);
    if bytes.len() < needed {
        return Err(TritError::ShortInput {
            needed,
            trits: n_trits,
            got: bytes.len(),
        });
    }

    let mut out = Vec::with_capacity(n_trits);
    for (i, &b) in bytes.iter().enumerate().take(needed) {
        let take = TRITS_PER_BYTE.min(n_trits - out.len());
        let limit: u16 = if take < TRITS_PER_BYTE {
            3u16.pow(take as u32)
        } else {
            243
        };
        if u16::from(b) >= limit {
            return Err(TritError::ByteOutOfRange {
                value: b,
                index: i,
                limit,
            });
        }
        let mut val = b;
        for _ in 0..take {
            out.push(val % 3);
            val /= 3;
        }
    }
    Ok(out)
}

/// Pack balanced trits into base-243 bytes (converting through unbalanced).
#[must_use]
pub fn pack_base243_balanced(trits: &[BTrit]) -> Vec<u8> {
    let unb: Vec<UTrit> = trits.iter().map(|&b| bal_to_unb(b)).collect();
    pack_base243(&unb)
}

/// Unpack `n_trits` balanced trits from a base-243 byte stream.
///
/// # Errors
///
/// Same failure modes as [`unpack_base243`].
pub fn unpack_base243_balanced(bytes: &[u8], n_trits: usize) -> Result<Vec<BTrit>, TritError> {
    Ok(unpack_base243(bytes, n_trits)?
        .into_iter()
        .map(unb_to_bal)
        .collect())
}

/// Encode a signed integer into `width` balanced trits, LSD-first.
///
/// Canonical for `v ∈ [-(3^width - 1)/2, +(3^width - 1)/2]`; values outside
/// that range truncate silently.
#[must_use]
pub fn int_to_balanced(v: i64, width: usize) -> Vec<BTrit> {
    let mut out = vec![0i8; width];
    let mut v = v;
    for digit in out.iter_mut() {
        let r = v.rem_euclid(3);
        v = v.div_euclid(3);
        if r == 2 {
            *digit = -1;
            v += 1;
        } else {
            *digit = r as BTrit;
        }
    }
    out
}

/// Decode LSD-first balanced trits into a signed integer.
#[must_use]
pub fn balanced_to_int(trits: &[BTrit]) -> i64 {
    let mut acc: i64 = 0;
    let mut pow: i64 = 1;
    for &t in trits {
        acc += i64::from(t) * pow;
        pow *= 3;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trit_bijection() {
        assert_eq!(bal_to_unb(-1), 0);
        assert_eq!(bal_to_unb(0), 1);
        assert_eq!(bal_to_unb(1), 2);
        assert_eq!(unb_to_bal(0), -1);
        assert_eq!(unb_to_bal(1), 0);
        assert_eq!(unb_to_bal(2), 1);
    }

    #[test]
    fn trit_maps_clamp() {
        assert_eq!(bal_to_unb(-5), 0);
        assert_eq!(bal_to_unb(7), 2);
        assert_eq!(unb_to_bal(200), 1);
    }

    #[test]
    fn pack_exact_multiple() {
        let trits = [1, 2, 0, 1, 2, 0, 0, 1, 2, 1];
        let bytes = pack_base243(&trits);
        assert_eq!(bytes.len(), 2);
        assert_eq!(unpack_base243(&bytes, trits.len()).unwrap(), trits);
    }

    #[test]
    fn pack_partial_tail() {
        // 7 trits: one full byte + a 2-trit tail byte bounded by 3^2.
        let trits = [2, 2, 2, 2, 2, 1, 2];
        let bytes = pack_base243(&trits);
        assert_eq!(bytes.len(), 2);
        assert_eq!(bytes[0], 242);
        assert!(u16::from(bytes[1]) < 9);
        assert_eq!(unpack_base243(&bytes, 7).unwrap(), trits);
    }

    #[test]
    fn pack_empty() {
        assert!(pack_base243(&[]).is_empty());
        assert!(unpack_base243(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn unpack_rejects_short_input() {
        let err = unpack_base243(&[0], 6).unwrap_err();
        assert_eq!(
            err,
            TritError::ShortInput {
                needed: 2,
                trits: 6,
                got: 1
            }
        );
    }

    #[test]
    fn unpack_rejects_overflow_byte() {
        let err = unpack_base243(&[243], 5).unwrap_err();
        assert!(matches!(err, TritError::ByteOutOfRange { value: 243, .. }));

        // Tail byte for 1 trit must be < 3.
        let err = unpack_base243(&[242, 3], 6).unwrap_err();
        assert!(matches!(err, TritError::ByteOutOfRange { index: 1, .. }));
    }

    #[test]
    fn balanced_roundtrip_through_bytes() {
        let bal: Vec<BTrit> = vec![-1, 0, 1, 1, -1, 0, 0, 1];
        let bytes = pack_base243_balanced(&bal);
        assert_eq!(unpack_base243_balanced(&bytes, bal.len()).unwrap(), bal);
    }

    #[test]
    fn int_codec_range() {
        // 5 trits cover [-121, 121].
        for v in -121..=121i64 {
            let tr = int_to_balanced(v, 5);
            assert_eq!(tr.len(), 5);
            assert_eq!(balanced_to_int(&tr), v, "value {v}");
        }
    }

    #[test]
    fn int_codec_zero_width() {
        assert!(int_to_balanced(0, 0).is_empty());
        assert_eq!(balanced_to_int(&[]), 0);
    }
}
