//! Ternary CRC-12 for the superframe header.
//!
//! A length-12 LFSR over GF(3). For each input trit the feedback is
//! `fb = (in + reg[11]) mod 3`; the register shifts with `fb` added into
//! positions {0, 3, 4, 7} while the others take their previous neighbour.
//! After the message, 12 zero trits are shifted in and the register is the
//! remainder.

use t3_trit::UTrit;

/// Remainder length in trits.
pub const CRC12_LEN: usize = 12;

/// Compute the 12-trit remainder of a trit message.
#[must_use]
pub fn crc12_remainder(msg: &[UTrit]) -> [UTrit; CRC12_LEN] {
    let mut reg = [0u8; CRC12_LEN];
    let mut step = |input: u8| {
        let fb = (input + reg[CRC12_LEN - 1]) % 3;
        let mut next = [0u8; CRC12_LEN];
        next[0] = fb;
        next[1] = reg[0];
        next[2] = reg[1];
        next[3] = (reg[2] + fb) % 3;
        next[4] = (reg[3] + fb) % 3;
        next[5] = reg[4];
        next[6] = reg[5];
        next[7] = (reg[6] + fb) % 3;
        next[8] = reg[7];
        next[9] = reg[8];
        next[10] = reg[9];
        next[11] = reg[10];
        reg = next;
    };
    for &t in msg {
        step(t % 3);
    }
    for _ in 0..CRC12_LEN {
        step(0);
    }
    reg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_message_has_zero_remainder() {
        assert_eq!(crc12_remainder(&[]), [0u8; CRC12_LEN]);
    }

    #[test]
    fn remainder_is_deterministic() {
        let msg = [1u8, 0, 2, 2, 1, 0, 0, 1];
        assert_eq!(crc12_remainder(&msg), crc12_remainder(&msg));
    }

    #[test]
    fn single_trit_changes_remainder() {
        let base = vec![0u8; 69];
        let r0 = crc12_remainder(&base);
        for i in 0..base.len() {
            let mut msg = base.clone();
            msg[i] = 1;
            assert_ne!(crc12_remainder(&msg), r0, "flip at {i} undetected");
        }
    }

    #[test]
    fn linearity_over_gf3() {
        // CRC of a+b equals trit-wise sum of the CRCs (the LFSR is linear).
        let a = [1u8, 2, 0, 1, 1, 2, 0, 0, 2];
        let b = [0u8, 1, 1, 2, 0, 0, 1, 2, 2];
        let sum: Vec<u8> = a.iter().zip(&b).map(|(&x, &y)| (x + y) % 3).collect();
        let ra = crc12_remainder(&a);
        let rb = crc12_remainder(&b);
        let rsum = crc12_remainder(&sum);
        for i in 0..CRC12_LEN {
            assert_eq!(rsum[i], (ra[i] + rb[i]) % 3);
        }
    }
}
