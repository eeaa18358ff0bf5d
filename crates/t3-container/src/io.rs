//! Little-endian field I/O and the words payload wire form.

use std::io::{Read, Write};

use t3_codec::Word27;

use crate::error::ContainerError;

pub(crate) fn read_exact<const N: usize>(r: &mut impl Read) -> Result<[u8; N], ContainerError> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

pub(crate) fn read_u8(r: &mut impl Read) -> Result<u8, ContainerError> {
    let b: [u8; 1] = read_exact(r)?;
    Ok(b[0])
}

pub(crate) fn read_u16(r: &mut impl Read) -> Result<u16, ContainerError> {
    Ok(u16::from_le_bytes(read_exact(r)?))
}

pub(crate) fn read_u32(r: &mut impl Read) -> Result<u32, ContainerError> {
    Ok(u32::from_le_bytes(read_exact(r)?))
}

pub(crate) fn read_u64(r: &mut impl Read) -> Result<u64, ContainerError> {
    Ok(u64::from_le_bytes(read_exact(r)?))
}

pub(crate) fn read_vec(r: &mut impl Read, len: usize) -> Result<Vec<u8>, ContainerError> {
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

pub(crate) fn write_all(w: &mut impl Write, bytes: &[u8]) -> Result<(), ContainerError> {
    w.write_all(bytes)?;
    Ok(())
}

/// Serialize words as one byte per symbol, nine per word, values `0..=26`.
pub(crate) fn words_to_bytes(words: &[Word27]) -> Vec<u8> {
    let mut out = Vec::with_capacity(words.len() * 9);
    for w in words {
        for &s in &w.syms {
            out.push(s % 27);
        }
    }
    out
}

/// Parse a words payload, validating the symbol alphabet.
pub(crate) fn words_from_bytes(bytes: &[u8]) -> Result<Vec<Word27>, ContainerError> {
    debug_assert_eq!(bytes.len() % 9, 0);
    let mut out = Vec::with_capacity(bytes.len() / 9);
    for (wi, chunk) in bytes.chunks_exact(9).enumerate() {
        let mut w = Word27::default();
        for (si, &b) in chunk.iter().enumerate() {
            if b > 26 {
                return Err(ContainerError::InvalidSymbol {
                    value: b,
                    offset: (wi * 9 + si) as u64,
                });
            }
            w.syms[si] = b;
        }
        out.push(w);
    }
    Ok(out)
}

pub(crate) fn crc32(bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_wire_roundtrip() {
        let words: Vec<Word27> = (0..5)
            .map(|i| {
                let mut w = Word27::default();
                for (s, slot) in w.syms.iter_mut().enumerate() {
                    *slot = ((i * 9 + s) % 27) as u8;
                }
                w
            })
            .collect();
        let bytes = words_to_bytes(&words);
        assert_eq!(bytes.len(), 45);
        assert_eq!(words_from_bytes(&bytes).unwrap(), words);
    }

    #[test]
    fn rejects_out_of_alphabet_symbol() {
        let mut bytes = vec![0u8; 9];
        bytes[4] = 27;
        let err = words_from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            ContainerError::InvalidSymbol {
                value: 27,
                offset: 4
            }
        ));
    }

    #[test]
    fn crc32_reflected_ieee_vector() {
        // The canonical "123456789" check value for CRC-32/ISO-HDLC.
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b""), 0);
    }
}
