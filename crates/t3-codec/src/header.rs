//! Superframe header: 27 GF(27) symbols with a ternary CRC-12, carried as
//! two RS(26, 18) blocks in the first six words of a stream.

use t3_gf::{pack3, unpack3, Gf27, RsCodec};

use crate::crc12::{crc12_remainder, CRC12_LEN};
use crate::error::CodecError;
use crate::profile::{
    BeaconConfig, CosetId, ProfileId, ScramblerSeed, SubwordMode, Tile2D, UepLayout,
};
use crate::word::{Word27, SYMBOLS_PER_WORD};

/// Symbols in a packed header.
pub const HEADER_SYMBOLS: usize = 27;

/// Words the RS-protected header occupies at the front of a stream.
pub const HEADER_WORDS: usize = 6;

/// Indices of the four CRC-bearing symbols.
pub const CRC_SYMBOL_INDICES: [usize; 4] = [20, 21, 22, 26];

/// Header magic, split base-27 over symbols 0 and 1.
const MAGIC: u16 = 0x0A2;

/// Header format version.
const VERSION: u8 = 1;

/// The packed 27-symbol form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSymbols {
    /// Symbol values, each in `[0, 27)`.
    pub symbols: [Gf27; HEADER_SYMBOLS],
}

/// Superframe header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperframeHeader {
    /// Stream magic.
    pub magic: u16,
    /// Header version.
    pub version: u8,
    /// Transport profile.
    pub profile: ProfileId,
    /// Per-band protection.
    pub uep: UepLayout,
    /// 2D interleave tile (P5).
    pub tile: Tile2D,
    /// Scrambler seed.
    pub seed: ScramblerSeed,
    /// Band permutation digest, base-27 over 3 symbols.
    pub band_map_hash: u32,
    /// Frame sequence number, base-27 over 3 symbols.
    pub frame_seq: u32,
    /// Subword mode tag.
    pub subword: SubwordMode,
    /// Centered-window flag.
    pub centered: bool,
    /// Coset label.
    pub coset: CosetId,
    /// Beacon configuration.
    pub beacon: BeaconConfig,
}

impl Default for SuperframeHeader {
    fn default() -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            profile: ProfileId::P2,
            uep: UepLayout::uniform(1),
            tile: Tile2D::default(),
            seed: ScramblerSeed::default(),
            band_map_hash: 0,
            frame_seq: 0,
            subword: SubwordMode::S27,
            centered: true,
            coset: CosetId::C0,
            beacon: BeaconConfig::default(),
        }
    }
}

impl SuperframeHeader {
    /// Pack into 27 symbols, computing the CRC-12 over the 23 non-CRC
    /// symbols (69 trits) and writing it at indices {20, 21, 22, 26}.
    #[must_use]
    pub fn pack(&self) -> HeaderSymbols {
        let mut s = [0 as Gf27; HEADER_SYMBOLS];
        s[0] = (self.magic % 27) as Gf27;
        s[1] = ((self.magic / 27) % 27) as Gf27;
        s[2] = self.version % 27;
        s[3] = self.profile.code() % 27;
        // UEP: three symbols, each three band profiles in base-3, MSD-first.
        for group in 0..3 {
            let mut v: u8 = 0;
            for i in 0..3 {
                v = v * 3 + self.uep.band_profile[group * 3 + i] % 3;
            }
            s[4 + group] = v;
        }
        s[7] = (self.tile.w % 27) as Gf27;
        s[8] = (self.tile.h % 27) as Gf27;
        s[9] = (self.seed.a % 27) as Gf27;
        s[10] = (self.seed.b % 27) as Gf27;
        s[11] = (self.seed.s0 % 27) as Gf27;
        s[12] = (self.subword.code() + 9 * u8::from(self.centered)) % 27;
        s[13] = (self.band_map_hash % 27) as Gf27;
        s[14] = ((self.band_map_hash / 27) % 27) as Gf27;
        s[15] = ((self.band_map_hash / 729) % 27) as Gf27;
        s[16] = self.coset.code() % 3;
        s[17] = (self.frame_seq % 27) as Gf27;
        s[18] = ((self.frame_seq / 27) % 27) as Gf27;
        s[19] = ((self.frame_seq / 729) % 27) as Gf27;
        s[23] = u8::from(self.beacon.enabled);
        s[24] = self.beacon.band_slot % 27;
        s[25] = self.beacon.words_period.min(26) as Gf27;

        let rem = crc_over_data_symbols(&s);
        s[20] = pack3(rem[0], rem[1], rem[2]);
        s[21] = pack3(rem[3], rem[4], rem[5]);
        s[22] = pack3(rem[6], rem[7], rem[8]);
        s[26] = pack3(rem[9], rem[10], rem[11]);
        HeaderSymbols { symbols: s }
    }

    /// Recompute the CRC-12 over the non-CRC symbols and compare with the 12
    /// trits carried by the CRC slots.
    #[must_use]
    pub fn check(packed: &HeaderSymbols) -> bool {
        let rem = crc_over_data_symbols(&packed.symbols);
        let mut carried = [0u8; CRC12_LEN];
        for (slot, &idx) in CRC_SYMBOL_INDICES.iter().enumerate() {
            let d = unpack3(packed.symbols[idx]);
            carried[slot * 3..slot * 3 + 3].copy_from_slice(&d);
        }
        rem == carried
    }

    /// Decode the fields of a packed header. CRC is *not* checked here.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidProfile`] or [`CodecError::InvalidSubword`]
    /// when the corresponding symbols fall outside their alphabets.
    pub fn unpack(packed: &HeaderSymbols) -> Result<Self, CodecError> {
        let s = &packed.symbols;
        let rd = |i: usize| u32::from(s[i] % 27);

        let mut uep = UepLayout::default();
        for group in 0..3 {
            let mut v = rd(4 + group);
            // Stored MSD-first; peel LSD-first and place back-to-front.
            let t0 = (v % 3) as u8;
            v /= 3;
            let t1 = (v % 3) as u8;
            v /= 3;
            let t2 = (v % 3) as u8;
            uep.band_profile[group * 3] = t2;
            uep.band_profile[group * 3 + 1] = t1;
            uep.band_profile[group * 3 + 2] = t0;
        }

        let sub_code = (rd(12) % 9) as u8;
        let centered = (rd(12) / 9) % 3 != 0;

        Ok(Self {
            magic: (rd(0) + 27 * rd(1)) as u16,
            version: rd(2) as u8,
            profile: ProfileId::from_code((rd(3) % 5) as u8)?,
            uep,
            tile: Tile2D {
                w: rd(7) as u16,
                h: rd(8) as u16,
            },
            seed: ScramblerSeed {
                a: rd(9),
                b: rd(10),
                s0: rd(11),
            },
            band_map_hash: rd(13) + 27 * rd(14) + 729 * rd(15),
            frame_seq: rd(17) + 27 * rd(18) + 729 * rd(19),
            subword: SubwordMode::from_code(sub_code)?,
            centered,
            coset: CosetId::from_code(rd(16) as u8),
            beacon: BeaconConfig {
                enabled: rd(23) != 0,
                band_slot: (rd(24) % 9) as u8,
                words_period: rd(25),
            },
        })
    }

    /// RS-encode the packed header into the six words that open every
    /// container-level stream: two RS(26, 18) blocks (the second zero-padded)
    /// giving 52 symbols, zero-padded to 54.
    ///
    /// # Errors
    ///
    /// Propagates RS encoding failures.
    pub fn to_words(&self, rs_hdr: &RsCodec) -> Result<[Word27; HEADER_WORDS], CodecError> {
        let packed = self.pack();
        let mut block_a = [0 as Gf27; 18];
        block_a.copy_from_slice(&packed.symbols[..18]);
        let mut block_b = [0 as Gf27; 18];
        block_b[..9].copy_from_slice(&packed.symbols[18..27]);

        let enc_a = rs_hdr.encode_block(&block_a)?;
        let enc_b = rs_hdr.encode_block(&block_b)?;

        let mut flat = [0 as Gf27; HEADER_WORDS * SYMBOLS_PER_WORD];
        flat[..26].copy_from_slice(&enc_a);
        flat[26..52].copy_from_slice(&enc_b);

        let mut words = [Word27::default(); HEADER_WORDS];
        for (w, word) in words.iter_mut().enumerate() {
            word.syms
                .copy_from_slice(&flat[w * SYMBOLS_PER_WORD..(w + 1) * SYMBOLS_PER_WORD]);
        }
        Ok(words)
    }

    /// RS-decode and CRC-check a header from the first six words of a stream.
    ///
    /// # Errors
    ///
    /// [`CodecError::OutOfRange`] when fewer than six words are available,
    /// [`CodecError::RsUncorrectable`] when either block fails, and
    /// [`CodecError::HeaderCrcMismatch`] when the ternary CRC-12 disagrees.
    pub fn from_words(words: &[Word27], rs_hdr: &RsCodec) -> Result<Self, CodecError> {
        if words.len() < HEADER_WORDS {
            return Err(CodecError::OutOfRange {
                what: "header words",
                value: words.len(),
                limit: HEADER_WORDS,
            });
        }
        let mut flat = Vec::with_capacity(HEADER_WORDS * SYMBOLS_PER_WORD);
        for w in &words[..HEADER_WORDS] {
            flat.extend_from_slice(&w.syms);
        }
        let dec_a = rs_hdr.decode_block(&flat[..26])?;
        let dec_b = rs_hdr.decode_block(&flat[26..52])?;

        let mut packed = HeaderSymbols {
            symbols: [0; HEADER_SYMBOLS],
        };
        packed.symbols[..18].copy_from_slice(&dec_a.data);
        packed.symbols[18..27].copy_from_slice(&dec_b.data[..9]);

        if !Self::check(&packed) {
            return Err(CodecError::HeaderCrcMismatch);
        }
        Self::unpack(&packed)
    }
}

/// CRC-12 over the trit expansion of the 23 non-CRC symbols, in index order.
fn crc_over_data_symbols(symbols: &[Gf27; HEADER_SYMBOLS]) -> [u8; CRC12_LEN] {
    let mut trits = Vec::with_capacity((HEADER_SYMBOLS - 4) * 3);
    for (i, &sym) in symbols.iter().enumerate() {
        if CRC_SYMBOL_INDICES.contains(&i) {
            continue;
        }
        trits.extend_from_slice(&unpack3(sym));
    }
    crc12_remainder(&trits)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use t3_gf::{Gf27Field, RsParams};

    use super::*;

    fn sample_header() -> SuperframeHeader {
        SuperframeHeader {
            profile: ProfileId::P5,
            uep: UepLayout::luma_priority(),
            tile: Tile2D { w: 8, h: 8 },
            seed: ScramblerSeed { a: 1, b: 1, s0: 1 },
            band_map_hash: 1234,
            frame_seq: 42,
            subword: SubwordMode::S24,
            centered: true,
            coset: CosetId::C1,
            beacon: BeaconConfig {
                enabled: true,
                band_slot: 2,
                words_period: 83,
            },
            ..SuperframeHeader::default()
        }
    }

    #[test]
    fn pack_check_unpack_roundtrip() {
        let hdr = sample_header();
        let packed = hdr.pack();
        assert!(SuperframeHeader::check(&packed));

        let back = SuperframeHeader::unpack(&packed).unwrap();
        assert_eq!(back.magic, MAGIC);
        assert_eq!(back.profile, ProfileId::P5);
        assert_eq!(back.uep, hdr.uep);
        assert_eq!(back.tile, hdr.tile);
        assert_eq!(back.seed, hdr.seed);
        assert_eq!(back.band_map_hash, 1234);
        assert_eq!(back.frame_seq, 42);
        assert_eq!(back.subword, SubwordMode::S24);
        assert!(back.centered);
        assert_eq!(back.coset, CosetId::C1);
        assert!(back.beacon.enabled);
        assert_eq!(back.beacon.band_slot, 2);
        // The single period symbol saturates at 26.
        assert_eq!(back.beacon.words_period, 26);
    }

    #[test]
    fn crc_detects_single_trit_flip() {
        let packed = sample_header().pack();
        for idx in 0..HEADER_SYMBOLS {
            if CRC_SYMBOL_INDICES.contains(&idx) {
                continue;
            }
            let mut tampered = packed;
            let d = unpack3(tampered.symbols[idx]);
            tampered.symbols[idx] = pack3((d[0] + 1) % 3, d[1], d[2]);
            assert!(
                !SuperframeHeader::check(&tampered),
                "flip at symbol {idx} undetected"
            );
        }
    }

    #[test]
    fn crc_detects_flip_in_symbol_five() {
        // A fully-populated header: P5, tile 8x8, S24, beacon period 83
        // slot 2, seed (1,1,1), frame_seq 42.
        let packed = sample_header().pack();
        assert!(SuperframeHeader::check(&packed));
        let mut tampered = packed;
        let d = unpack3(tampered.symbols[5]);
        tampered.symbols[5] = pack3((d[0] + 1) % 3, d[1], d[2]);
        assert!(!SuperframeHeader::check(&tampered));
    }

    #[test]
    fn word_transport_roundtrip() {
        let gf = Arc::new(Gf27Field::new());
        let rs_hdr = RsCodec::new(gf, RsParams::new(26, 18));
        let hdr = sample_header();
        let words = hdr.to_words(&rs_hdr).unwrap();
        // Two pad symbols close the sixth word.
        assert_eq!(words[5].syms[7], 0);
        assert_eq!(words[5].syms[8], 0);
        let back = SuperframeHeader::from_words(&words, &rs_hdr).unwrap();
        assert_eq!(back.profile, hdr.profile);
        assert_eq!(back.frame_seq, hdr.frame_seq);
    }

    #[test]
    fn word_transport_corrects_symbol_errors() {
        let gf = Arc::new(Gf27Field::new());
        let rs_hdr = RsCodec::new(gf, RsParams::new(26, 18));
        let hdr = sample_header();
        let mut words = hdr.to_words(&rs_hdr).unwrap();
        // RS(26,18) corrects up to 4 symbols per block; hit both blocks.
        words[0].syms[0] = (words[0].syms[0] + 1) % 27;
        words[1].syms[3] = (words[1].syms[3] + 5) % 27;
        words[3].syms[2] = (words[3].syms[2] + 9) % 27;
        let back = SuperframeHeader::from_words(&words, &rs_hdr).unwrap();
        assert_eq!(back.frame_seq, hdr.frame_seq);
        assert_eq!(back.subword, hdr.subword);
    }

    #[test]
    fn short_stream_is_rejected() {
        let gf = Arc::new(Gf27Field::new());
        let rs_hdr = RsCodec::new(gf, RsParams::new(26, 18));
        let err = SuperframeHeader::from_words(&[Word27::default(); 3], &rs_hdr).unwrap_err();
        assert!(matches!(err, CodecError::OutOfRange { .. }));
    }
}
