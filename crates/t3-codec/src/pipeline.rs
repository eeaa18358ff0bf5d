//! Encoder/decoder contexts and the per-frame pipeline.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use t3_gf::{pack3, unpack3, Gf27, Gf27Field, RsCodec, RsParams};
use t3_trit::UTrit;
use tracing::debug;

use crate::bands::{band_block_counts, deal_into_bands, merge_bands_prefix};
use crate::beacon::{insert_beacons, strip_beacons, BeaconPayload};
use crate::error::CodecError;
use crate::header::{SuperframeHeader, HEADER_WORDS};
use crate::interleave::{deinterleave_2d, interleave_2d};
use crate::profile::{
    BeaconConfig, CosetId, ProfileId, ScramblerSeed, SubwordMode, Tile2D, UepLayout, NUM_BANDS,
};
use crate::scramble::Scrambler;
use crate::word::{Word27, SYMBOLS_PER_WORD, TRITS_PER_WORD};

/// Useful trits taken from each RAW word (the 27th trit is reserved zero).
const USEFUL_TRITS: usize = TRITS_PER_WORD - 1;

/// Encoder configuration; every field lands in the superframe header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Transport profile.
    pub profile: ProfileId,
    /// Per-band protection.
    pub uep: UepLayout,
    /// Interleave tile (P5).
    pub tile: Tile2D,
    /// Scrambler seed.
    pub seed: ScramblerSeed,
    /// Beacon configuration.
    pub beacon: BeaconConfig,
    /// Subword tag.
    pub subword: SubwordMode,
    /// Centered-window flag.
    pub centered: bool,
    /// Coset label.
    pub coset: CosetId,
    /// Frame sequence number.
    pub frame_seq: u32,
    /// Band permutation digest.
    pub band_map_hash: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            profile: ProfileId::P2,
            uep: UepLayout::uniform(1),
            tile: Tile2D::default(),
            seed: ScramblerSeed::default(),
            beacon: BeaconConfig::default(),
            subword: SubwordMode::S27,
            centered: true,
            coset: CosetId::C0,
            frame_seq: 0,
            band_map_hash: 0,
        }
    }
}

/// Frame decode progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameState {
    /// Nothing decoded yet.
    #[default]
    Idle,
    /// Header RS and CRC-12 both passed.
    HeaderOk,
    /// All per-band RS blocks decoded.
    BodyDecoded,
    /// Deinterleaved and repacked into RAW words.
    Emitted,
}

/// Shared RS machinery for one direction of the pipeline.
struct RsBank {
    per_profile: [RsCodec; 4],
    header: RsCodec,
}

impl RsBank {
    fn new(gf: &Arc<Gf27Field>) -> Self {
        let mk = |k: usize| RsCodec::new(Arc::clone(gf), RsParams::new(26, k));
        Self {
            per_profile: [mk(24), mk(22), mk(20), mk(18)],
            header: mk(18),
        }
    }

    fn for_band(&self, uep: &UepLayout, band: usize) -> &RsCodec {
        &self.per_profile[usize::from(uep.band_profile[band] % 4)]
    }
}

/// Encoding context: GF tables, one RS codec per profile, configuration.
///
/// Construction is the only mutable phase; a built context is read-only and
/// shareable across frames.
pub struct EncoderContext {
    rs: RsBank,
    /// Frame configuration.
    pub cfg: EncoderConfig,
}

impl EncoderContext {
    /// Build a context with the given configuration.
    #[must_use]
    pub fn new(cfg: EncoderConfig) -> Self {
        let gf = Arc::new(Gf27Field::new());
        Self {
            rs: RsBank::new(&gf),
            cfg,
        }
    }

    /// Encode RAW words into a profiled superframe stream.
    ///
    /// `Raw` profile passes words through untouched. Otherwise the stages
    /// run in order: useful-symbol extraction, optional 2D interleave, band
    /// split, per-band RS, scramble, beacon insertion, header prepend.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidTile`] for P5 with a degenerate tile and
    /// propagates RS failures.
    pub fn encode_frame(&self, raw: &[Word27]) -> Result<Vec<Word27>, CodecError> {
        if self.cfg.profile == ProfileId::Raw {
            return Ok(raw.to_vec());
        }

        let mut useful = useful_symbols_from_words(raw);
        debug!(words = raw.len(), useful = useful.len(), "extracted useful symbols");

        if self.cfg.profile == ProfileId::P5 {
            useful = interleave_2d(&useful, self.cfg.tile)?;
        }

        let bands = deal_into_bands(&useful);
        let mut body: Vec<Gf27> = Vec::with_capacity(useful.len() + useful.len() / 4);
        for (b, band) in bands.iter().enumerate() {
            let rs = self.rs.for_band(&self.cfg.uep, b);
            let k = rs.params().k;
            for block in band.chunks_exact(k) {
                body.extend(rs.encode_block(block)?);
            }
        }
        debug!(blocks = body.len() / 26, "per-band RS encoded");

        Scrambler::new(self.cfg.seed).scramble_all(&mut body);

        let transported = insert_beacons(
            &body,
            &self.cfg.beacon,
            &BeaconPayload {
                profile: self.cfg.profile,
                frame_seq: self.cfg.frame_seq,
                health: 0,
            },
        );

        let header = SuperframeHeader {
            profile: self.cfg.profile,
            uep: self.cfg.uep,
            tile: self.cfg.tile,
            seed: self.cfg.seed,
            beacon: self.cfg.beacon,
            subword: self.cfg.subword,
            centered: self.cfg.centered,
            coset: self.cfg.coset,
            frame_seq: self.cfg.frame_seq,
            band_map_hash: self.cfg.band_map_hash,
            ..SuperframeHeader::default()
        };
        let header_words = header.to_words(&self.rs.header)?;

        let body_words = transported.len().div_ceil(SYMBOLS_PER_WORD);
        let mut out = Vec::with_capacity(HEADER_WORDS + body_words);
        out.extend_from_slice(&header_words);
        for chunk in transported.chunks(SYMBOLS_PER_WORD) {
            let mut w = Word27::default();
            w.syms[..chunk.len()].copy_from_slice(chunk);
            out.push(w);
        }
        debug!(out_words = out.len(), "superframe assembled");
        Ok(out)
    }
}

/// Decoding context: GF tables, RS codecs, last-seen header, frame state.
pub struct DecoderContext {
    rs: RsBank,
    /// Profile expected on the wire; `Raw` bypasses the pipeline.
    pub expected_profile: ProfileId,
    last_header: Option<SuperframeHeader>,
    state: FrameState,
}

impl DecoderContext {
    /// Build a decoding context expecting profiled streams.
    #[must_use]
    pub fn new() -> Self {
        let gf = Arc::new(Gf27Field::new());
        Self {
            rs: RsBank::new(&gf),
            expected_profile: ProfileId::P2,
            last_header: None,
            state: FrameState::Idle,
        }
    }

    /// The header recovered by the most recent [`Self::decode_frame`].
    #[must_use]
    pub const fn last_header(&self) -> Option<&SuperframeHeader> {
        self.last_header.as_ref()
    }

    /// Progress of the most recent frame.
    #[must_use]
    pub const fn state(&self) -> FrameState {
        self.state
    }

    /// Decode a profiled superframe stream back into RAW words.
    ///
    /// Stages run in reverse encode order: header, beacon strip, descramble,
    /// per-band RS, band merge, optional 2D deinterleave, repack. Any RS
    /// failure beyond the t-bound aborts the frame.
    ///
    /// # Errors
    ///
    /// All error kinds of [`CodecError`]; the context state records the last
    /// completed stage.
    pub fn decode_frame(&mut self, words: &[Word27]) -> Result<Vec<Word27>, CodecError> {
        self.state = FrameState::Idle;
        if self.expected_profile == ProfileId::Raw {
            self.state = FrameState::Emitted;
            return Ok(words.to_vec());
        }

        let header = SuperframeHeader::from_words(words, &self.rs.header)?;
        self.last_header = Some(header);
        self.state = FrameState::HeaderOk;
        debug!(profile = ?header.profile, frame_seq = header.frame_seq, "header decoded");

        let mut transported = Vec::with_capacity((words.len() - HEADER_WORDS) * SYMBOLS_PER_WORD);
        for w in &words[HEADER_WORDS..] {
            transported.extend_from_slice(&w.syms);
        }

        let stripped = strip_beacons(&transported, &header.beacon);
        let blocks = stripped.len() / 26;
        let mut body = stripped;
        body.truncate(blocks * 26);
        Scrambler::new(header.seed).descramble_all(&mut body);

        let counts = band_block_counts(blocks, &header.uep)?;
        let mut decoded: [Vec<Gf27>; NUM_BANDS] = Default::default();
        let mut cursor = 0usize;
        for (b, (&m, slot)) in counts.iter().zip(decoded.iter_mut()).enumerate() {
            let rs = self.rs.for_band(&header.uep, b);
            let n = rs.params().n;
            for _ in 0..m {
                let block = &body[cursor..cursor + n];
                slot.extend(rs.decode_block(block)?.data);
                cursor += n;
            }
        }
        debug!(blocks, "per-band RS decoded");

        let mut useful = merge_bands_prefix(&decoded);
        if header.profile == ProfileId::P5 {
            useful = deinterleave_2d(&useful, header.tile)?;
        }
        self.state = FrameState::BodyDecoded;

        let out = words_from_useful_symbols(&useful);
        self.state = FrameState::Emitted;
        debug!(raw_words = out.len(), "frame emitted");
        Ok(out)
    }
}

impl Default for DecoderContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract useful symbols: 26 trits per word become 8 symbols plus a 2-trit
/// carry into the next word; the final carry is zero-padded.
fn useful_symbols_from_words(words: &[Word27]) -> Vec<Gf27> {
    let mut syms = Vec::with_capacity(words.len() * 9);
    let mut carry = [0 as UTrit; 3];
    let mut clen = 0usize;
    for w in words {
        let t = w.to_trits();
        let mut i = 0usize;
        if clen > 0 {
            while clen < 3 && i < USEFUL_TRITS {
                carry[clen] = t[i];
                clen += 1;
                i += 1;
            }
            if clen == 3 {
                syms.push(pack3(carry[0], carry[1], carry[2]));
                clen = 0;
            }
        }
        while i + 2 < USEFUL_TRITS {
            syms.push(pack3(t[i], t[i + 1], t[i + 2]));
            i += 3;
        }
        while i < USEFUL_TRITS {
            carry[clen] = t[i];
            clen += 1;
            i += 1;
        }
    }
    if clen > 0 {
        while clen < 3 {
            carry[clen] = 0;
            clen += 1;
        }
        syms.push(pack3(carry[0], carry[1], carry[2]));
    }
    syms
}

/// Repack useful symbols into RAW words: 26 trits per word, reserved trit
/// zero; a trailing partial group is dropped.
fn words_from_useful_symbols(syms: &[Gf27]) -> Vec<Word27> {
    let mut trits = Vec::with_capacity(syms.len() * 3);
    for &s in syms {
        trits.extend_from_slice(&unpack3(s));
    }
    let mut out = Vec::with_capacity(trits.len() / USEFUL_TRITS);
    let mut idx = 0usize;
    while idx + USEFUL_TRITS <= trits.len() {
        let mut t = [0 as UTrit; TRITS_PER_WORD];
        t[..USEFUL_TRITS].copy_from_slice(&trits[idx..idx + USEFUL_TRITS]);
        out.push(Word27::from_trits(&t));
        idx += USEFUL_TRITS;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::{encode_raw_pixels, PixelYcbcrQuant};

    fn synthetic_pixels(count: usize) -> Vec<PixelYcbcrQuant> {
        (0..count)
            .map(|i| PixelYcbcrQuant {
                y: ((i * 7) % 243) as u16,
                cb: ((i * 3) % 81) as i16 - 40,
                cr: ((i * 5) % 81) as i16 - 40,
            })
            .collect()
    }

    fn assert_prefix_roundtrip(cfg: EncoderConfig, pixels: usize, min_words: usize) {
        let raw_in = encode_raw_pixels(&synthetic_pixels(pixels));
        let enc = EncoderContext::new(cfg);
        let profiled = enc.encode_frame(&raw_in).unwrap();

        let mut dec = DecoderContext::new();
        let raw_out = dec.decode_frame(&profiled).unwrap();
        assert_eq!(dec.state(), FrameState::Emitted);

        let common = raw_in.len().min(raw_out.len());
        assert!(common >= min_words, "prefix too short: {common}");
        assert_eq!(&raw_in[..common], &raw_out[..common]);
    }

    #[test]
    fn useful_symbol_extraction_carries_across_words() {
        let raw = encode_raw_pixels(&synthetic_pixels(6)); // 3 words, 78 trits
        let syms = useful_symbols_from_words(&raw);
        assert_eq!(syms.len(), 26); // 78 / 3
        let back = words_from_useful_symbols(&syms);
        assert_eq!(back, raw);
    }

    #[test]
    fn raw_profile_is_identity() {
        let raw = encode_raw_pixels(&synthetic_pixels(10));
        let enc = EncoderContext::new(EncoderConfig {
            profile: ProfileId::Raw,
            ..EncoderConfig::default()
        });
        assert_eq!(enc.encode_frame(&raw).unwrap(), raw);

        let mut dec = DecoderContext::new();
        dec.expected_profile = ProfileId::Raw;
        assert_eq!(dec.decode_frame(&raw).unwrap(), raw);
    }

    /// 594 pixels give 297 RAW words and exactly 2574 useful symbols: every
    /// band receives 286 = 13·22 symbols under uniform P2, so nothing is
    /// truncated and the round-trip is exact end-to-end.
    fn assert_exact_roundtrip(cfg: EncoderConfig) {
        let raw_in = encode_raw_pixels(&synthetic_pixels(594));
        let enc = EncoderContext::new(cfg);
        let profiled = enc.encode_frame(&raw_in).unwrap();
        let mut dec = DecoderContext::new();
        let raw_out = dec.decode_frame(&profiled).unwrap();
        assert_eq!(raw_out, raw_in);
    }

    #[test]
    fn p2_roundtrip_uniform_uep() {
        assert_prefix_roundtrip(EncoderConfig::default(), 64, 20);
    }

    #[test]
    fn p2_roundtrip_exact() {
        assert_exact_roundtrip(EncoderConfig::default());
    }

    #[test]
    fn p2_roundtrip_luma_priority() {
        let cfg = EncoderConfig {
            uep: UepLayout::luma_priority(),
            ..EncoderConfig::default()
        };
        assert_prefix_roundtrip(cfg, 64, 20);
    }

    #[test]
    fn p5_roundtrip_with_tile() {
        // 2574 symbols over 8x8 tiles: 40 full tiles plus a partial tail.
        let cfg = EncoderConfig {
            profile: ProfileId::P5,
            tile: Tile2D { w: 8, h: 8 },
            ..EncoderConfig::default()
        };
        assert_exact_roundtrip(cfg);
    }

    #[test]
    fn p5_roundtrip_partial_final_tile() {
        // 16x16 tiles: 10 full tiles and a 14-symbol partial final tile.
        let cfg = EncoderConfig {
            profile: ProfileId::P5,
            tile: Tile2D { w: 16, h: 16 },
            ..EncoderConfig::default()
        };
        assert_exact_roundtrip(cfg);
    }

    #[test]
    fn p5_degenerate_tile_is_rejected() {
        let cfg = EncoderConfig {
            profile: ProfileId::P5,
            tile: Tile2D { w: 0, h: 0 },
            ..EncoderConfig::default()
        };
        let enc = EncoderContext::new(cfg);
        let raw = encode_raw_pixels(&synthetic_pixels(4));
        assert!(matches!(
            enc.encode_frame(&raw),
            Err(CodecError::InvalidTile { .. })
        ));
    }

    #[test]
    fn beacon_roundtrip() {
        let cfg = EncoderConfig {
            beacon: BeaconConfig {
                enabled: true,
                words_period: 3,
                band_slot: 4,
            },
            frame_seq: 9,
            ..EncoderConfig::default()
        };
        assert_prefix_roundtrip(cfg, 64, 20);
    }

    #[test]
    fn scrambled_stream_differs_but_recovers() {
        let raw = encode_raw_pixels(&synthetic_pixels(64));
        let base = EncoderContext::new(EncoderConfig::default());
        let alt = EncoderContext::new(EncoderConfig {
            seed: ScramblerSeed { a: 2, b: 2, s0: 2 },
            ..EncoderConfig::default()
        });
        let a = base.encode_frame(&raw).unwrap();
        let b = alt.encode_frame(&raw).unwrap();
        assert_ne!(a, b, "different seeds must change the body");

        let mut dec = DecoderContext::new();
        let out_a = dec.decode_frame(&a).unwrap();
        let out_b = dec.decode_frame(&b).unwrap();
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn decoder_corrects_channel_errors() {
        let raw = encode_raw_pixels(&synthetic_pixels(64));
        let enc = EncoderContext::new(EncoderConfig::default());
        let mut profiled = enc.encode_frame(&raw).unwrap();

        // One symbol error in the body: within t = 2 of P2's RS(26,22).
        let target = HEADER_WORDS + 2;
        profiled[target].syms[3] = (profiled[target].syms[3] + 13) % 27;

        let mut dec = DecoderContext::new();
        let out = dec.decode_frame(&profiled).unwrap();
        let clean = DecoderContext::new().decode_frame(&enc.encode_frame(&raw).unwrap());
        assert_eq!(out, clean.unwrap());
    }

    #[test]
    fn frame_state_tracks_failure_stage() {
        let raw = encode_raw_pixels(&synthetic_pixels(64));
        let enc = EncoderContext::new(EncoderConfig::default());
        let profiled = enc.encode_frame(&raw).unwrap();

        // Wreck the header beyond RS(26,18)'s reach: state stays Idle.
        let mut broken = profiled.clone();
        for w in broken.iter_mut().take(HEADER_WORDS) {
            for s in w.syms.iter_mut() {
                *s = (*s + 7) % 27;
            }
        }
        let mut dec = DecoderContext::new();
        assert!(dec.decode_frame(&broken).is_err());
        assert_eq!(dec.state(), FrameState::Idle);

        // A healthy stream ends Emitted.
        let mut dec = DecoderContext::new();
        dec.decode_frame(&profiled).unwrap();
        assert_eq!(dec.state(), FrameState::Emitted);
    }
}
