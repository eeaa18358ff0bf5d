//! 27-trit words and the quantized-pixel pair packing.
//!
//! The committed pixel policy is pair packing: two quantized YCbCr pixels per
//! word, laid out as 5 trits Y, 4 trits Cb+40, 4 trits Cr+40 for each pixel,
//! with the final trit fixed to zero.

use t3_gf::{pack3, unpack3, Gf27};
use t3_trit::UTrit;

/// Trits per word.
pub const TRITS_PER_WORD: usize = 27;

/// GF(27) symbols per word.
pub const SYMBOLS_PER_WORD: usize = 9;

/// One 27-trit transport word: 9 GF(27) symbols; slot indices 0..8 double as
/// band indices in the body multiplex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Word27 {
    /// The nine symbols, slot order.
    pub syms: [Gf27; SYMBOLS_PER_WORD],
}

impl Word27 {
    /// Build a word from 27 unbalanced trits.
    #[must_use]
    pub fn from_trits(trits: &[UTrit; TRITS_PER_WORD]) -> Self {
        let mut syms = [0 as Gf27; SYMBOLS_PER_WORD];
        for (s, sym) in syms.iter_mut().enumerate() {
            *sym = pack3(trits[s * 3], trits[s * 3 + 1], trits[s * 3 + 2]);
        }
        Self { syms }
    }

    /// Expand the word into 27 unbalanced trits.
    #[must_use]
    pub fn to_trits(self) -> [UTrit; TRITS_PER_WORD] {
        let mut out = [0u8; TRITS_PER_WORD];
        for (s, &sym) in self.syms.iter().enumerate() {
            let d = unpack3(sym);
            out[s * 3..s * 3 + 3].copy_from_slice(&d);
        }
        out
    }
}

/// A quantized pixel: `Y ∈ [0, 242]`, `Cb/Cr ∈ [-40, +40]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelYcbcrQuant {
    /// Quantized luma.
    pub y: u16,
    /// Quantized blue-difference chroma.
    pub cb: i16,
    /// Quantized red-difference chroma.
    pub cr: i16,
}

impl PixelYcbcrQuant {
    /// Clamp the components into their documented saturation ranges.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            y: self.y.min(242),
            cb: self.cb.clamp(-40, 40),
            cr: self.cr.clamp(-40, 40),
        }
    }
}

fn int_to_trits(mut v: u32, width: usize, out: &mut [UTrit; TRITS_PER_WORD], start: usize) {
    for t in out.iter_mut().skip(start).take(width) {
        *t = (v % 3) as UTrit;
        v /= 3;
    }
}

fn trits_to_int(trits: &[UTrit; TRITS_PER_WORD], width: usize, start: usize) -> u32 {
    let mut val: u32 = 0;
    let mut pow: u32 = 1;
    for &t in trits.iter().skip(start).take(width) {
        val += pow * u32::from(t);
        pow *= 3;
    }
    val
}

/// Pack two quantized pixels into one word. Inputs saturate to range.
#[must_use]
pub fn word_from_pixel_pair(a: PixelYcbcrQuant, b: PixelYcbcrQuant) -> Word27 {
    let a = a.clamped();
    let b = b.clamped();
    let mut t = [0u8; TRITS_PER_WORD];
    int_to_trits(u32::from(a.y), 5, &mut t, 0);
    int_to_trits((a.cb + 40) as u32, 4, &mut t, 5);
    int_to_trits((a.cr + 40) as u32, 4, &mut t, 9);
    int_to_trits(u32::from(b.y), 5, &mut t, 13);
    int_to_trits((b.cb + 40) as u32, 4, &mut t, 18);
    int_to_trits((b.cr + 40) as u32, 4, &mut t, 22);
    t[26] = 0;
    Word27::from_trits(&t)
}

/// Unpack a word back into its two quantized pixels.
#[must_use]
pub fn pixel_pair_from_word(w: Word27) -> (PixelYcbcrQuant, PixelYcbcrQuant) {
    let t = w.to_trits();
    let a = PixelYcbcrQuant {
        y: trits_to_int(&t, 5, 0) as u16,
        cb: trits_to_int(&t, 4, 5) as i16 - 40,
        cr: trits_to_int(&t, 4, 9) as i16 - 40,
    };
    let b = PixelYcbcrQuant {
        y: trits_to_int(&t, 5, 13) as u16,
        cb: trits_to_int(&t, 4, 18) as i16 - 40,
        cr: trits_to_int(&t, 4, 22) as i16 - 40,
    };
    (a, b)
}

/// Pack a pixel stream into RAW words, two pixels per word; an odd tail is
/// padded with a zero pixel.
#[must_use]
pub fn encode_raw_pixels(pixels: &[PixelYcbcrQuant]) -> Vec<Word27> {
    let mut out = Vec::with_capacity(pixels.len().div_ceil(2));
    for pair in pixels.chunks(2) {
        let b = pair.get(1).copied().unwrap_or_default();
        out.push(word_from_pixel_pair(pair[0], b));
    }
    out
}

/// Unpack RAW words into the pixel stream (two pixels per word, including any
/// encoder padding pixel).
#[must_use]
pub fn decode_raw_words(words: &[Word27]) -> Vec<PixelYcbcrQuant> {
    let mut out = Vec::with_capacity(words.len() * 2);
    for &w in words {
        let (a, b) = pixel_pair_from_word(w);
        out.push(a);
        out.push(b);
    }
    out
}

/// Extract the first `n` trits of each word into one flat stream.
#[must_use]
pub fn subword_stream_from_words(words: &[Word27], n: usize) -> Vec<UTrit> {
    let n = n.min(TRITS_PER_WORD);
    let mut out = Vec::with_capacity(words.len() * n);
    for &w in words {
        out.extend_from_slice(&w.to_trits()[..n]);
    }
    out
}

/// Rebuild words from an `n`-trit-per-word stream, filling unused trits with
/// `fill`. A partial final group still yields a word.
#[must_use]
pub fn words_from_subword_stream(stream: &[UTrit], n: usize, fill: UTrit) -> Vec<Word27> {
    let n = n.clamp(1, TRITS_PER_WORD);
    let mut out = Vec::with_capacity(stream.len().div_ceil(n));
    for chunk in stream.chunks(n) {
        let mut t = [fill; TRITS_PER_WORD];
        t[..chunk.len()].copy_from_slice(chunk);
        out.push(Word27::from_trits(&t));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_trit_roundtrip() {
        let mut t = [0u8; TRITS_PER_WORD];
        for (i, slot) in t.iter_mut().enumerate() {
            *slot = (i % 3) as u8;
        }
        let w = Word27::from_trits(&t);
        assert_eq!(w.to_trits(), t);
    }

    #[test]
    fn pixel_pair_roundtrip() {
        let a = PixelYcbcrQuant {
            y: 242,
            cb: -40,
            cr: 40,
        };
        let b = PixelYcbcrQuant {
            y: 128,
            cb: 7,
            cr: -13,
        };
        let w = word_from_pixel_pair(a, b);
        assert_eq!(pixel_pair_from_word(w), (a, b));
        // Final trit is reserved zero.
        assert_eq!(w.to_trits()[26], 0);
    }

    #[test]
    fn pixel_pack_saturates() {
        let hot = PixelYcbcrQuant {
            y: 999,
            cb: 100,
            cr: -100,
        };
        let w = word_from_pixel_pair(hot, PixelYcbcrQuant::default());
        let (a, _) = pixel_pair_from_word(w);
        assert_eq!(
            a,
            PixelYcbcrQuant {
                y: 242,
                cb: 40,
                cr: -40
            }
        );
    }

    #[test]
    fn odd_pixel_count_pads() {
        let px = vec![
            PixelYcbcrQuant {
                y: 10,
                cb: 0,
                cr: 0
            };
            3
        ];
        let words = encode_raw_pixels(&px);
        assert_eq!(words.len(), 2);
        let back = decode_raw_words(&words);
        assert_eq!(&back[..3], px.as_slice());
        assert_eq!(back[3], PixelYcbcrQuant::default());
    }

    #[test]
    fn subword_stream_roundtrip() {
        let px: Vec<PixelYcbcrQuant> = (0..8)
            .map(|i| PixelYcbcrQuant {
                y: i * 30,
                cb: i as i16 * 5 - 20,
                cr: 20 - i as i16 * 5,
            })
            .collect();
        let words = encode_raw_pixels(&px);
        for n in [27, 24, 21, 18, 15] {
            let stream = subword_stream_from_words(&words, n);
            assert_eq!(stream.len(), words.len() * n);
            let rebuilt = words_from_subword_stream(&stream, n, 0);
            assert_eq!(rebuilt.len(), words.len());
            for (orig, re) in words.iter().zip(&rebuilt) {
                assert_eq!(&orig.to_trits()[..n], &re.to_trits()[..n]);
            }
        }
    }
}
