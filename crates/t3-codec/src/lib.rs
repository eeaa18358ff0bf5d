//! Word27 transport core for the T3 ternary codec.
//!
//! A frame travels as a stream of 27-trit words (9 GF(27) symbols each).
//! The encode pipeline is, in order: useful-symbol extraction, optional 2D
//! boustrophedon interleave (P5), round-robin split into 9 bands, per-band
//! RS(26, k) under the UEP layout, affine mod-3 scrambling, sparse beacon
//! insertion, and a doubly RS-protected superframe header carrying a ternary
//! CRC-12. Decode reverses the stages exactly.
//!
//! The GF/RS tables live behind [`EncoderContext`] / [`DecoderContext`] and
//! are immutable after construction, so contexts are cheap to share across
//! independent frames.

#![forbid(unsafe_code)]

mod bands;
mod beacon;
mod crc12;
mod error;
mod header;
mod interleave;
mod pipeline;
mod profile;
mod scramble;
mod word;

pub use bands::{band_block_counts, dealt_count};
pub use beacon::{beacon_symbol, insert_beacons, strip_beacons, BeaconPayload};
pub use crc12::{crc12_remainder, CRC12_LEN};
pub use error::CodecError;
pub use header::{HeaderSymbols, SuperframeHeader, CRC_SYMBOL_INDICES, HEADER_SYMBOLS, HEADER_WORDS};
pub use interleave::{deinterleave_2d, interleave_2d};
pub use pipeline::{DecoderContext, EncoderConfig, EncoderContext, FrameState};
pub use profile::{
    centered_window, std_res_for, ActiveWindow, BeaconConfig, CosetId, ProfileId, ScramblerSeed,
    StdRes, SubwordMode, Tile2D, UepLayout, NUM_BANDS,
};
pub use scramble::Scrambler;
pub use word::{
    decode_raw_words, encode_raw_pixels, pixel_pair_from_word, subword_stream_from_words,
    word_from_pixel_pair, words_from_subword_stream, PixelYcbcrQuant, Word27, SYMBOLS_PER_WORD,
    TRITS_PER_WORD,
};
