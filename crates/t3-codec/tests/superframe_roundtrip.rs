//! End-to-end superframe pipeline checks over the public API.

use t3_codec::{
    decode_raw_words, encode_raw_pixels, BeaconConfig, CosetId, DecoderContext, EncoderConfig,
    EncoderContext, FrameState, PixelYcbcrQuant, ProfileId, SubwordMode, Tile2D, UepLayout,
};

/// A 2x2 image's quantized triples, two words, RAW profile: the words and
/// the triples both survive untouched.
#[test]
fn raw_two_by_two_image() {
    // Quantized forms of saturated red, green, blue, and mid grey.
    let pixels = vec![
        PixelYcbcrQuant { y: 58, cb: -17, cr: 40 },
        PixelYcbcrQuant { y: 160, cb: -33, cr: -37 },
        PixelYcbcrQuant { y: 25, cb: 40, cr: -4 },
        PixelYcbcrQuant { y: 121, cb: 0, cr: 0 },
    ];
    let words = encode_raw_pixels(&pixels);
    assert_eq!(words.len(), 2);

    let enc = EncoderContext::new(EncoderConfig {
        profile: ProfileId::Raw,
        subword: SubwordMode::S27,
        ..EncoderConfig::default()
    });
    let stream = enc.encode_frame(&words).unwrap();
    assert_eq!(stream, words, "RAW profile is the identity");

    let mut dec = DecoderContext::new();
    dec.expected_profile = ProfileId::Raw;
    let back = dec.decode_frame(&stream).unwrap();
    assert_eq!(decode_raw_words(&back), pixels);
}

/// Full config surface: P5 with beacons, luma-priority UEP, a non-trivial
/// coset and frame sequence. 594 pixels fill every band block exactly, so
/// the round-trip is lossless and the recovered header carries every field.
#[test]
fn configured_superframe_roundtrip() {
    let pixels: Vec<PixelYcbcrQuant> = (0..594)
        .map(|i| PixelYcbcrQuant {
            y: ((i * 7) % 243) as u16,
            cb: ((i * 3) % 81) as i16 - 40,
            cr: ((i * 5) % 81) as i16 - 40,
        })
        .collect();
    let raw = encode_raw_pixels(&pixels);

    let cfg = EncoderConfig {
        profile: ProfileId::P5,
        uep: UepLayout::uniform(1),
        tile: Tile2D { w: 16, h: 16 },
        beacon: BeaconConfig {
            enabled: true,
            words_period: 5,
            band_slot: 2,
        },
        subword: SubwordMode::S24,
        centered: true,
        coset: CosetId::C2,
        frame_seq: 42,
        ..EncoderConfig::default()
    };
    let enc = EncoderContext::new(cfg);
    let stream = enc.encode_frame(&raw).unwrap();

    let mut dec = DecoderContext::new();
    let back = dec.decode_frame(&stream).unwrap();
    assert_eq!(back, raw);
    assert_eq!(dec.state(), FrameState::Emitted);

    let header = dec.last_header().unwrap();
    assert_eq!(header.profile, ProfileId::P5);
    assert_eq!(header.tile, Tile2D { w: 16, h: 16 });
    assert_eq!(header.subword, SubwordMode::S24);
    assert_eq!(header.coset, CosetId::C2);
    assert_eq!(header.frame_seq, 42);
    assert!(header.beacon.enabled);
    assert_eq!(header.beacon.words_period, 5);
    assert_eq!(header.beacon.band_slot, 2);
}

/// The pixel quantization loss bound: encode→decode is exact on quantized
/// triples for the entire admissible range.
#[test]
fn quantized_range_sweep() {
    let mut pixels = Vec::new();
    for y in [0u16, 1, 121, 241, 242] {
        for c in [-40i16, -1, 0, 1, 40] {
            pixels.push(PixelYcbcrQuant { y, cb: c, cr: -c });
        }
    }
    if pixels.len() % 2 == 1 {
        pixels.push(PixelYcbcrQuant::default());
    }
    let words = encode_raw_pixels(&pixels);
    assert_eq!(decode_raw_words(&words), pixels);
}
