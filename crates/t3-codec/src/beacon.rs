//! Sparse beacon pilots.
//!
//! With period `P > 0` and slot `s ∈ [0, 9)`, every P-th body word reserves
//! slot `s` for a pilot symbol derived from the profile, the frame sequence
//! mod 5, and a 3-valued health flag. Beacons displace payload slots, never
//! parity, and are inserted after scrambling; decoders strip them before
//! descrambling.

use t3_gf::Gf27;

use crate::profile::{BeaconConfig, ProfileId};
use crate::word::SYMBOLS_PER_WORD;

/// Fields folded into a beacon symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeaconPayload {
    /// Active transport profile.
    pub profile: ProfileId,
    /// Frame sequence, used mod 5.
    pub frame_seq: u32,
    /// Health flag, used mod 3.
    pub health: u8,
}

/// `(profile + 5·fsq5 + 15·hflag) mod 27`.
#[must_use]
pub fn beacon_symbol(payload: &BeaconPayload) -> Gf27 {
    let p = u32::from(payload.profile.code());
    let s = payload.frame_seq % 5;
    let h = u32::from(payload.health % 3);
    ((p + 5 * s + 15 * h) % 27) as Gf27
}

/// Lay scrambled body symbols into the transported stream, inserting beacons
/// at their word/slot positions. The output length is a multiple of 9; the
/// final word is zero-padded.
#[must_use]
pub fn insert_beacons(body: &[Gf27], cfg: &BeaconConfig, payload: &BeaconPayload) -> Vec<Gf27> {
    if !cfg.is_active() {
        return body.to_vec();
    }
    let period = cfg.words_period as usize;
    let slot = usize::from(cfg.band_slot) % SYMBOLS_PER_WORD;
    let pilot = beacon_symbol(payload);

    let mut out = Vec::with_capacity(body.len() + body.len() / (SYMBOLS_PER_WORD * period) + SYMBOLS_PER_WORD);
    let mut next = 0usize;
    let mut word_idx = 0usize;
    while next < body.len() {
        let is_beacon_word = word_idx % period == 0;
        for s in 0..SYMBOLS_PER_WORD {
            if is_beacon_word && s == slot {
                out.push(pilot);
            } else {
                out.push(body.get(next).copied().unwrap_or(0));
                next += 1;
            }
        }
        word_idx += 1;
    }
    out
}

/// Remove beacon positions from a transported stream, returning the scrambled
/// body symbols (still carrying any trailing zero padding).
#[must_use]
pub fn strip_beacons(transported: &[Gf27], cfg: &BeaconConfig) -> Vec<Gf27> {
    if !cfg.is_active() {
        return transported.to_vec();
    }
    let period = cfg.words_period as usize;
    let slot = usize::from(cfg.band_slot) % SYMBOLS_PER_WORD;

    let mut out = Vec::with_capacity(transported.len());
    for (i, &sym) in transported.iter().enumerate() {
        let word_idx = i / SYMBOLS_PER_WORD;
        let s = i % SYMBOLS_PER_WORD;
        if word_idx % period == 0 && s == slot {
            continue;
        }
        out.push(sym);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(period: u32, slot: u8) -> BeaconConfig {
        BeaconConfig {
            enabled: true,
            words_period: period,
            band_slot: slot,
        }
    }

    fn payload() -> BeaconPayload {
        BeaconPayload {
            profile: ProfileId::P2,
            frame_seq: 7,
            health: 1,
        }
    }

    #[test]
    fn beacon_symbol_formula() {
        // profile P2 = 1, fsq5 = 2, hflag = 1 -> (1 + 10 + 15) % 27 = 26.
        let p = BeaconPayload {
            profile: ProfileId::P2,
            frame_seq: 7,
            health: 1,
        };
        assert_eq!(beacon_symbol(&p), 26);
    }

    #[test]
    fn disabled_config_passes_through() {
        let body: Vec<Gf27> = (0..20).map(|i| (i % 27) as Gf27).collect();
        let off = BeaconConfig::default();
        assert_eq!(insert_beacons(&body, &off, &payload()), body);
        assert_eq!(strip_beacons(&body, &off), body);
    }

    #[test]
    fn insert_then_strip_recovers_body() {
        let body: Vec<Gf27> = (0..100).map(|i| ((i * 7) % 27) as Gf27).collect();
        for period in [1u32, 2, 3, 5] {
            for slot in [0u8, 2, 8] {
                let c = cfg(period, slot);
                let transported = insert_beacons(&body, &c, &payload());
                assert_eq!(transported.len() % SYMBOLS_PER_WORD, 0);
                let stripped = strip_beacons(&transported, &c);
                // Stripping returns the body plus trailing zero padding.
                assert!(stripped.len() >= body.len());
                assert_eq!(&stripped[..body.len()], body.as_slice());
                assert!(stripped[body.len()..].iter().all(|&s| s == 0));
            }
        }
    }

    #[test]
    fn pilots_sit_at_expected_positions() {
        let body = vec![5 as Gf27; 90];
        let c = cfg(2, 3);
        let transported = insert_beacons(&body, &c, &payload());
        let pilot = beacon_symbol(&payload());
        for (i, &sym) in transported.iter().enumerate() {
            let word_idx = i / SYMBOLS_PER_WORD;
            let slot = i % SYMBOLS_PER_WORD;
            if word_idx % 2 == 0 && slot == 3 {
                assert_eq!(sym, pilot, "missing pilot at word {word_idx}");
            }
        }
    }
}
