//! Band multiplexing for the body pipeline.
//!
//! Useful symbols are dealt round-robin into 9 bands (`band = index mod 9`),
//! RS-encoded per band under the UEP layout, and concatenated in band order
//! with each band's (n, k) blocks contiguous. The decoder re-derives how many
//! blocks each band contributed from the total block count alone: the map
//! from the dealt symbol count to the per-band block counts is monotone with
//! unit steps, so a binary search inverts it exactly.

use t3_gf::Gf27;

use crate::error::CodecError;
use crate::profile::{UepLayout, NUM_BANDS};

/// Symbols dealt to band `b` when `u` symbols are distributed round-robin.
#[must_use]
pub fn dealt_count(u: usize, b: usize) -> usize {
    if u > b {
        (u - b + NUM_BANDS - 1) / NUM_BANDS
    } else {
        0
    }
}

/// Deal a symbol stream round-robin into the 9 bands.
#[must_use]
pub fn deal_into_bands(syms: &[Gf27]) -> [Vec<Gf27>; NUM_BANDS] {
    let mut bands: [Vec<Gf27>; NUM_BANDS] = Default::default();
    for (i, &s) in syms.iter().enumerate() {
        bands[i % NUM_BANDS].push(s);
    }
    bands
}

/// Total complete RS blocks produced by a dealt count of `u` under `uep`.
fn total_blocks(u: usize, uep: &UepLayout) -> usize {
    (0..NUM_BANDS)
        .map(|b| dealt_count(u, b) / uep.rs_params_for_band(b).k)
        .sum()
}

/// Recover the per-band block counts behind a body of `blocks` total RS
/// blocks.
///
/// # Errors
///
/// Returns [`CodecError::OutOfRange`] when no dealt count explains `blocks`
/// (the body length is inconsistent with the UEP layout).
pub fn band_block_counts(blocks: usize, uep: &UepLayout) -> Result<[usize; NUM_BANDS], CodecError> {
    // Smallest u with total_blocks(u) >= blocks; the step size is 1, so the
    // total lands on `blocks` exactly when the layout is consistent.
    let mut lo = 0usize;
    let mut hi = NUM_BANDS * 24 * (blocks + 2);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if total_blocks(mid, uep) >= blocks {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    if total_blocks(lo, uep) != blocks {
        return Err(CodecError::OutOfRange {
            what: "body block count",
            value: blocks,
            limit: total_blocks(lo, uep),
        });
    }
    let mut counts = [0usize; NUM_BANDS];
    for (b, c) in counts.iter_mut().enumerate() {
        *c = dealt_count(lo, b) / uep.rs_params_for_band(b).k;
    }
    Ok(counts)
}

/// Merge decoded band data back into deal order, stopping at the first band
/// whose stream is exhausted (the maximal recoverable prefix).
#[must_use]
pub fn merge_bands_prefix(bands: &[Vec<Gf27>; NUM_BANDS]) -> Vec<Gf27> {
    let mut out = Vec::with_capacity(bands.iter().map(Vec::len).sum());
    let mut i = 0usize;
    loop {
        let b = i % NUM_BANDS;
        let j = i / NUM_BANDS;
        match bands[b].get(j) {
            Some(&s) => out.push(s),
            None => break,
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dealt_count_matches_direct_deal() {
        for u in 0..200 {
            let syms: Vec<Gf27> = vec![0; u];
            let bands = deal_into_bands(&syms);
            for b in 0..NUM_BANDS {
                assert_eq!(bands[b].len(), dealt_count(u, b), "u={u} b={b}");
            }
        }
    }

    #[test]
    fn block_counts_invert_uniform_layout() {
        let uep = UepLayout::uniform(1); // k = 22 everywhere
        for u in [0usize, 50, 198, 234, 1000, 2049] {
            let expected: Vec<usize> = (0..NUM_BANDS).map(|b| dealt_count(u, b) / 22).collect();
            let blocks: usize = expected.iter().sum();
            let counts = band_block_counts(blocks, &uep).unwrap();
            assert_eq!(counts.to_vec(), expected, "u = {u}");
        }
    }

    #[test]
    fn block_counts_invert_mixed_layout() {
        let uep = UepLayout::luma_priority(); // k = 20 on bands 0/3/6, else 22
        for u in [0usize, 60, 180, 200, 777, 4096] {
            let expected: Vec<usize> = (0..NUM_BANDS)
                .map(|b| dealt_count(u, b) / uep.rs_params_for_band(b).k)
                .collect();
            let blocks: usize = expected.iter().sum();
            let counts = band_block_counts(blocks, &uep).unwrap();
            assert_eq!(counts.to_vec(), expected, "u = {u}");
        }
    }

    #[test]
    fn merge_is_deal_inverse_on_full_data() {
        let syms: Vec<Gf27> = (0..180).map(|i| (i % 27) as Gf27).collect();
        let bands = deal_into_bands(&syms);
        assert_eq!(merge_bands_prefix(&bands), syms);
    }

    #[test]
    fn merge_stops_at_first_gap() {
        let syms: Vec<Gf27> = (0..30).map(|i| (i % 27) as Gf27).collect();
        let mut bands = deal_into_bands(&syms);
        bands[4].pop(); // band 4 lost its last symbol
        let merged = merge_bands_prefix(&bands);
        // Deal order breaks at the missing element of band 4.
        assert_eq!(merged.len(), 4 + 2 * NUM_BANDS);
        assert_eq!(&merged[..], &syms[..merged.len()]);
    }
}
