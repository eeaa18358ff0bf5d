//! 2D boustrophedon tile interleave (profile P5).
//!
//! Symbols are processed in tiles of `w × h`: even rows read left-to-right,
//! odd rows right-to-left. A partial final tile keeps its valid cells in the
//! same scan order, so any length round-trips.

use t3_gf::Gf27;

use crate::error::CodecError;
use crate::profile::Tile2D;

/// Permute a symbol stream tile-by-tile into boustrophedon order.
///
/// # Errors
///
/// Returns [`CodecError::InvalidTile`] when either tile dimension is zero.
pub fn interleave_2d(syms: &[Gf27], tile: Tile2D) -> Result<Vec<Gf27>, CodecError> {
    scan_tiles(syms, tile, Direction::Forward)
}

/// Invert [`interleave_2d`].
///
/// # Errors
///
/// Returns [`CodecError::InvalidTile`] when either tile dimension is zero.
pub fn deinterleave_2d(syms: &[Gf27], tile: Tile2D) -> Result<Vec<Gf27>, CodecError> {
    scan_tiles(syms, tile, Direction::Inverse)
}

#[derive(Clone, Copy, PartialEq)]
enum Direction {
    Forward,
    Inverse,
}

fn scan_tiles(syms: &[Gf27], tile: Tile2D, dir: Direction) -> Result<Vec<Gf27>, CodecError> {
    if !tile.is_usable() {
        return Err(CodecError::InvalidTile {
            w: tile.w,
            h: tile.h,
        });
    }
    let area = usize::from(tile.w) * usize::from(tile.h);
    let mut out = vec![0 as Gf27; syms.len()];
    let mut base = 0usize;
    while base < syms.len() {
        let take = area.min(syms.len() - base);
        let mut scan = 0usize;
        for row in 0..usize::from(tile.h) {
            let cols: Box<dyn Iterator<Item = usize>> = if row % 2 == 0 {
                Box::new(0..usize::from(tile.w))
            } else {
                Box::new((0..usize::from(tile.w)).rev())
            };
            for col in cols {
                let cell = row * usize::from(tile.w) + col;
                if cell >= take {
                    continue;
                }
                match dir {
                    Direction::Forward => out[base + scan] = syms[base + cell],
                    Direction::Inverse => out[base + cell] = syms[base + scan],
                }
                scan += 1;
            }
        }
        base += take;
    }
    Ok(out)
}
