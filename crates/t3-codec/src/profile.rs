//! Profiles, UEP layouts, subword modes, and the small header-side types.

use serde::{Deserialize, Serialize};
use t3_gf::RsParams;

use crate::error::CodecError;

/// Bands in the slot multiplex.
pub const NUM_BANDS: usize = 9;

/// Transport profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileId {
    /// RS(26,24), t = 1.
    P1,
    /// RS(26,22), t = 2 (default).
    P2,
    /// RS(26,20), t = 3.
    P3,
    /// RS(26,18), t = 4.
    P4,
    /// P2 plus 2D boustrophedon interleave.
    P5,
    /// No ECC; words pass through untouched.
    Raw,
}

impl ProfileId {
    /// Wire code; `Raw` uses the reserved 0xFF.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::P1 => 0,
            Self::P2 => 1,
            Self::P3 => 2,
            Self::P4 => 3,
            Self::P5 => 4,
            Self::Raw => 0xFF,
        }
    }

    /// Parse a wire code.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidProfile`] for unknown codes.
    pub const fn from_code(code: u8) -> Result<Self, CodecError> {
        match code {
            0 => Ok(Self::P1),
            1 => Ok(Self::P2),
            2 => Ok(Self::P3),
            3 => Ok(Self::P4),
            4 => Ok(Self::P5),
            0xFF => Ok(Self::Raw),
            _ => Err(CodecError::InvalidProfile { code }),
        }
    }

    /// RS parameters for this profile (`Raw` borrows the P2 defaults; its
    /// pipeline never invokes them).
    #[must_use]
    pub const fn rs_params(self) -> RsParams {
        match self {
            Self::P1 => RsParams::new(26, 24),
            Self::P3 => RsParams::new(26, 20),
            Self::P4 => RsParams::new(26, 18),
            Self::P2 | Self::P5 | Self::Raw => RsParams::new(26, 22),
        }
    }
}

/// Per-band protection layout: nine profile indices in `{0, 1, 2, 3}`
/// selecting P1..P4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UepLayout {
    /// Profile index per band.
    pub band_profile: [u8; NUM_BANDS],
}

impl UepLayout {
    /// Same profile index on every band.
    #[must_use]
    pub fn uniform(idx: u8) -> Self {
        Self {
            band_profile: [idx % 4; NUM_BANDS],
        }
    }

    /// Stronger protection (P3) on the luma-ish bands {0, 3, 6}, P2 elsewhere.
    #[must_use]
    pub fn luma_priority() -> Self {
        let mut band_profile = [1u8; NUM_BANDS];
        band_profile[0] = 2;
        band_profile[3] = 2;
        band_profile[6] = 2;
        Self { band_profile }
    }

    /// RS parameters for band `b`.
    #[must_use]
    pub fn rs_params_for_band(&self, b: usize) -> RsParams {
        match self.band_profile[b] % 4 {
            0 => RsParams::new(26, 24),
            1 => RsParams::new(26, 22),
            2 => RsParams::new(26, 20),
            _ => RsParams::new(26, 18),
        }
    }
}

/// Tile for 2D boustrophedon interleaving (P5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tile2D {
    /// Tile width in symbols.
    pub w: u16,
    /// Tile height in symbols.
    pub h: u16,
}

impl Tile2D {
    /// Whether the tile can permute anything.
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        self.w != 0 && self.h != 0
    }
}

/// Affine mod-3 scrambler seed; all three components live in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScramblerSeed {
    /// Multiplier.
    pub a: u32,
    /// Increment.
    pub b: u32,
    /// Initial state.
    pub s0: u32,
}

impl Default for ScramblerSeed {
    fn default() -> Self {
        Self { a: 1, b: 1, s0: 1 }
    }
}

/// Sparse beacon configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BeaconConfig {
    /// Insert a beacon every `words_period` body words; 0 disables.
    pub words_period: u32,
    /// Slot `[0, 9)` the beacon occupies.
    pub band_slot: u8,
    /// Master switch.
    pub enabled: bool,
}

impl BeaconConfig {
    /// Whether beacons are actually inserted.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.enabled && self.words_period > 0
    }
}

/// Per-frame coset label; carried but opaque to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CosetId {
    /// Coset 0.
    #[default]
    C0,
    /// Coset 1.
    C1,
    /// Coset 2.
    C2,
}

impl CosetId {
    /// Wire code, `0..=2`.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::C0 => 0,
            Self::C1 => 1,
            Self::C2 => 2,
        }
    }

    /// Parse a wire code mod 3.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code % 3 {
            0 => Self::C0,
            1 => Self::C1,
            _ => Self::C2,
        }
    }
}

/// Logical stream width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SubwordMode {
    /// 27 payload trits per word (8K canvas).
    #[default]
    S27,
    /// 24 payload trits (4K).
    S24,
    /// 21 payload trits (1080p).
    S21,
    /// 18 payload trits (720p).
    S18,
    /// 15 payload trits (qHD).
    S15,
}

impl SubwordMode {
    /// One-byte wire code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::S27 => 0,
            Self::S24 => 1,
            Self::S21 => 2,
            Self::S18 => 3,
            Self::S15 => 4,
        }
    }

    /// Parse a wire code.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidSubword`] for unknown codes.
    pub const fn from_code(code: u8) -> Result<Self, CodecError> {
        match code {
            0 => Ok(Self::S27),
            1 => Ok(Self::S24),
            2 => Ok(Self::S21),
            3 => Ok(Self::S18),
            4 => Ok(Self::S15),
            _ => Err(CodecError::InvalidSubword { code }),
        }
    }

    /// Payload trits per word in this mode.
    #[must_use]
    pub const fn payload_trits(self) -> usize {
        match self {
            Self::S27 => 27,
            Self::S24 => 24,
            Self::S21 => 21,
            Self::S18 => 18,
            Self::S15 => 15,
        }
    }
}

/// A canonical canvas resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdRes {
    /// Width in pixels.
    pub w: u16,
    /// Height in pixels.
    pub h: u16,
}

/// Canonical resolution for a subword mode.
#[must_use]
pub const fn std_res_for(mode: SubwordMode) -> StdRes {
    match mode {
        SubwordMode::S27 => StdRes { w: 7680, h: 4320 },
        SubwordMode::S24 => StdRes { w: 3840, h: 2160 },
        SubwordMode::S21 => StdRes { w: 1920, h: 1080 },
        SubwordMode::S18 => StdRes { w: 1280, h: 720 },
        SubwordMode::S15 => StdRes { w: 960, h: 540 },
    }
}

/// A window placed inside the S27 canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWindow {
    /// Left edge.
    pub x0: u32,
    /// Top edge.
    pub y0: u32,
    /// Window width.
    pub w: u32,
    /// Window height.
    pub h: u32,
}

/// The centered active window for `mode` on the S27 canvas.
#[must_use]
pub const fn centered_window(mode: SubwordMode) -> ActiveWindow {
    let base = std_res_for(SubwordMode::S27);
    let target = std_res_for(mode);
    ActiveWindow {
        x0: ((base.w - target.w) / 2) as u32,
        y0: ((base.h - target.h) / 2) as u32,
        w: target.w as u32,
        h: target.h as u32,
    }
}
