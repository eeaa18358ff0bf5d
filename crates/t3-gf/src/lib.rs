//! GF(27) arithmetic and Reed-Solomon coding for the T3 codec.
//!
//! Field elements are identified with three unbalanced ternary digits
//! `(d0, d1, d2)`, integer form `d0 + 3·d1 + 9·d2 ∈ [0, 26]`. Addition is
//! digit-wise mod 3; multiplication reduces modulo the fixed primitive
//! polynomial `p(x) = x³ + 2x + 1` over GF(3). Log/exp/mul/inv tables are
//! built once around the smallest primitive element of order 26.
//!
//! On top of the field sits a systematic RS(26, k) codec, k ∈ {24, 22, 20,
//! 18}, with generator `g(x) = Π (x - αⁱ)` for i = 1..n-k. Decoding runs
//! syndromes, Berlekamp-Massey, a Chien search over α⁻ⁱ, and Forney
//! evaluation with the characteristic-3 formal derivative.

#![forbid(unsafe_code)]

mod error;
mod field;
mod rs;

pub use error::RsError;
pub use field::{add, mul_poly, pack3, sub, unpack3, Gf27, Gf27Field, FIELD_ORDER};
pub use rs::{DecodedBlock, RsCodec, RsParams};
