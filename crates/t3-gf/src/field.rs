//! GF(27) arithmetic over `p(x) = x³ + 2x + 1`.

/// A GF(27) element in integer form, `0..=26`.
pub type Gf27 = u8;

/// Number of field elements.
pub const FIELD_ORDER: usize = 27;

/// Multiplicative group order.
const GROUP_ORDER: usize = 26;

/// Pack three unbalanced trits into one GF(27) symbol (`t0 + 3·t1 + 9·t2`).
#[must_use]
pub fn pack3(t0: u8, t1: u8, t2: u8) -> Gf27 {
    t0 + 3 * t1 + 9 * t2
}

/// Unpack a GF(27) symbol into its three unbalanced trits, LSD-first.
#[must_use]
pub fn unpack3(s: Gf27) -> [u8; 3] {
    [s % 3, (s / 3) % 3, (s / 9) % 3]
}

/// Digit-wise addition mod 3.
#[must_use]
pub fn add(a: Gf27, b: Gf27) -> Gf27 {
    let [a0, a1, a2] = unpack3(a);
    let [b0, b1, b2] = unpack3(b);
    pack3((a0 + b0) % 3, (a1 + b1) % 3, (a2 + b2) % 3)
}

/// Digit-wise subtraction mod 3.
#[must_use]
pub fn sub(a: Gf27, b: Gf27) -> Gf27 {
    let [a0, a1, a2] = unpack3(a);
    let [b0, b1, b2] = unpack3(b);
    pack3(
        (3 + a0 - b0) % 3,
        (3 + a1 - b1) % 3,
        (3 + a2 - b2) % 3,
    )
}

/// Polynomial multiplication reduced by `x³ + 2x + 1` (so `x³ ≡ x + 2`,
/// `x⁴ ≡ x² + 2x`).
#[must_use]
pub fn mul_poly(a: Gf27, b: Gf27) -> Gf27 {
    if a == 0 || b == 0 {
        return 0;
    }
    let [a0, a1, a2] = unpack3(a).map(u16::from);
    let [b0, b1, b2] = unpack3(b).map(u16::from);
    let mut r0 = (a0 * b0) % 3;
    let mut r1 = (a0 * b1 + a1 * b0) % 3;
    let mut r2 = (a0 * b2 + a1 * b1 + a2 * b0) % 3;
    let r3 = (a1 * b2 + a2 * b1) % 3;
    let r4 = (a2 * b2) % 3;
    r1 = (r1 + r3) % 3;
    r0 = (r0 + 2 * r3) % 3;
    r2 = (r2 + r4) % 3;
    r1 = (r1 + 2 * r4) % 3;
    pack3(r0 as u8, r1 as u8, r2 as u8)
}

/// Precomputed GF(27) tables seeded from the smallest primitive element of
/// order 26.
///
/// Built once per context; read-only and freely shareable afterwards.
#[derive(Debug, Clone)]
pub struct Gf27Field {
    exp: [Gf27; GROUP_ORDER * 3],
    log: [i16; FIELD_ORDER],
    mul: [[Gf27; FIELD_ORDER]; FIELD_ORDER],
    inv: [Gf27; FIELD_ORDER],
    primitive: Gf27,
}

impl Gf27Field {
    /// Build the tables.
    ///
    /// The multiplicative group of GF(27) is cyclic of order 26, so a
    /// primitive element always exists; the smallest candidate `α ≥ 2` with
    /// order 26 is chosen for determinism.
    #[must_use]
    pub fn new() -> Self {
        let primitive = (2..FIELD_ORDER as Gf27)
            .find(|&c| order_of(c) == GROUP_ORDER)
            .unwrap_or_else(|| panic!("GF(27) tables inconsistent: no element of order 26"));

        let mut exp = [0 as Gf27; GROUP_ORDER * 3];
        let mut log = [-1i16; FIELD_ORDER];
        exp[0] = 1;
        log[1] = 0;
        for i in 1..GROUP_ORDER {
            exp[i] = mul_poly(exp[i - 1], primitive);
            log[exp[i] as usize] = i as i16;
        }
        for i in GROUP_ORDER..GROUP_ORDER * 3 {
            exp[i] = exp[i - GROUP_ORDER];
        }

        let mut mul = [[0 as Gf27; FIELD_ORDER]; FIELD_ORDER];
        for a in 0..FIELD_ORDER {
            for b in 0..FIELD_ORDER {
                mul[a][b] = mul_poly(a as Gf27, b as Gf27);
            }
        }

        // inv[0] stays 0 as a sentinel; callers must not invert zero.
        let mut inv = [0 as Gf27; FIELD_ORDER];
        for a in 1..FIELD_ORDER {
            let la = log[a] as usize;
            inv[a] = exp[(GROUP_ORDER - la) % GROUP_ORDER];
        }

        Self {
            exp,
            log,
            mul,
            inv,
            primitive,
        }
    }

    /// The primitive element the tables were seeded from.
    #[must_use]
    pub const fn primitive(&self) -> Gf27 {
        self.primitive
    }

    /// Table-backed multiplication.
    #[must_use]
    pub fn mul(&self, a: Gf27, b: Gf27) -> Gf27 {
        self.mul[a as usize][b as usize]
    }

    /// Multiplicative inverse; `inv(0) = 0` by sentinel convention.
    #[must_use]
    pub fn inv(&self, a: Gf27) -> Gf27 {
        self.inv[a as usize]
    }

    /// `α^e` with the exponent reduced mod 26 (negative exponents allowed).
    #[must_use]
    pub fn pow_alpha(&self, e: i32) -> Gf27 {
        let m = e.rem_euclid(GROUP_ORDER as i32) as usize;
        self.exp[m]
    }

    /// Discrete log base α; `-1` for zero.
    #[must_use]
    pub fn log(&self, a: Gf27) -> i16 {
        self.log[a as usize]
    }
}

impl Default for Gf27Field {
    fn default() -> Self {
        Self::new()
    }
}

/// Multiplicative order of `g`, or 0 when undefined (g ∈ {0, 1}).
fn order_of(g: Gf27) -> usize {
    if g <= 1 {
        return 0;
    }
    let mut x: Gf27 = 1;
    for i in 1..=GROUP_ORDER {
        x = mul_poly(x, g);
        if x == 1 {
            return i;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_symbol() {
        for s in 0..27 {
            let [t0, t1, t2] = unpack3(s);
            assert_eq!(pack3(t0, t1, t2), s);
        }
    }

    #[test]
    fn add_sub_inverse() {
        for a in 0..27 {
            for b in 0..27 {
                assert_eq!(sub(add(a, b), b), a);
            }
        }
    }

    #[test]
    fn additive_characteristic_three() {
        for a in 0..27 {
            assert_eq!(add(add(a, a), a), 0);
        }
    }

    #[test]
    fn primitive_generates_group() {
        let f = Gf27Field::new();
        let mut seen = [false; 27];
        let mut x: Gf27 = 1;
        for _ in 0..26 {
            assert!(!seen[x as usize]);
            seen[x as usize] = true;
            x = mul_poly(x, f.primitive());
        }
        assert_eq!(x, 1);
        assert!(!seen[0]);
    }

    #[test]
    fn mul_table_matches_poly() {
        let f = Gf27Field::new();
        for a in 0..27 {
            for b in 0..27 {
                assert_eq!(f.mul(a, b), mul_poly(a, b));
            }
        }
    }

    #[test]
    fn inverses() {
        let f = Gf27Field::new();
        assert_eq!(f.inv(0), 0);
        for a in 1..27 {
            assert_eq!(f.mul(a, f.inv(a)), 1, "a = {a}");
        }
    }

    #[test]
    fn pow_alpha_wraps() {
        let f = Gf27Field::new();
        assert_eq!(f.pow_alpha(0), 1);
        assert_eq!(f.pow_alpha(26), 1);
        assert_eq!(f.pow_alpha(-26), 1);
        assert_eq!(f.pow_alpha(-1), f.pow_alpha(25));
        assert_eq!(f.pow_alpha(1), f.primitive());
    }

    #[test]
    fn distributivity_spot_checks() {
        for a in 0..27 {
            for b in 0..27 {
                let c = 14;
                assert_eq!(mul_poly(a, add(b, c)), add(mul_poly(a, b), mul_poly(a, c)));
            }
        }
    }
}
