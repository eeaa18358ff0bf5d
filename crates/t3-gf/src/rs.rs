//! Systematic RS(26, k) encoder/decoder over GF(27).

use std::sync::Arc;

use crate::error::RsError;
use crate::field::{add, pack3, sub, unpack3, Gf27, Gf27Field};

/// Code parameters. `n = 26` throughout the codec; `k` selects the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsParams {
    /// Code length.
    pub n: usize,
    /// Data symbols per block.
    pub k: usize,
}

impl RsParams {
    /// Construct parameters.
    #[must_use]
    pub const fn new(n: usize, k: usize) -> Self {
        Self { n, k }
    }

    /// Parity symbols per block.
    #[must_use]
    pub const fn parity(&self) -> usize {
        self.n - self.k
    }

    /// Correction capability `t = ⌊(n-k)/2⌋`.
    #[must_use]
    pub const fn t(&self) -> usize {
        (self.n - self.k) / 2
    }
}

/// A successfully decoded block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBlock {
    /// The `k` data symbols.
    pub data: Vec<Gf27>,
    /// Positions (into the length-`n` codeword) that were corrected.
    pub corrected: Vec<usize>,
}

/// RS(26, k) codec bound to a shared GF(27) table set.
///
/// Construction precomputes the generator polynomial and the parity
/// interpolation basis; the codec is read-only afterwards and safe to share
/// across frames.
#[derive(Debug, Clone)]
pub struct RsCodec {
    gf: Arc<Gf27Field>,
    params: RsParams,
    /// Generator coefficients, low degree first.
    gen: Vec<Gf27>,
    /// Lagrange basis over the generator roots, one deg-< r polynomial per
    /// root, used to solve the systematic parity.
    parity_basis: Vec<Vec<Gf27>>,
    /// `α^{-m·k}` for each root index m = 1..=r.
    parity_scale: Vec<Gf27>,
}

impl RsCodec {
    /// Build a codec for `params` over the shared field tables.
    #[must_use]
    pub fn new(gf: Arc<Gf27Field>, params: RsParams) -> Self {
        let r = params.parity();
        // g(x) = Π (x - α^i), i = 1..=r
        let mut gen: Vec<Gf27> = vec![1];
        for i in 1..=r {
            let root = gf.pow_alpha(i as i32);
            let mut next = vec![0 as Gf27; gen.len() + 1];
            for (j, &gj) in gen.iter().enumerate() {
                next[j] = sub(next[j], gf.mul(gj, root));
                next[j + 1] = add(next[j + 1], gj);
            }
            gen = next;
        }

        // Parity solves d(x) + x^k·p(x) ≡ 0 (mod g): p is the unique deg-< r
        // polynomial through (α^m, -d(α^m)·α^{-mk}). Precompute the Lagrange
        // basis at the roots and the α^{-mk} factors.
        let roots: Vec<Gf27> = (1..=r).map(|m| gf.pow_alpha(m as i32)).collect();
        let mut parity_basis = Vec::with_capacity(r);
        for m in 0..r {
            let mut num: Vec<Gf27> = vec![1];
            let mut den: Gf27 = 1;
            for (l, &xl) in roots.iter().enumerate() {
                if l == m {
                    continue;
                }
                let mut next = vec![0 as Gf27; num.len() + 1];
                for (j, &c) in num.iter().enumerate() {
                    next[j] = sub(next[j], gf.mul(c, xl));
                    next[j + 1] = add(next[j + 1], c);
                }
                num = next;
                den = gf.mul(den, sub(roots[m], xl));
            }
            let inv_den = gf.inv(den);
            for c in num.iter_mut() {
                *c = gf.mul(*c, inv_den);
            }
            num.resize(r, 0);
            parity_basis.push(num);
        }
        let parity_scale = (1..=r)
            .map(|m| gf.pow_alpha(-((m * params.k) as i32)))
            .collect();

        Self {
            gf,
            params,
            gen,
            parity_basis,
            parity_scale,
        }
    }

    /// Code parameters.
    #[must_use]
    pub const fn params(&self) -> RsParams {
        self.params
    }

    /// Generator polynomial `g(x) = Π (x - αⁱ)`, coefficients low degree
    /// first; every codeword is divisible by it.
    #[must_use]
    pub fn generator(&self) -> &[Gf27] {
        &self.gen
    }

    /// Systematic encode: `data` followed by `n - k` parity symbols chosen so
    /// the codeword's syndromes vanish at α¹..αʳ.
    ///
    /// # Errors
    ///
    /// Returns [`RsError::WrongLength`] when `data.len() != k`.
    pub fn encode_block(&self, data: &[Gf27]) -> Result<Vec<Gf27>, RsError> {
        let RsParams { n, k } = self.params;
        if data.len() != k {
            return Err(RsError::WrongLength {
                expected: k,
                got: data.len(),
            });
        }
        let r = n - k;
        let gf = &self.gf;
        let mut parity = vec![0 as Gf27; r];
        for m in 0..r {
            let at_root = poly_eval(gf, data, gf.pow_alpha((m + 1) as i32));
            let target = gf.mul(sub(0, at_root), self.parity_scale[m]);
            if target == 0 {
                continue;
            }
            for (j, &basis) in self.parity_basis[m].iter().enumerate() {
                parity[j] = add(parity[j], gf.mul(basis, target));
            }
        }
        let mut out = Vec::with_capacity(n);
        out.extend_from_slice(data);
        out.extend_from_slice(&parity);
        Ok(out)
    }

    /// Decode one length-`n` block, correcting up to `t` symbol errors.
    ///
    /// The input is never mutated; corrections happen on a local copy.
    ///
    /// # Errors
    ///
    /// Returns [`RsError::WrongLength`] for a mis-sized block and
    /// [`RsError::Uncorrectable`] when the error pattern exceeds `t`, the
    /// locator degree disagrees with the Chien root count, or a Forney
    /// denominator vanishes.
    pub fn decode_block(&self, block: &[Gf27]) -> Result<DecodedBlock, RsError> {
        let RsParams { n, k } = self.params;
        if block.len() != n {
            return Err(RsError::WrongLength {
                expected: n,
                got: block.len(),
            });
        }
        let r = n - k;
        let t = r / 2;
        let gf = &self.gf;

        // Syndromes S_j = Σ_i c_i · α^((j+1)·i), j = 0..r-1.
        let mut synd = vec![0 as Gf27; r];
        let mut all_zero = true;
        for (j, s) in synd.iter_mut().enumerate() {
            let mut acc: Gf27 = 0;
            for (i, &c) in block.iter().enumerate() {
                let xpow = gf.pow_alpha(((j + 1) * i) as i32);
                acc = add(acc, gf.mul(c, xpow));
            }
            *s = acc;
            if acc != 0 {
                all_zero = false;
            }
        }
        if all_zero {
            return Ok(DecodedBlock {
                data: block[..k].to_vec(),
                corrected: Vec::new(),
            });
        }

        // Berlekamp-Massey for the error locator σ(x).
        let mut sigma: Vec<Gf27> = vec![1];
        let mut prev: Vec<Gf27> = vec![1];
        let mut deg_l: usize = 0;
        let mut m: usize = 1;
        for step in 0..r {
            let mut delta = synd[step];
            for i in 1..=deg_l {
                if i < sigma.len() {
                    delta = add(delta, gf.mul(sigma[i], synd[step - i]));
                }
            }
            if delta == 0 {
                m += 1;
                continue;
            }
            let snapshot = sigma.clone();
            // σ(x) ← σ(x) - δ·x^m·B(x)
            let mut shifted = vec![0 as Gf27; m + prev.len()];
            for (i, &b) in prev.iter().enumerate() {
                shifted[m + i] = gf.mul(delta, b);
            }
            let len = sigma.len().max(shifted.len());
            let mut next = vec![0 as Gf27; len];
            for (i, slot) in next.iter_mut().enumerate() {
                let a = sigma.get(i).copied().unwrap_or(0);
                let b = shifted.get(i).copied().unwrap_or(0);
                *slot = sub(a, b);
            }
            sigma = next;
            if 2 * deg_l <= step {
                let inv_delta = gf.inv(delta);
                prev = snapshot.iter().map(|&c| gf.mul(c, inv_delta)).collect();
                deg_l = step + 1 - deg_l;
                m = 1;
            } else {
                m += 1;
            }
        }

        // Ω(x) = (S(x)·σ(x)) mod x^r.
        let mut omega = vec![0 as Gf27; r + sigma.len()];
        for (i, &si) in synd.iter().enumerate() {
            for (j, &sj) in sigma.iter().enumerate() {
                omega[i + j] = add(omega[i + j], gf.mul(si, sj));
            }
        }
        omega.truncate(r);

        // Chien search: positions where σ(α^{-pos}) = 0.
        let mut err_pos = Vec::with_capacity(t);
        for pos in 0..n {
            let x = gf.pow_alpha(-(pos as i32));
            if poly_eval(gf, &sigma, x) == 0 {
                err_pos.push(pos);
            }
        }
        if err_pos.len() > t {
            return Err(RsError::Uncorrectable {
                reason: "too many error positions",
            });
        }
        if err_pos.len() != deg_l {
            return Err(RsError::Uncorrectable {
                reason: "locator degree does not match its roots",
            });
        }

        // Formal derivative of σ in characteristic 3: coefficient i scales by
        // i mod 3, so i ≡ 0 terms vanish and i ≡ 2 terms scale digit-wise by 2.
        let mut sigma_prime = vec![0 as Gf27; sigma.len().saturating_sub(1).max(1)];
        for (i, &c) in sigma.iter().enumerate().skip(1) {
            sigma_prime[i - 1] = match i % 3 {
                0 => 0,
                1 => c,
                _ => {
                    let [d0, d1, d2] = unpack3(c);
                    pack3((2 * d0) % 3, (2 * d1) % 3, (2 * d2) % 3)
                }
            };
        }

        // Forney magnitudes: mag = -Ω(X) · σ'(X)^{-1} at X = α^{-pos}. The
        // magnitude is the error value itself, so correction subtracts it
        // (characteristic 3: addition is not its own inverse).
        let mut corrected = block.to_vec();
        for &pos in &err_pos {
            let x = gf.pow_alpha(-(pos as i32));
            let num = poly_eval(gf, &omega, x);
            let den = poly_eval(gf, &sigma_prime, x);
            if den == 0 {
                return Err(RsError::Uncorrectable {
                    reason: "zero Forney denominator",
                });
            }
            let mag = gf.mul(sub(0, num), gf.inv(den));
            corrected[pos] = sub(corrected[pos], mag);
        }

        Ok(DecodedBlock {
            data: corrected[..k].to_vec(),
            corrected: err_pos,
        })
    }
}

/// Horner evaluation with coefficients stored low degree first.
fn poly_eval(gf: &Gf27Field, poly: &[Gf27], x: Gf27) -> Gf27 {
    let mut acc: Gf27 = 0;
    for &c in poly.iter().rev() {
        acc = gf.mul(acc, x);
        acc = add(acc, c);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(k: usize) -> RsCodec {
        RsCodec::new(Arc::new(Gf27Field::new()), RsParams::new(26, k))
    }

    #[test]
    fn generator_has_parity_plus_one_coefficients() {
        for k in [24, 22, 20, 18] {
            let rs = codec(k);
            assert_eq!(rs.generator().len(), 26 - k + 1);
            assert_eq!(*rs.generator().last().unwrap(), 1, "monic generator");
        }
    }

    #[test]
    fn generator_roots_are_alpha_powers() {
        let gf = Arc::new(Gf27Field::new());
        let rs = RsCodec::new(gf.clone(), RsParams::new(26, 22));
        for i in 1..=4 {
            let root = gf.pow_alpha(i);
            assert_eq!(poly_eval(&gf, rs.generator(), root), 0, "g(α^{i}) = 0");
        }
        // A non-root stays non-zero.
        assert_ne!(poly_eval(&gf, rs.generator(), gf.pow_alpha(7)), 0);

        // Every encoded block evaluates to zero at the generator roots.
        let data: Vec<Gf27> = (0..22).map(|i| ((i * 3 + 1) % 27) as Gf27).collect();
        let code = rs.encode_block(&data).unwrap();
        for i in 1..=4 {
            assert_eq!(poly_eval(&gf, &code, gf.pow_alpha(i)), 0);
        }
    }

    #[test]
    fn encode_is_systematic() {
        let rs = codec(22);
        let data: Vec<Gf27> = (0..22).map(|i| ((i * 5 + 7) % 27) as Gf27).collect();
        let code = rs.encode_block(&data).unwrap();
        assert_eq!(code.len(), 26);
        assert_eq!(&code[..22], data.as_slice());
    }

    #[test]
    fn encode_rejects_wrong_length() {
        let rs = codec(22);
        let err = rs.encode_block(&[0; 21]).unwrap_err();
        assert_eq!(
            err,
            RsError::WrongLength {
                expected: 22,
                got: 21
            }
        );
    }

    #[test]
    fn clean_block_decodes_without_corrections() {
        let rs = codec(20);
        let data: Vec<Gf27> = (0..20).map(|i| (i % 27) as Gf27).collect();
        let code = rs.encode_block(&data).unwrap();
        let out = rs.decode_block(&code).unwrap();
        assert_eq!(out.data, data);
        assert!(out.corrected.is_empty());
    }

    #[test]
    fn decode_does_not_mutate_input() {
        let rs = codec(22);
        let data = vec![3 as Gf27; 22];
        let mut code = rs.encode_block(&data).unwrap();
        code[0] = add(code[0], 5);
        code[1] = add(code[1], 9);
        code[2] = add(code[2], 11);
        let snapshot = code.clone();
        // Three errors exceed t = 2: decode fails, input stays intact.
        assert!(rs.decode_block(&code).is_err());
        assert_eq!(code, snapshot);
    }
}
