// -*- mode: rust; -*-
//
// This file is part of `snowcone`.
// Copyright © 2024 Galois, Inc.
// See LICENSE for licensing information.

//! Monic polynomials over the plaintext prime field, built from their
//! roots.

/// Computes the coefficients of `f(x) = ∏ (x - rᵢ)` over `ℤ_modulus`,
/// in ascending order of degree. The output has exactly
/// `roots.len() + 1` entries and its leading coefficient is 1; repeated
/// roots simply yield repeated factors.
pub(crate) fn polynomial_from_roots(roots: &[u64], modulus: u64) -> Vec<u64> {
    let mut coeffs = vec![0u64; roots.len() + 1];
    coeffs[0] = 1;
    // Multiply by one factor (x - r) at a time, shifting the previous
    // coefficients up by one degree and folding in -r.
    for (n, &root) in roots.iter().enumerate() {
        let neg_root = (modulus - root % modulus) % modulus;
        for k in (1..=n + 1).rev() {
            coeffs[k] = (coeffs[k - 1] + mul_mod(neg_root, coeffs[k], modulus)) % modulus;
        }
        coeffs[0] = mul_mod(neg_root, coeffs[0], modulus);
    }
    coeffs
}

fn mul_mod(a: u64, b: u64, modulus: u64) -> u64 {
    ((a as u128 * b as u128) % modulus as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha12Rng;

    const MODULUS: u64 = 65537;

    fn evaluate(coeffs: &[u64], x: u64, modulus: u64) -> u64 {
        coeffs
            .iter()
            .rev()
            .fold(0, |acc, &c| (mul_mod(acc, x, modulus) + c) % modulus)
    }

    #[test]
    fn vanishes_at_every_root() {
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let roots = (0..10)
            .map(|_| rng.random_range(0..MODULUS))
            .collect::<Vec<u64>>();
        let coeffs = polynomial_from_roots(&roots, MODULUS);
        for root in roots {
            assert_eq!(evaluate(&coeffs, root, MODULUS), 0);
        }
    }

    #[test]
    fn monic_of_full_degree() {
        let roots = [3, 1, 4, 1, 5];
        let coeffs = polynomial_from_roots(&roots, MODULUS);
        assert_eq!(coeffs.len(), roots.len() + 1);
        assert_eq!(*coeffs.last().unwrap(), 1);
    }

    #[test]
    fn nonzero_away_from_roots() {
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let roots = (0..10)
            .map(|_| rng.random_range(0..1000))
            .collect::<Vec<u64>>();
        let coeffs = polynomial_from_roots(&roots, MODULUS);
        // Any point outside the root set should evaluate non-zero.
        for x in 1000..1100 {
            assert_ne!(evaluate(&coeffs, x, MODULUS), 0);
        }
    }

    #[test]
    fn repeated_roots_are_harmless() {
        let coeffs = polynomial_from_roots(&[7, 7, 7], MODULUS);
        // (x - 7)^3 = x^3 - 21x^2 + 147x - 343
        assert_eq!(
            coeffs,
            vec![MODULUS - 343, 147, MODULUS - 21, 1]
        );
    }

    #[test]
    fn empty_root_list_is_the_constant_one() {
        assert_eq!(polynomial_from_roots(&[], MODULUS), vec![1]);
    }
}
