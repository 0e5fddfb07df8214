// -*- mode: rust; -*-
//
// This file is part of `snowcone`.
// Copyright © 2024 Galois, Inc.
// See LICENSE for licensing information.

//! Small helpers shared by tests, benchmarks, and examples.

use rand::{CryptoRng, Rng};
use std::collections::HashSet;

/// Generates `n` distinct uniform elements of at most `input_bits`
/// bits.
pub fn rand_input_set<RNG: CryptoRng + Rng>(
    n: usize,
    input_bits: usize,
    rng: &mut RNG,
) -> Vec<u64> {
    let bound = if input_bits >= 64 {
        u64::MAX
    } else {
        (1 << input_bits) - 1
    };
    let mut seen = HashSet::with_capacity(n);
    let mut result = Vec::with_capacity(n);
    while result.len() < n {
        let x = rng.random_range(0..=bound);
        if seen.insert(x) {
            result.push(x);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn elements_are_distinct_and_in_range() {
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let set = rand_input_set(1000, 12, &mut rng);
        assert_eq!(set.len(), 1000);
        assert!(set.iter().all(|&x| x < 1 << 12));
        let unique = set.iter().collect::<HashSet<_>>();
        assert_eq!(unique.len(), set.len());
    }
}
