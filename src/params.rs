// -*- mode: rust; -*-
//
// This file is part of `snowcone`.
// Copyright © 2024 Galois, Inc.
// See LICENSE for licensing information.

//! Public protocol parameters shared by the receiver and the sender.

use crate::{hashing::NHASHES, Error};
use fhe::bfv::{BfvParameters, BfvParametersBuilder};
use rand::{CryptoRng, RngCore};
use std::sync::Arc;

// The reference configuration: a large-ish ring with a plaintext
// modulus of 2^16 + 1, which supports batching at any degree up to
// 2^15.
const DEFAULT_DEGREE: usize = 16384;
const DEFAULT_PLAIN_MODULUS: u64 = 65537;
const DEFAULT_MODULI_SIZES: &[usize] = &[50, 50, 50, 50, 50, 50, 50, 50];

/// Public parameters for one protocol run.
///
/// Both parties must construct identical parameters (set sizes, input
/// bit-width, BFV configuration, and hash seeds); any mismatch is a
/// protocol violation.
#[derive(Clone)]
pub struct PsiParams {
    receiver_size: usize,
    sender_size: usize,
    input_bits: usize,
    plain_modulus: u64,
    par: Arc<BfvParameters>,
    seeds: Vec<u64>,
}

impl PsiParams {
    /// Creates parameters with the default BFV configuration.
    ///
    /// Inputs are non-negative integers of at most `input_bits` bits;
    /// anything wider must be hashed down externally.
    pub fn new(
        receiver_size: usize,
        sender_size: usize,
        input_bits: usize,
    ) -> Result<PsiParams, Error> {
        PsiParams::with_bfv(
            receiver_size,
            sender_size,
            input_bits,
            DEFAULT_DEGREE,
            DEFAULT_PLAIN_MODULUS,
            DEFAULT_MODULI_SIZES,
        )
    }

    /// Creates parameters with a caller-supplied BFV configuration.
    ///
    /// The plaintext modulus must be a prime equal to 1 modulo twice
    /// the degree (the batching precondition) and large enough to hold
    /// every encoded bucket value, i.e. a little over
    /// `2^(input_bits - bucket_count_log + 2)`.
    pub fn with_bfv(
        receiver_size: usize,
        sender_size: usize,
        input_bits: usize,
        degree: usize,
        plain_modulus: u64,
        moduli_sizes: &[usize],
    ) -> Result<PsiParams, Error> {
        if receiver_size == 0 || sender_size == 0 {
            return Err(Error::InvalidParameters(
                "set sizes must be non-zero".to_string(),
            ));
        }
        if input_bits == 0 || input_bits > 64 {
            return Err(Error::InvalidParameters(
                "input bit-width must be between 1 and 64".to_string(),
            ));
        }
        if plain_modulus % (2 * degree as u64) != 1 {
            return Err(Error::InvalidParameters(format!(
                "batching requires plain_modulus = 1 mod {}",
                2 * degree
            )));
        }

        let bucket_count_log = bucket_count_log_for(receiver_size);
        let max_encoded: u128 = if input_bits > bucket_count_log {
            ((((1u128 << input_bits) - 1) >> bucket_count_log) << 2) | 3
        } else {
            (1 << 2) | 3
        };
        if max_encoded >= plain_modulus as u128 {
            return Err(Error::InvalidParameters(format!(
                "plain_modulus {} cannot hold encoded buckets (need more than {})",
                plain_modulus, max_encoded
            )));
        }

        let par = BfvParametersBuilder::new()
            .set_degree(degree)
            .set_plaintext_modulus(plain_modulus)
            .set_moduli_sizes(moduli_sizes)
            .build()?;

        Ok(PsiParams {
            receiver_size,
            sender_size,
            input_bits,
            plain_modulus,
            par: Arc::new(par),
            seeds: Vec::new(),
        })
    }

    /// Draws fresh seeds for the hash functions from `rng`. The
    /// receiver typically does this and then shares the seeds with the
    /// sender.
    pub fn generate_seeds<RNG: CryptoRng + RngCore>(&mut self, rng: &mut RNG) {
        self.seeds = (0..NHASHES).map(|_| rng.next_u64()).collect();
    }

    /// Installs seeds agreed out-of-band. The sender must use exactly
    /// the receiver's seeds.
    pub fn set_seeds(&mut self, seeds: Vec<u64>) -> Result<(), Error> {
        if seeds.len() != NHASHES {
            return Err(Error::InvalidSeedCount {
                expected: NHASHES,
                actual: seeds.len(),
            });
        }
        self.seeds = seeds;
        Ok(())
    }

    /// The current hash seeds. Empty until generated or set.
    pub fn seeds(&self) -> &[u64] {
        &self.seeds
    }

    /// The number of hash functions used by both hashing algorithms.
    pub fn hash_functions(&self) -> usize {
        NHASHES
    }

    /// The receiver's set size.
    pub fn receiver_size(&self) -> usize {
        self.receiver_size
    }

    /// The sender's set size.
    pub fn sender_size(&self) -> usize {
        self.sender_size
    }

    /// The maximum bit-width of the parties' inputs.
    pub fn input_bits(&self) -> usize {
        self.input_bits
    }

    /// Log2 of the bucket count: a power of two a little bigger than
    /// the receiver's set, giving between 2x and 4x as many buckets as
    /// inputs.
    pub fn bucket_count_log(&self) -> usize {
        bucket_count_log_for(self.receiver_size)
    }

    /// The number of buckets on each side of the protocol.
    pub fn bucket_count(&self) -> usize {
        1 << self.bucket_count_log()
    }

    /// The per-bucket capacity of the sender's table.
    ///
    /// TODO: derive this from the target hashing-failure probability;
    /// see Table 1 in [CLR17].
    pub fn sender_bucket_capacity(&self) -> usize {
        10
    }

    /// The number of ciphertexts each party transmits, packing one
    /// bucket per plaintext slot.
    pub fn ciphertext_count(&self) -> usize {
        let slot_count = self.degree();
        (self.bucket_count() + slot_count - 1) / slot_count
    }

    /// The BFV polynomial degree, which is also the number of plaintext
    /// slots per ciphertext.
    pub fn degree(&self) -> usize {
        self.par.degree()
    }

    /// The BFV plaintext modulus.
    pub fn plain_modulus(&self) -> u64 {
        self.plain_modulus
    }

    /// The underlying BFV context.
    pub fn bfv(&self) -> &Arc<BfvParameters> {
        &self.par
    }
}

fn bucket_count_log_for(receiver_size: usize) -> usize {
    let mut log = 0;
    while (1usize << log) < receiver_size {
        log += 1;
    }
    log + 1
}
