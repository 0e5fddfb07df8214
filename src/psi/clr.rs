// -*- mode: rust; -*-
//
// This file is part of `snowcone`.
// Copyright © 2024 Galois, Inc.
// See LICENSE for licensing information.

//! Implementation of the Chen-Laine-Rindal private set intersection
//! protocol (cf. <https://eprint.iacr.org/2017/299>) in the unlabelled,
//! semi-honest setting.
//!
//! The receiver cuckoo-hashes its set into buckets, batches the buckets
//! into BFV plaintext slots, and sends their encryptions. The sender
//! places each of its elements into every candidate bucket, interpolates
//! a per-bucket polynomial vanishing exactly on that bucket's contents,
//! evaluates all polynomials at once on the encrypted buckets, and masks
//! the results with random non-zero scalars. A bucket whose decryption
//! is zero held an element of the intersection; every other slot decrypts
//! to a uniformly random value.

use crate::{
    hashing::{encode_bucket, CompleteTable, CuckooTable, Role},
    params::PsiParams,
    polynomial::polynomial_from_roots,
    Error,
};
use fhe::bfv::{Ciphertext, Encoding, Plaintext, PublicKey, RelinearizationKey, SecretKey};
use fhe_traits::{FheDecoder, FheDecrypter, FheEncoder, FheEncrypter};
use itertools::Itertools;
use rand::{CryptoRng, Rng, RngCore};

/// Private set intersection receiver.
pub struct Receiver {
    secret_key: SecretKey,
    public_key: PublicKey,
    relin_key: RelinearizationKey,
}

/// Private set intersection sender.
pub struct Sender {
    public_key: PublicKey,
    relin_key: RelinearizationKey,
}

impl Receiver {
    /// Initialize the PSI receiver, generating its BFV key material.
    pub fn new<RNG: CryptoRng + RngCore>(
        params: &PsiParams,
        rng: &mut RNG,
    ) -> Result<Self, Error> {
        let secret_key = SecretKey::random(params.bfv(), rng);
        let public_key = PublicKey::new(&secret_key, rng);
        let relin_key = RelinearizationKey::new(&secret_key, rng)?;
        Ok(Self {
            secret_key,
            public_key,
            relin_key,
        })
    }

    /// The public key the sender encrypts fresh terms under.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The relinearization key the sender applies after each
    /// ciphertext-ciphertext product.
    pub fn relin_key(&self) -> &RelinearizationKey {
        &self.relin_key
    }

    /// A debug observer over this receiver's secret key, for watching
    /// noise growth from the sender side during development.
    pub fn noise_observer(&self) -> NoiseObserver {
        NoiseObserver {
            secret_key: &self.secret_key,
        }
    }

    /// Cuckoo-hashes `inputs` into buckets and returns their
    /// encryptions, one plaintext slot per bucket.
    ///
    /// On success `inputs` is rewritten into bucket order: position `i`
    /// holds the element that landed in bucket `i`, so the indices
    /// returned by [`decrypt_matches`](Self::decrypt_matches) can be
    /// mapped back to elements. Empty buckets hold an unspecified
    /// placeholder the caller must ignore.
    ///
    /// Fails with [`Error::CuckooHashFull`] if hashing overflows; the
    /// caller should regenerate seeds and retry.
    pub fn encrypt_inputs<RNG: CryptoRng + RngCore>(
        &self,
        params: &PsiParams,
        inputs: &mut Vec<u64>,
        rng: &mut RNG,
    ) -> Result<Vec<Ciphertext>, Error> {
        if inputs.len() != params.receiver_size() {
            return Err(Error::InvalidInputSize {
                expected: params.receiver_size(),
                actual: inputs.len(),
            });
        }

        let bucket_count_log = params.bucket_count_log();
        let table = CuckooTable::new(inputs, bucket_count_log, params.seeds(), rng)?;

        // Each ciphertext packs (at most) one bucket per slot; the
        // final chunk may be shorter and is padded by the encoder.
        let slot_count = params.degree();
        let mut result = Vec::with_capacity(params.ciphertext_count());
        for group in table.items.chunks(slot_count) {
            let encoded = group
                .iter()
                .map(|slot| encode_bucket(slot, bucket_count_log, Role::Receiver))
                .collect_vec();
            let pt = Plaintext::try_encode(&encoded, Encoding::simd(), params.bfv())?;
            result.push(self.public_key.try_encrypt(&pt, rng)?);
        }

        // The protocol reports which hash-table locations matched, so
        // the caller needs to know where each of its elements went;
        // rearrange the input vector into bucket order.
        inputs.clear();
        inputs.extend(
            table
                .items
                .iter()
                .map(|slot| slot.as_ref().map_or(0, |item| item.entry)),
        );

        Ok(result)
    }

    /// Decrypts the sender's reply and returns the bucket indices that
    /// matched. An empty result is a legitimate outcome.
    pub fn decrypt_matches(
        &self,
        params: &PsiParams,
        encrypted_matches: &[Ciphertext],
    ) -> Result<Vec<usize>, Error> {
        let expected = params.ciphertext_count();
        if encrypted_matches.len() != expected {
            return Err(Error::CiphertextCountMismatch {
                expected,
                actual: encrypted_matches.len(),
            });
        }

        let slot_count = params.degree();
        let bucket_count = params.bucket_count();

        let mut result = Vec::new();
        for (i, ct) in encrypted_matches.iter().enumerate() {
            let pt = self.secret_key.try_decrypt(ct)?;
            let values = Vec::<u64>::try_decode(&pt, Encoding::simd())?;
            for (j, &value) in values.iter().enumerate() {
                // Slots at or past the bucket count are only encoder
                // padding, never matches.
                if value == 0 && slot_count * i + j < bucket_count {
                    result.push(slot_count * i + j);
                }
            }
        }
        Ok(result)
    }
}

impl Sender {
    /// Initialize the PSI sender with the receiver's key material.
    pub fn new(public_key: PublicKey, relin_key: RelinearizationKey) -> Self {
        Self {
            public_key,
            relin_key,
        }
    }

    /// Evaluates the per-bucket membership polynomials on the
    /// receiver's encrypted buckets and returns the masked results, one
    /// reply ciphertext per received ciphertext.
    ///
    /// `rng` drives both the sender's fresh encryptions and the random
    /// masks, and must be cryptographically secure: a receiver that can
    /// predict the masks learns more than the intersection.
    ///
    /// Fails with [`Error::CompleteHashFull`] if a bucket overflows;
    /// the caller should retry with fresh seeds or a larger capacity.
    pub fn compute_matches<RNG: CryptoRng + RngCore>(
        &self,
        params: &PsiParams,
        inputs: &[u64],
        receiver_inputs: &[Ciphertext],
        rng: &mut RNG,
        observer: Option<&NoiseObserver<'_>>,
    ) -> Result<Vec<Ciphertext>, Error> {
        if inputs.len() != params.sender_size() {
            return Err(Error::InvalidInputSize {
                expected: params.sender_size(),
                actual: inputs.len(),
            });
        }
        let ciphertext_count = params.ciphertext_count();
        if receiver_inputs.len() != ciphertext_count {
            return Err(Error::CiphertextCountMismatch {
                expected: ciphertext_count,
                actual: receiver_inputs.len(),
            });
        }

        let bucket_count_log = params.bucket_count_log();
        let capacity = params.sender_bucket_capacity();
        let table = CompleteTable::new(inputs, bucket_count_log, capacity, params.seeds())?;

        let slot_count = params.degree();
        let plain_modulus = params.plain_modulus();

        // For each bucket, the coefficients of
        // f(x) = prod_{y in bucket} (x - y)
        // over the encoded bucket contents.
        let f_coeffs = (0..params.bucket_count())
            .map(|b| {
                let roots = table
                    .bucket(b)
                    .iter()
                    .map(|slot| encode_bucket(slot, bucket_count_log, Role::Sender))
                    .collect_vec();
                polynomial_from_roots(&roots, plain_modulus)
            })
            .collect_vec();

        let mut result = Vec::with_capacity(ciphertext_count);
        for (i, group) in f_coeffs.chunks(slot_count).enumerate() {
            log::debug!("computing matches for receiver batch #{}", i);

            // The constant terms have no ciphertext factor, so they
            // enter the running sum encrypted from scratch.
            let constant = group.iter().map(|f| f[0]).collect_vec();
            let constant_pt = Plaintext::try_encode(&constant, Encoding::simd(), params.bfv())?;
            let mut acc = self.public_key.try_encrypt(&constant_pt, rng)?;
            if let Some(observer) = observer {
                observer.report("fresh accumulator", &acc);
            }

            // All the powers of this batch of receiver buckets.
            let powers = power_basis(&receiver_inputs[i], capacity, &self.relin_key, params)?;

            for j in 1..=capacity {
                let coeffs = group.iter().map(|f| f[j]).collect_vec();
                // Plain multiplication by an identically-zero plaintext
                // is invalid (and pointless), so those terms are
                // dropped.
                if coeffs.iter().all(|&c| c == 0) {
                    continue;
                }
                let coeff_pt = Plaintext::try_encode(&coeffs, Encoding::simd(), params.bfv())?;
                let term = &powers[j] * &coeff_pt;
                acc += &term;
                if let Some(observer) = observer {
                    observer.report_term(j, &acc);
                }
            }

            // Mask every slot with a uniformly random non-zero scalar:
            // zeros survive, everything else becomes uniformly random,
            // hiding the polynomial values from the receiver.
            let mask = (0..slot_count)
                .map(|_| rng.random_range(1..plain_modulus))
                .collect_vec();
            let mask_pt = Plaintext::try_encode(&mask, Encoding::simd(), params.bfv())?;
            result.push(&acc * &mask_pt);
        }

        Ok(result)
    }
}

/// Computes `powers[j] = base^j` for `j` in `[1, count]`, reusing lower
/// powers: even exponents square `powers[j/2]`, odd exponents multiply
/// `powers[j-1]` by the base. Every ciphertext-ciphertext product is
/// relinearized straight away to keep ciphertexts at two components.
///
/// `powers[0]` is a placeholder and must never be used.
fn power_basis(
    base: &Ciphertext,
    count: usize,
    relin_key: &RelinearizationKey,
    params: &PsiParams,
) -> Result<Vec<Ciphertext>, Error> {
    let mut powers = Vec::with_capacity(count + 1);
    powers.push(Ciphertext::zero(params.bfv()));
    powers.push(base.clone());
    for j in 2..=count {
        let mut power = if j % 2 == 0 {
            &powers[j / 2] * &powers[j / 2]
        } else {
            &powers[j - 1] * &powers[1]
        };
        relin_key.relinearizes(&mut power)?;
        powers.push(power);
    }
    Ok(powers)
}

/// Debug-only window into the sender's homomorphic computation.
///
/// The observer borrows the receiver's secret key so per-term noise can
/// be watched while tuning parameters; readings go to `log::debug!` and
/// are never consulted by the protocol itself. Production senders pass
/// `None` (they never hold the secret key).
pub struct NoiseObserver<'a> {
    secret_key: &'a SecretKey,
}

impl NoiseObserver<'_> {
    fn report(&self, label: &str, ct: &Ciphertext) {
        match unsafe { self.secret_key.measure_noise(ct) } {
            Ok(noise) => log::debug!("{}: noise is {} bits", label, noise),
            Err(e) => log::debug!("{}: noise unavailable ({})", label, e),
        }
    }

    fn report_term(&self, term: usize, ct: &Ciphertext) {
        match unsafe { self.secret_key.measure_noise(ct) } {
            Ok(noise) => log::debug!("after term {}: noise is {} bits", term, noise),
            Err(e) => log::debug!("after term {}: noise unavailable ({})", term, e),
        }
    }
}
