// -*- mode: rust; -*-
//
// This file is part of `snowcone`.
// Copyright © 2024 Galois, Inc.
// See LICENSE for licensing information.

//! Bucket hashing shared by both parties: cuckoo hashing on the
//! receiver side (one bucket per input) and complete hashing on the
//! sender side (every candidate bucket per input), plus the encoding of
//! bucket slots into plaintext-field integers.

use crate::Error;
use rand::{Rng, RngCore};
use siphasher::sip::SipHasher24;
use std::hash::Hasher;

/// Number of hash functions. Fixed across both parties.
pub(crate) const NHASHES: usize = 3;

/// How many displacements to tolerate before declaring the cuckoo table
/// full.
const MAX_DISPLACEMENTS: usize = 500;

/// An occupied bucket slot.
#[derive(Clone, Debug)]
pub(crate) struct BucketItem {
    // The actual input value.
    pub(crate) entry: u64,
    // The input index associated with the entry.
    pub(crate) input_index: usize,
    // Which of the `NHASHES` hash functions placed the entry here.
    pub(crate) hash_index: usize,
}

/// Which party a table (and hence its dummy encoding) belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Role {
    Receiver,
    Sender,
}

/// Outputs the bucket for `entry` under the hash function keyed by
/// `seed`.
///
/// The construction is permutation-based: the bucket is the low
/// `bucket_count_log` bits of the entry, masked by a SipHash PRF of the
/// remaining high bits. For a fixed high part this permutes the low
/// bits, so two distinct entries sharing their high bits can never
/// collide under the same hash function, which is exactly what lets
/// the encoder drop the low bits entirely.
pub(crate) fn bin(entry: u64, seed: u64, bucket_count_log: usize) -> usize {
    let mask = (1u64 << bucket_count_log) - 1;
    let mut hasher = SipHasher24::new_with_keys(seed, 0);
    hasher.write_u64(entry >> bucket_count_log);
    ((entry & mask) ^ (hasher.finish() & mask)) as usize
}

/// Encodes one bucket slot into the plaintext field.
///
/// Occupied slots carry the entry stripped of its low
/// `bucket_count_log` bits (those are already fixed by the bucket
/// position) together with a two-bit tag holding the hash-function
/// index. Empty slots use the reserved tag 3, with distinct payloads
/// per role so a receiver dummy never matches a sender dummy.
pub(crate) fn encode_bucket(
    slot: &Option<BucketItem>,
    bucket_count_log: usize,
    role: Role,
) -> u64 {
    match slot {
        Some(item) => {
            debug_assert!(item.hash_index < NHASHES);
            ((item.entry >> bucket_count_log) << 2) | item.hash_index as u64
        }
        None => {
            let payload = match role {
                Role::Receiver => 1,
                Role::Sender => 0,
            };
            (payload << 2) | 3
        }
    }
}

/// The receiver's cuckoo hash table: `2^bucket_count_log` bins, each
/// holding at most one item.
#[derive(Clone)]
pub(crate) struct CuckooTable {
    pub(crate) items: Vec<Option<BucketItem>>,
    pub(crate) nbins: usize,
}

impl CuckooTable {
    /// Build a new cuckoo hash table over `inputs`. Fails with
    /// [`Error::CuckooHashFull`] if an eviction chain overflows, in
    /// which case the caller should retry with fresh seeds.
    pub(crate) fn new<RNG: RngCore>(
        inputs: &[u64],
        bucket_count_log: usize,
        seeds: &[u64],
        rng: &mut RNG,
    ) -> Result<CuckooTable, Error> {
        if seeds.len() != NHASHES {
            return Err(Error::InvalidSeedCount {
                expected: NHASHES,
                actual: seeds.len(),
            });
        }
        let nbins = 1 << bucket_count_log;
        let mut tbl = CuckooTable {
            items: vec![None; nbins],
            nbins,
        };
        for (j, &input) in inputs.iter().enumerate() {
            tbl.hash(input, j, bucket_count_log, seeds, rng)?;
        }
        Ok(tbl)
    }

    /// Place `entry`, alongside the input index `idx` it corresponds
    /// to, in the table.
    fn hash<RNG: RngCore>(
        &mut self,
        entry: u64,
        idx: usize,
        bucket_count_log: usize,
        seeds: &[u64],
        rng: &mut RNG,
    ) -> Result<(), Error> {
        let mut item = BucketItem {
            entry,
            input_index: idx,
            hash_index: 0,
        };
        for _ in 0..MAX_DISPLACEMENTS {
            // Prefer an empty candidate bucket; otherwise evict the
            // occupant of one chosen uniformly at random.
            let empty = (0..NHASHES)
                .find(|&h| self.items[bin(item.entry, seeds[h], bucket_count_log)].is_none());
            let h = empty.unwrap_or_else(|| rng.random_range(0..NHASHES));
            let i = bin(item.entry, seeds[h], bucket_count_log);
            item.hash_index = h;
            match self.items[i].replace(item) {
                None => return Ok(()),
                // Keep iterating, trying to re-place the evicted item.
                Some(evicted) => item = evicted,
            }
        }
        Err(Error::CuckooHashFull)
    }
}

impl std::fmt::Debug for CuckooTable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for i in 0..self.nbins {
            writeln!(f, "{}: {:?}", i, self.items[i])?;
        }
        Ok(())
    }
}

/// The sender's complete hash table: `2^bucket_count_log` bins of
/// `capacity` slots each, where every input occupies one slot in each
/// of its `NHASHES` candidate bins.
#[derive(Clone)]
pub(crate) struct CompleteTable {
    items: Vec<Option<BucketItem>>,
    pub(crate) nbins: usize,
    pub(crate) capacity: usize,
}

impl CompleteTable {
    /// Build a complete hash table over `inputs`. Fails with
    /// [`Error::CompleteHashFull`] as soon as any bin overflows its
    /// capacity.
    pub(crate) fn new(
        inputs: &[u64],
        bucket_count_log: usize,
        capacity: usize,
        seeds: &[u64],
    ) -> Result<CompleteTable, Error> {
        if seeds.len() != NHASHES {
            return Err(Error::InvalidSeedCount {
                expected: NHASHES,
                actual: seeds.len(),
            });
        }
        let nbins = 1 << bucket_count_log;
        let mut tbl = CompleteTable {
            items: vec![None; nbins * capacity],
            nbins,
            capacity,
        };
        for (j, &input) in inputs.iter().enumerate() {
            for (h, &seed) in seeds.iter().enumerate() {
                let i = bin(input, seed, bucket_count_log);
                tbl.insert(
                    i,
                    BucketItem {
                        entry: input,
                        input_index: j,
                        hash_index: h,
                    },
                )?;
            }
        }
        Ok(tbl)
    }

    fn insert(&mut self, bin: usize, item: BucketItem) -> Result<(), Error> {
        let slots = &mut self.items[bin * self.capacity..(bin + 1) * self.capacity];
        match slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(item);
                Ok(())
            }
            None => Err(Error::CompleteHashFull { bin }),
        }
    }

    /// The `capacity` slots of bucket `bin`.
    pub(crate) fn bucket(&self, bin: usize) -> &[Option<BucketItem>] {
        &self.items[bin * self.capacity..(bin + 1) * self.capacity]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::rand_input_set;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    const BUCKET_COUNT_LOG: usize = 8;
    const SETSIZE: usize = 100;

    fn seeds(rng: &mut ChaCha12Rng) -> Vec<u64> {
        (0..NHASHES).map(|_| rng.next_u64()).collect()
    }

    #[test]
    fn cuckoo_places_every_input_in_a_candidate_bin() {
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let seeds = seeds(&mut rng);
        let inputs = rand_input_set(SETSIZE, 32, &mut rng);
        let tbl = CuckooTable::new(&inputs, BUCKET_COUNT_LOG, &seeds, &mut rng).unwrap();

        let occupied = tbl.items.iter().flatten().count();
        assert_eq!(occupied, SETSIZE);

        for (i, slot) in tbl.items.iter().enumerate() {
            if let Some(item) = slot {
                assert_eq!(inputs[item.input_index], item.entry);
                assert_eq!(bin(item.entry, seeds[item.hash_index], BUCKET_COUNT_LOG), i);
            }
        }
    }

    #[test]
    fn cuckoo_overflow_is_reported() {
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let seeds = seeds(&mut rng);
        let inputs = rand_input_set(10, 32, &mut rng);
        // Ten inputs cannot fit in two one-slot bins.
        let result = CuckooTable::new(&inputs, 1, &seeds, &mut rng);
        assert!(matches!(result, Err(Error::CuckooHashFull)));
    }

    #[test]
    fn complete_hashing_places_every_input_once_per_hash_function() {
        let mut rng = ChaCha12Rng::seed_from_u64(2);
        let seeds = seeds(&mut rng);
        let inputs = rand_input_set(SETSIZE, 32, &mut rng);
        let tbl = CompleteTable::new(&inputs, BUCKET_COUNT_LOG, 10, &seeds).unwrap();

        for (j, &input) in inputs.iter().enumerate() {
            for (h, &seed) in seeds.iter().enumerate() {
                let i = bin(input, seed, BUCKET_COUNT_LOG);
                let found = tbl
                    .bucket(i)
                    .iter()
                    .flatten()
                    .any(|item| item.input_index == j && item.hash_index == h);
                assert!(found, "input {} missing under hash {}", input, h);
            }
        }
    }

    #[test]
    fn complete_hashing_overflow_is_reported() {
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let seeds = seeds(&mut rng);
        let inputs = rand_input_set(20, 32, &mut rng);
        // Sixty placements cannot fit in two three-slot bins.
        let result = CompleteTable::new(&inputs, 1, 3, &seeds);
        assert!(matches!(result, Err(Error::CompleteHashFull { .. })));
    }

    #[test]
    fn seed_count_is_gated() {
        let mut rng = ChaCha12Rng::seed_from_u64(4);
        let result = CuckooTable::new(&[1, 2, 3], BUCKET_COUNT_LOG, &[42], &mut rng);
        assert!(matches!(
            result,
            Err(Error::InvalidSeedCount {
                expected: NHASHES,
                actual: 1
            })
        ));
    }

    #[test]
    fn bin_permutes_the_low_bits() {
        // For a fixed high part, all 2^L low parts must map to distinct
        // bins; this is what makes dropping the low bits in the encoder
        // sound.
        let mut rng = ChaCha12Rng::seed_from_u64(5);
        for &seed in seeds(&mut rng).iter() {
            let high = 0xabcd_u64 << 4;
            let mut bins = (0..16).map(|low| bin(high | low, seed, 4)).collect::<Vec<_>>();
            bins.sort_unstable();
            bins.dedup();
            assert_eq!(bins.len(), 16);
        }
    }

    #[test]
    fn encoding_round_trips() {
        let mut rng = ChaCha12Rng::seed_from_u64(6);
        for _ in 0..100 {
            let entry = rng.next_u64() & 0xffff_ffff;
            let hash_index = rng.random_range(0..NHASHES);
            let slot = Some(BucketItem {
                entry,
                input_index: 0,
                hash_index,
            });
            let encoded = encode_bucket(&slot, BUCKET_COUNT_LOG, Role::Receiver);
            assert_eq!(encoded >> 2, entry >> BUCKET_COUNT_LOG);
            assert_eq!((encoded & 3) as usize, hash_index);
        }
    }

    #[test]
    fn dummies_are_distinct_from_everything() {
        let receiver_dummy = encode_bucket(&None, BUCKET_COUNT_LOG, Role::Receiver);
        let sender_dummy = encode_bucket(&None, BUCKET_COUNT_LOG, Role::Sender);
        assert_ne!(receiver_dummy, sender_dummy);
        // Real encodings always carry a tag below 3.
        assert_eq!(receiver_dummy & 3, 3);
        assert_eq!(sender_dummy & 3, 3);
    }
}
