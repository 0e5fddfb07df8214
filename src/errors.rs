// -*- mode: rust; -*-
//
// This file is part of `snowcone`.
// Copyright © 2024 Galois, Inc.
// See LICENSE for licensing information.

/// Errors produced by the private set intersection protocol.
#[derive(Debug)]
pub enum Error {
    /// The cuckoo hash eviction chain overflowed. Retriable with fresh
    /// seeds.
    CuckooHashFull,
    /// A sender-side bucket exceeded its capacity. Retriable with fresh
    /// seeds or a larger capacity.
    CompleteHashFull {
        /// The bucket that overflowed.
        bin: usize,
    },
    /// The number of supplied seeds differs from the number of hash
    /// functions.
    InvalidSeedCount {
        /// Number of seeds required.
        expected: usize,
        /// Number of seeds supplied.
        actual: usize,
    },
    /// An input set's size differs from the agreed protocol parameters.
    InvalidInputSize {
        /// Size fixed by the parameters.
        expected: usize,
        /// Size of the supplied set.
        actual: usize,
    },
    /// A ciphertext batch count differs from the agreed count.
    CiphertextCountMismatch {
        /// Number of batches fixed by the parameters.
        expected: usize,
        /// Number of batches supplied.
        actual: usize,
    },
    /// The provided protocol parameters are inconsistent.
    InvalidParameters(String),
    /// The underlying homomorphic encryption library failed.
    FheError(fhe::Error),
}

impl From<fhe::Error> for Error {
    #[inline]
    fn from(e: fhe::Error) -> Error {
        Error::FheError(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::CuckooHashFull => write!(f, "cuckoo hash error: table is full"),
            Error::CompleteHashFull { bin } => {
                write!(f, "complete hash error: bucket {} is full", bin)
            }
            Error::InvalidSeedCount { expected, actual } => write!(
                f,
                "seed count mismatch: got {} seeds for {} hash functions",
                actual, expected
            ),
            Error::InvalidInputSize { expected, actual } => write!(
                f,
                "input size mismatch: got {} inputs, parameters fix {}",
                actual, expected
            ),
            Error::CiphertextCountMismatch { expected, actual } => write!(
                f,
                "ciphertext count mismatch: got {} batches, parameters fix {}",
                actual, expected
            ),
            Error::InvalidParameters(s) => write!(f, "invalid parameters: {}", s),
            Error::FheError(e) => write!(f, "homomorphic encryption error: {}", e),
        }
    }
}
