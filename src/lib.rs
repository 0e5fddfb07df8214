// -*- mode: rust; -*-
//
// This file is part of `snowcone`.
// Copyright © 2024 Galois, Inc.
// See LICENSE for licensing information.

//! Private set intersection from somewhat-homomorphic encryption, after
//! Chen-Laine-Rindal (cf. <https://eprint.iacr.org/2017/299>).
//!
//! A receiver holding a small set and a sender holding a (typically much
//! larger) set jointly compute their intersection; the receiver learns
//! only the intersection and the sender learns nothing. Communication is
//! sublinear in the sender's set size thanks to BFV batching. Security
//! holds in the semi-honest model only.

mod errors;
mod hashing;
mod params;
mod polynomial;
mod psi;
pub mod utils;

pub use crate::{errors::Error, params::PsiParams, psi::*};
