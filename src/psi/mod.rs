// -*- mode: rust; -*-
//
// This file is part of `snowcone`.
// Copyright © 2024 Galois, Inc.
// See LICENSE for licensing information.

pub mod clr;

/// Private set intersection sender.
pub type Sender = clr::Sender;
/// Private set intersection receiver.
pub type Receiver = clr::Receiver;
/// Debug observer for the sender's homomorphic computation.
pub type NoiseObserver<'a> = clr::NoiseObserver<'a>;
