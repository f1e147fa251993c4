// Riffle
// Copyright (c) 2024 The Project Riffle Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! A WAVE muxer and streaming 16-bit PCM encoder.
//!
//! The produced file is a canonical 44 byte header followed by the interleaved little-endian
//! payload. The header sizes are only final once the encoder is closed.

pub mod chunks;
mod encoder;
mod writer;

pub use encoder::WavEncoder;
pub use writer::WavWriter;
