// Riffle
// Copyright (c) 2024 The Project Riffle Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! # Project Riffle
//!
//! Riffle is a pure Rust library for streaming decoded audio samples out of FLAC streams, and
//! streaming samples into 16-bit PCM WAVE files.
//!
//! # Support
//!
//! | Format | Direction | Feature Flag | Default |
//! |--------|-----------|--------------|---------|
//! | FLAC   | Decode    | `flac`       | Yes     |
//! | Wave   | Encode    | `wav`        | Yes     |
//!
//! # Usage
//!
//! 1.  Instantiate a [`Registry`][core::probe::Registry] and register the formats of interest, or
//!     use [`default::registry`] to get a registry with all enabled formats pre-registered. There
//!     is no global registry; the value is owned by the caller.
//! 2.  Open a [`MediaSource`][core::io::MediaSource] (e.g., a `std::fs::File`) and pass it to
//!     [`open`][core::probe::Registry::open]. The leading bytes select the decoder.
//! 3.  Read interleaved samples from the [`Decoder`][core::codecs::Decoder] into a
//!     [`SampleBuffer`][core::sample::SampleBuffer] of any length and representation, until
//!     [`EndOfStream`][core::codecs::ReadStatus::EndOfStream] is returned.
//! 4.  To produce a WAVE file, write the samples to a [`WavEncoder`][wav::WavEncoder], or use
//!     [`copy`][core::codecs::copy] to drive a decoder into an encoder. Always
//!     [`close`][core::codecs::Encoder::close] the encoder to finalize the header.

pub mod default {
    //! The `default` module provides convenience functions to assemble a registry with every
    //! format enabled by the `feature` flags in the includer's `Cargo.toml`.

    use riffle_core::probe::Registry;

    /// Registers all the formats selected by the `feature` flags in the includer's `Cargo.toml` on
    /// the provided `Registry`.
    pub fn register_enabled_formats(registry: &mut Registry) {
        #[cfg(feature = "flac")]
        riffle_bundle_flac::register(registry);

        #[cfg(not(feature = "flac"))]
        let _ = registry;
    }

    /// Instantiate a new `Registry` with all enabled formats registered.
    pub fn registry() -> Registry {
        let mut registry = Registry::new();
        register_enabled_formats(&mut registry);
        registry
    }
}

pub use riffle_core as core;

#[cfg(feature = "flac")]
pub use riffle_bundle_flac as flac;

#[cfg(feature = "wav")]
pub use riffle_format_wav as wav;
