// Riffle
// Copyright (c) 2024 The Project Riffle Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! A streaming FLAC sample decoder.
//!
//! [`FlacDecoder`] adapts frame-at-a-time FLAC decoding to caller supplied buffers of any length
//! and any of the supported sample representations.

mod decoder;
mod stream;

pub use decoder::FlacDecoder;
pub use stream::FlacStream;

use riffle_core::probe::Registry;

/// The name FLAC is registered under.
pub const FLAC_FORMAT_NAME: &str = "flac";

/// The stream marker every native FLAC stream starts with.
pub const FLAC_MAGIC: &[u8] = b"fLaC";

/// Register the FLAC decoder with `registry`.
pub fn register(registry: &mut Registry) {
    registry.register(FLAC_FORMAT_NAME, FLAC_MAGIC, FlacDecoder::<FlacStream>::try_registry_new);
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use riffle_core::errors::Error;
    use riffle_core::probe::Registry;

    #[test]
    fn verify_registry_rejects_garbage_after_magic() {
        let mut registry = Registry::new();
        super::register(&mut registry);

        let source = Box::new(Cursor::new(b"fLaC\x00\x00\x00\x22garbage".to_vec()));

        match registry.open(source, &Default::default()) {
            Err(Error::InvalidData(_)) => (),
            Err(err) => panic!("unexpected error {:?}", err),
            Ok(probed) => panic!("unexpected decoder for {}", probed.name),
        }
    }
}
