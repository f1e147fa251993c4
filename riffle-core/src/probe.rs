// Riffle
// Copyright (c) 2024 The Project Riffle Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `probe` module provides a registry of decoders that can be selected by the magic bytes at
//! the start of a media source.
//!
//! The registry is an ordinary value. It is constructed, populated, and passed around explicitly by
//! whoever assembles the application; there is no global registry.

use std::io::{Read, Seek, SeekFrom};

use log::{debug, info};

use crate::codecs::{Decoder, DecoderOptions};
use crate::errors::{invalid_data_error, Result};
use crate::io::MediaSource;

/// `Decoder` factory function. Creates a boxed `Decoder` for a source whose magic matched.
///
/// The source is positioned at the start of the magic. A factory should return an `InvalidData`
/// error if the stream cannot be initialized.
pub type DecoderFactoryFn =
    fn(Box<dyn MediaSource>, &DecoderOptions) -> Result<Box<dyn Decoder>>;

/// Registration details of a decoder for a particular format.
#[derive(Copy, Clone)]
pub struct RegisteredFormat {
    /// A short, human-readable, name for the format.
    pub name: &'static str,
    /// The byte-string the format starts with.
    pub magic: &'static [u8],
    /// Factory function to instantiate the decoder.
    pub factory: DecoderFactoryFn,
}

/// The result of a successful probe.
pub struct Probed {
    /// The name of the detected format.
    pub name: &'static str,
    /// A decoder for the source.
    pub decoder: Box<dyn Decoder>,
}

/// `Registry` maps format magic bytes to decoder factories.
#[derive(Default)]
pub struct Registry {
    formats: Vec<RegisteredFormat>,
}

impl Registry {
    /// Instantiate an empty registry.
    pub fn new() -> Self {
        Registry { formats: Vec::new() }
    }

    /// Register a decoder factory for the format `name`, identified by `magic`.
    ///
    /// If a format with the same name was previously registered, it is replaced.
    pub fn register(&mut self, name: &'static str, magic: &'static [u8], factory: DecoderFactoryFn) {
        let format = RegisteredFormat { name, magic, factory };

        if let Some(existing) = self.formats.iter_mut().find(|f| f.name == name) {
            debug!("replacing registered format: {}", name);
            *existing = format;
        }
        else {
            self.formats.push(format);
        }
    }

    /// Get all registered formats, in registration order.
    pub fn formats(&self) -> &[RegisteredFormat] {
        &self.formats
    }

    /// Get the registered format whose magic prefixes `head`, if any. The first match in
    /// registration order wins.
    pub fn lookup(&self, head: &[u8]) -> Option<&RegisteredFormat> {
        self.formats.iter().find(|f| !f.magic.is_empty() && head.starts_with(f.magic))
    }

    /// Sniff the leading bytes of `source`, and instantiate the decoder of the matching format.
    ///
    /// The source is rewound to its original position before the factory is called. If no
    /// registered magic matches, an `InvalidData` error is returned.
    pub fn open(
        &self,
        mut source: Box<dyn MediaSource>,
        options: &DecoderOptions,
    ) -> Result<Probed> {
        let max_len = self.formats.iter().map(|f| f.magic.len()).max().unwrap_or(0);

        let start = source.stream_position()?;

        let mut head = Vec::with_capacity(max_len);
        (&mut source).take(max_len as u64).read_to_end(&mut head)?;

        source.seek(SeekFrom::Start(start))?;

        let format = match self.lookup(&head) {
            Some(format) => *format,
            None => return invalid_data_error("probe: no registered format matches the stream"),
        };

        info!("found format: {}", format.name);

        let decoder = (format.factory)(source, options)?;

        Ok(Probed { name: format.name, decoder })
    }
}
