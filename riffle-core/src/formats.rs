// Riffle
// Copyright (c) 2024 The Project Riffle Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `formats` module defines the stream description and decoded frame types, and the
//! `FrameSource` trait implemented by codec bitstream parsers.

use std::fmt;

use crate::errors::{invalid_data_error, Result};

/// The configuration of an interleaved audio stream. Immutable for the lifetime of a session.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StreamConfig {
    /// The sample rate in Hz.
    pub sample_rate: u32,
    /// The number of channels. Determines the interleaving width.
    pub channels: usize,
}

impl StreamConfig {
    pub fn new(sample_rate: u32, channels: usize) -> Self {
        StreamConfig { sample_rate, channels }
    }
}

impl fmt::Display for StreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz, {} channel(s)", self.sample_rate, self.channels)
    }
}

/// Stream information reported by a `FrameSource` as soon as it is opened.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StreamInfo {
    /// The sample rate in Hz.
    pub sample_rate: u32,
    /// The number of channels.
    pub channels: usize,
    /// The number of significant bits in each decoded sample.
    pub bits_per_sample: u32,
}

impl StreamInfo {
    /// Get the interleaved stream configuration.
    pub fn config(&self) -> StreamConfig {
        StreamConfig::new(self.sample_rate, self.channels)
    }
}

/// A `Frame` is one decode unit: `block_size` samples for each channel, stored per channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    block_size: usize,
    subframes: Vec<Vec<i32>>,
}

impl Frame {
    /// Instantiate a frame from one subframe per channel. Every subframe must have the same
    /// length, and there must be at least one subframe.
    pub fn new(subframes: Vec<Vec<i32>>) -> Result<Frame> {
        let block_size = match subframes.first() {
            Some(first) => first.len(),
            None => return invalid_data_error("frame has no subframes"),
        };

        if subframes.iter().any(|subframe| subframe.len() != block_size) {
            return invalid_data_error("frame subframes differ in length");
        }

        Ok(Frame { block_size, subframes })
    }

    /// The number of samples per channel.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// The number of channels.
    pub fn channels(&self) -> usize {
        self.subframes.len()
    }

    /// The total number of samples across all channels.
    pub fn n_samples(&self) -> usize {
        self.block_size * self.subframes.len()
    }

    /// Get the subframe (the samples) of channel `ch`.
    pub fn subframe(&self, ch: usize) -> &[i32] {
        &self.subframes[ch]
    }

    /// Get the sample at position `pos` in interleaved order.
    #[inline(always)]
    pub fn interleaved(&self, pos: usize) -> i32 {
        let n_channels = self.subframes.len();
        self.subframes[pos % n_channels][pos / n_channels]
    }
}

/// A `FrameSource` yields successive decoded frames of a stream.
///
/// This is the boundary to a codec's bitstream parser. The parser itself is a black box: it only
/// needs to report the stream information up-front, and then produce frames on demand.
pub trait FrameSource {
    /// Get the stream information. Available immediately after the source is opened, before any
    /// frame is parsed.
    fn stream_info(&self) -> &StreamInfo;

    /// Get the next frame, or `None` at the end of the stream. After `None` is returned, all
    /// further calls should also return `None`.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn stream_info(&self) -> &StreamInfo {
        (**self).stream_info()
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        (**self).next_frame()
    }
}
