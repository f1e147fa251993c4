// Riffle
// Copyright (c) 2024 The Project Riffle Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `sample` module defines the sample container types that decoders read into and encoders
//! write from.
//!
//! A container is one of a small, closed set of representations. Code that needs a fast path for
//! a particular representation matches on the variant once per call, rather than once per sample.

use std::ops::Range;

use crate::conv;

/// `SampleFormat` describes the data encoding of the samples in a container.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SampleFormat {
    /// 8-bit PCM, stored unsigned with a 0x80 offset.
    Int8,
    /// Signed 16-bit PCM.
    Int16,
    /// Signed 32-bit PCM.
    Int32,
    /// Normalized double precision floating point in the range [-1.0, 1.0].
    Float,
}

impl SampleFormat {
    /// The width of the integer representation in bits, or `None` for floating point.
    pub fn bits_per_sample(self) -> Option<u32> {
        match self {
            SampleFormat::Int8 => Some(8),
            SampleFormat::Int16 => Some(16),
            SampleFormat::Int32 => Some(32),
            SampleFormat::Float => None,
        }
    }
}

/// An owned, fixed length, run of interleaved audio samples.
#[derive(Clone, Debug, PartialEq)]
pub enum SampleBuffer {
    Int8(Vec<u8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Float(Vec<f64>),
}

/// A borrowed, read-only, view of a run of interleaved audio samples.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SampleSlice<'a> {
    Int8(&'a [u8]),
    Int16(&'a [i16]),
    Int32(&'a [i32]),
    Float(&'a [f64]),
}

macro_rules! impl_sample_func {
    ($enum:ident, $own:expr, $buf:ident, $expr:expr) => {
        match $own {
            $enum::Int8($buf) => $expr,
            $enum::Int16($buf) => $expr,
            $enum::Int32($buf) => $expr,
            $enum::Float($buf) => $expr,
        }
    };
}

impl SampleBuffer {
    /// Instantiate a buffer of `len` silent samples.
    pub fn new(format: SampleFormat, len: usize) -> Self {
        match format {
            SampleFormat::Int8 => SampleBuffer::Int8(vec![0x80; len]),
            SampleFormat::Int16 => SampleBuffer::Int16(vec![0; len]),
            SampleFormat::Int32 => SampleBuffer::Int32(vec![0; len]),
            SampleFormat::Float => SampleBuffer::Float(vec![0.0; len]),
        }
    }

    /// Get the sample format.
    pub fn format(&self) -> SampleFormat {
        self.as_slice().format()
    }

    /// Get the capacity of the buffer in samples.
    pub fn len(&self) -> usize {
        impl_sample_func!(SampleBuffer, self, buf, buf.len())
    }

    /// Returns `true` if the buffer cannot hold any samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the sample at index `idx` as a normalized floating point sample.
    ///
    /// Panics if `idx` is out-of-bounds.
    pub fn get_float(&self, idx: usize) -> f64 {
        self.as_slice().get_float(idx)
    }

    /// Set the sample at index `idx` from a normalized floating point sample. The sample is
    /// quantized, and clamped, to the buffer's representation.
    ///
    /// Panics if `idx` is out-of-bounds.
    pub fn set_float(&mut self, idx: usize, sample: f64) {
        match self {
            SampleBuffer::Int8(buf) => buf[idx] = conv::float_to_u8(sample),
            SampleBuffer::Int16(buf) => buf[idx] = conv::float_to_pcm16(sample),
            SampleBuffer::Int32(buf) => buf[idx] = conv::float_to_i32(sample),
            SampleBuffer::Float(buf) => buf[idx] = sample,
        }
    }

    /// Get a view of the entire buffer.
    pub fn as_slice(&self) -> SampleSlice<'_> {
        match self {
            SampleBuffer::Int8(buf) => SampleSlice::Int8(buf),
            SampleBuffer::Int16(buf) => SampleSlice::Int16(buf),
            SampleBuffer::Int32(buf) => SampleSlice::Int32(buf),
            SampleBuffer::Float(buf) => SampleSlice::Float(buf),
        }
    }

    /// Get a view of a range of the buffer.
    ///
    /// Panics if the range is out-of-bounds.
    pub fn slice(&self, range: Range<usize>) -> SampleSlice<'_> {
        self.as_slice().slice(range)
    }
}

impl<'a> SampleSlice<'a> {
    /// Get the sample format.
    pub fn format(&self) -> SampleFormat {
        match self {
            SampleSlice::Int8(_) => SampleFormat::Int8,
            SampleSlice::Int16(_) => SampleFormat::Int16,
            SampleSlice::Int32(_) => SampleFormat::Int32,
            SampleSlice::Float(_) => SampleFormat::Float,
        }
    }

    /// Get the number of samples in the view.
    pub fn len(&self) -> usize {
        impl_sample_func!(SampleSlice, self, buf, buf.len())
    }

    /// Returns `true` if the view contains no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the sample at index `idx` as a normalized floating point sample.
    ///
    /// Panics if `idx` is out-of-bounds.
    pub fn get_float(&self, idx: usize) -> f64 {
        match self {
            SampleSlice::Int8(buf) => conv::u8_to_float(buf[idx]),
            SampleSlice::Int16(buf) => conv::i16_to_float(buf[idx]),
            SampleSlice::Int32(buf) => conv::i32_to_float(buf[idx]),
            SampleSlice::Float(buf) => buf[idx],
        }
    }

    /// Get a narrower view.
    ///
    /// Panics if the range is out-of-bounds.
    pub fn slice(&self, range: Range<usize>) -> SampleSlice<'a> {
        match *self {
            SampleSlice::Int8(buf) => SampleSlice::Int8(&buf[range]),
            SampleSlice::Int16(buf) => SampleSlice::Int16(&buf[range]),
            SampleSlice::Int32(buf) => SampleSlice::Int32(&buf[range]),
            SampleSlice::Float(buf) => SampleSlice::Float(&buf[range]),
        }
    }
}

impl<'a> From<&'a [u8]> for SampleSlice<'a> {
    fn from(buf: &'a [u8]) -> Self {
        SampleSlice::Int8(buf)
    }
}

impl<'a> From<&'a [i16]> for SampleSlice<'a> {
    fn from(buf: &'a [i16]) -> Self {
        SampleSlice::Int16(buf)
    }
}

impl<'a> From<&'a [i32]> for SampleSlice<'a> {
    fn from(buf: &'a [i32]) -> Self {
        SampleSlice::Int32(buf)
    }
}

impl<'a> From<&'a [f64]> for SampleSlice<'a> {
    fn from(buf: &'a [f64]) -> Self {
        SampleSlice::Float(buf)
    }
}

impl<'a> From<&'a SampleBuffer> for SampleSlice<'a> {
    fn from(buf: &'a SampleBuffer) -> Self {
        buf.as_slice()
    }
}
