// Riffle
// Copyright (c) 2024 The Project Riffle Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `codecs` module defines the streaming `Decoder` and `Encoder` traits, and a generic copy
//! between them.

use std::result;

use log::debug;

use crate::errors::{unsupported_error, Result, TransferError};
use crate::formats::StreamConfig;
use crate::sample::{SampleBuffer, SampleFormat, SampleSlice};

/// `DecoderOptions` is a common set of options that all decoders use.
#[derive(Copy, Clone, Debug, Default)]
pub struct DecoderOptions {
    /// The decoded audio should be verified against any integrity check (e.g., an MD5 signature of
    /// the stream) at the end of the stream. A mismatch is reported as an error.
    ///
    /// Default: `false`.
    pub verify: bool,
}

/// `CopyOptions` tunes the generic [`copy`] between a decoder and an encoder.
#[derive(Copy, Clone, Debug)]
pub struct CopyOptions {
    /// The size of the intermediate buffer in interleaved frames (one sample per channel).
    ///
    /// Default: `4096`.
    pub buffer_frames: usize,
}

impl Default for CopyOptions {
    fn default() -> Self {
        CopyOptions { buffer_frames: 4096 }
    }
}

/// The status of a successful read.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReadStatus {
    /// The buffer was completely filled. More samples may be available.
    Ok,
    /// The stream ended. The samples read by this call, if any, are the last samples of the
    /// stream.
    EndOfStream,
}

/// The outcome of a successful read.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReadOutcome {
    /// The number of samples written into the buffer, starting at index 0.
    pub count: usize,
    pub status: ReadStatus,
}

impl ReadOutcome {
    pub fn new(count: usize, status: ReadStatus) -> Self {
        ReadOutcome { count, status }
    }
}

/// The result of `Decoder::read`. On error, the samples read before the error are still valid.
pub type ReadResult = result::Result<ReadOutcome, TransferError>;

/// The result of `Encoder::write`. On success, all samples were written.
pub type WriteResult = result::Result<usize, TransferError>;

/// A `Decoder` streams interleaved samples from an encoded source into caller supplied buffers.
///
/// A decoder is a single session and requires exclusive access for every call.
pub trait Decoder {
    /// Get the configuration of the decoded stream.
    fn config(&self) -> StreamConfig;

    /// Read as many interleaved samples as fit into `buf`.
    ///
    /// Returns `ReadStatus::Ok` with `count == buf.len()` for a complete fill, or
    /// `ReadStatus::EndOfStream` with a possibly non-zero `count` if the stream ended first.
    fn read(&mut self, buf: &mut SampleBuffer) -> ReadResult;

    /// Seek to the sample (per channel) at `sample`. On failure, the current position is
    /// unchanged.
    fn seek(&mut self, sample: u64) -> Result<()>;
}

/// An `Encoder` streams interleaved samples into an encoded sink.
///
/// An encoder is a single session. `close` must be called exactly once to finalize the sink.
pub trait Encoder {
    /// Write all samples in `buf`, in order.
    ///
    /// Any error is fatal to the session; no further writes may be made.
    fn write(&mut self, buf: SampleSlice<'_>) -> WriteResult;

    /// Finalize the encoded sink.
    fn close(&mut self) -> Result<()>;
}

impl<D: Decoder + ?Sized> Decoder for Box<D> {
    fn config(&self) -> StreamConfig {
        (**self).config()
    }

    fn read(&mut self, buf: &mut SampleBuffer) -> ReadResult {
        (**self).read(buf)
    }

    fn seek(&mut self, sample: u64) -> Result<()> {
        (**self).seek(sample)
    }
}

impl<E: Encoder + ?Sized> Encoder for Box<E> {
    fn write(&mut self, buf: SampleSlice<'_>) -> WriteResult {
        (**self).write(buf)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Copy all samples from `src` to `dst` until the end of `src`, returning the number of samples
/// copied.
///
/// Samples read before a decode error are written to `dst` before the error is returned. `dst` is
/// not closed.
pub fn copy<E, D>(dst: &mut E, src: &mut D, options: &CopyOptions) -> Result<u64>
where
    E: Encoder + ?Sized,
    D: Decoder + ?Sized,
{
    let channels = src.config().channels.max(1);

    let len = match options.buffer_frames.max(1).checked_mul(channels) {
        Some(len) => len,
        None => return unsupported_error("copy: buffer size overflows"),
    };

    let mut buf = SampleBuffer::new(SampleFormat::Float, len);

    let mut total = 0;

    loop {
        let (count, res) = match src.read(&mut buf) {
            Ok(outcome) => (outcome.count, Ok(outcome.status)),
            Err(err) => (err.count, Err(err.error)),
        };

        if count > 0 {
            total += dst.write(buf.slice(0..count))? as u64;
        }

        if res? == ReadStatus::EndOfStream {
            break;
        }
    }

    debug!("copied {} samples", total);

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    /// A decoder producing a ramp of `total` samples, optionally failing after `fail_at` samples.
    struct RampDecoder {
        pos: usize,
        total: usize,
        fail_at: Option<usize>,
    }

    impl Decoder for RampDecoder {
        fn config(&self) -> StreamConfig {
            StreamConfig::new(8000, 2)
        }

        fn read(&mut self, buf: &mut SampleBuffer) -> ReadResult {
            let end = self.fail_at.unwrap_or(self.total).min(self.total);
            let mut n = 0;

            while n < buf.len() && self.pos < end {
                buf.set_float(n, self.pos as f64 / 1024.0);
                self.pos += 1;
                n += 1;
            }

            if n == buf.len() {
                Ok(ReadOutcome::new(n, ReadStatus::Ok))
            }
            else if self.fail_at.is_some() {
                Err(TransferError::new(n, Error::InvalidData("ramp")))
            }
            else {
                Ok(ReadOutcome::new(n, ReadStatus::EndOfStream))
            }
        }

        fn seek(&mut self, _: u64) -> Result<()> {
            unreachable!()
        }
    }

    #[derive(Default)]
    struct CollectEncoder {
        samples: Vec<f64>,
        writes: usize,
    }

    impl Encoder for CollectEncoder {
        fn write(&mut self, buf: SampleSlice<'_>) -> WriteResult {
            self.writes += 1;
            self.samples.extend((0..buf.len()).map(|i| buf.get_float(i)));
            Ok(buf.len())
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn verify_copy_all_samples() {
        let mut src = RampDecoder { pos: 0, total: 21, fail_at: None };
        let mut dst = CollectEncoder::default();

        let n = copy(&mut dst, &mut src, &CopyOptions { buffer_frames: 4 }).unwrap();

        assert_eq!(n, 21);
        assert_eq!(dst.writes, 3);
        assert_eq!(dst.samples, (0..21).map(|i| i as f64 / 1024.0).collect::<Vec<_>>());
    }

    #[test]
    fn verify_copy_writes_samples_read_before_error() {
        let mut src = RampDecoder { pos: 0, total: 100, fail_at: Some(11) };
        let mut dst = CollectEncoder::default();

        let err = copy(&mut dst, &mut src, &CopyOptions { buffer_frames: 4 }).unwrap_err();

        assert!(matches!(err, Error::InvalidData("ramp")));
        assert_eq!(dst.samples.len(), 11);
    }

    #[test]
    fn verify_copy_buffer_size_overflow() {
        let mut src = RampDecoder { pos: 0, total: 8, fail_at: None };
        let mut dst = CollectEncoder::default();

        let err = copy(&mut dst, &mut src, &CopyOptions { buffer_frames: usize::MAX }).unwrap_err();

        assert!(matches!(err, Error::Unsupported(_)));
        assert_eq!(dst.writes, 0);
        assert_eq!(src.pos, 0);
    }

    #[test]
    fn verify_copy_empty_stream() {
        let mut src = RampDecoder { pos: 0, total: 0, fail_at: None };
        let mut dst = CollectEncoder::default();

        assert_eq!(copy(&mut dst, &mut src, &Default::default()).unwrap(), 0);
        assert_eq!(dst.writes, 0);
    }
}
