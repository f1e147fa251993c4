// Riffle
// Copyright (c) 2024 The Project Riffle Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp;
use std::mem;

use riffle_core::codecs::{Decoder, DecoderOptions, ReadOutcome, ReadResult, ReadStatus};
use riffle_core::conv::{self, PcmDepth};
use riffle_core::errors::{invalid_data_error, unsupported_error, Error, Result, TransferError};
use riffle_core::formats::{Frame, FrameSource, StreamConfig};
use riffle_core::io::MediaSource;
use riffle_core::sample::SampleBuffer;

use log::{debug, trace};

use crate::stream::FlacStream;

/// Samples that were decoded, but not yet delivered to the caller.
enum CarryOver {
    Empty,
    /// A frame that was only partially delivered. `cursor` is the interleaved position of the
    /// first undelivered sample.
    Partial { frame: Frame, cursor: usize },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Reading,
    Ended,
    Failed,
}

/// Interleave the samples of `frame`, starting at interleaved position `cursor`, into `dst` until
/// either is exhausted. Returns the new cursor.
#[inline(always)]
fn interleave<T, F>(frame: &Frame, cursor: usize, dst: &mut [T], f: F) -> usize
where
    F: Fn(i32) -> T,
{
    let count = cmp::min(frame.n_samples() - cursor, dst.len());

    for (i, out) in dst[..count].iter_mut().enumerate() {
        *out = f(frame.interleaved(cursor + i));
    }

    cursor + count
}

/// Copy samples of `frame` into `buf`, starting at `offset`. If the width of `buf` matches the
/// stream's bit depth the samples are copied directly, otherwise they are converted via. the
/// normalized floating point representation.
fn copy_frame(
    frame: &Frame,
    cursor: usize,
    buf: &mut SampleBuffer,
    offset: usize,
    depth: PcmDepth,
    direct: bool,
) -> usize {
    match buf {
        SampleBuffer::Int8(dst) if direct => {
            interleave(frame, cursor, &mut dst[offset..], |s| 0x80i32.wrapping_add(s) as u8)
        }
        SampleBuffer::Int16(dst) if direct => {
            interleave(frame, cursor, &mut dst[offset..], |s| s as i16)
        }
        SampleBuffer::Int32(dst) if direct => interleave(frame, cursor, &mut dst[offset..], |s| s),
        SampleBuffer::Int8(dst) => interleave(frame, cursor, &mut dst[offset..], |s| {
            conv::float_to_u8(depth.to_float(s))
        }),
        SampleBuffer::Int16(dst) => interleave(frame, cursor, &mut dst[offset..], |s| {
            conv::float_to_pcm16(depth.to_float(s))
        }),
        SampleBuffer::Int32(dst) => interleave(frame, cursor, &mut dst[offset..], |s| {
            conv::float_to_i32(depth.to_float(s))
        }),
        SampleBuffer::Float(dst) => {
            interleave(frame, cursor, &mut dst[offset..], |s| depth.to_float(s))
        }
    }
}

/// Streaming FLAC decoder.
///
/// `FlacDecoder` pulls frames from a [`FrameSource`] on demand and delivers their samples,
/// interleaved, into buffers of any length. A frame that does not fit into the caller's buffer is
/// retained and the remainder delivered by the next read. Every sample is delivered exactly once,
/// in order, regardless of the buffer lengths used.
pub struct FlacDecoder<S: FrameSource = FlacStream> {
    source: S,
    config: StreamConfig,
    bits_per_sample: u32,
    carry: CarryOver,
    state: State,
}

impl<S: FrameSource> FlacDecoder<S> {
    /// Instantiate a decoder reading frames from `source`.
    pub fn try_new(source: S) -> Result<Self> {
        let info = *source.stream_info();

        if info.sample_rate == 0 {
            return invalid_data_error("flac: sample rate cannot be 0");
        }

        if info.channels == 0 {
            return invalid_data_error("flac: channel count cannot be 0");
        }

        if info.bits_per_sample == 0 || info.bits_per_sample > 32 {
            return invalid_data_error("flac: bits per sample out of range");
        }

        debug!("flac: {}, {} bits per sample", info.config(), info.bits_per_sample);

        Ok(FlacDecoder {
            source,
            config: info.config(),
            bits_per_sample: info.bits_per_sample,
            carry: CarryOver::Empty,
            state: State::Reading,
        })
    }

    /// The number of significant bits in each decoded sample.
    pub fn bits_per_sample(&self) -> u32 {
        self.bits_per_sample
    }

    /// Get a reference to the frame source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Unwrap the decoder, returning the frame source. Any carried-over samples are lost.
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl FlacDecoder<FlacStream> {
    /// Open the FLAC stream in `source`.
    pub fn try_open(source: Box<dyn MediaSource>, options: &DecoderOptions) -> Result<Self> {
        FlacDecoder::try_new(FlacStream::try_new(source, options)?)
    }

    /// Decoder factory for a [`Registry`](riffle_core::probe::Registry).
    pub fn try_registry_new(
        source: Box<dyn MediaSource>,
        options: &DecoderOptions,
    ) -> Result<Box<dyn Decoder>> {
        Ok(Box::new(FlacDecoder::try_open(source, options)?))
    }
}

impl<S: FrameSource> Decoder for FlacDecoder<S> {
    fn config(&self) -> StreamConfig {
        self.config
    }

    fn read(&mut self, buf: &mut SampleBuffer) -> ReadResult {
        match self.state {
            State::Reading => (),
            State::Ended => return Ok(ReadOutcome::new(0, ReadStatus::EndOfStream)),
            State::Failed => {
                return Err(TransferError::new(
                    0,
                    Error::InvalidState("flac: decoder failed previously"),
                ))
            }
        }

        // Checked before any state is touched so that an unsupported request has no effect.
        let depth = PcmDepth::try_from_bits(self.bits_per_sample)
            .map_err(|err| TransferError::new(0, err))?;

        let direct = buf.format().bits_per_sample() == Some(depth.bits());

        let len = buf.len();
        let mut n = 0;

        // Drain the frame carried over from the previous read.
        if let CarryOver::Partial { frame, cursor } = mem::replace(&mut self.carry, CarryOver::Empty)
        {
            let next = copy_frame(&frame, cursor, buf, 0, depth, direct);

            n = next - cursor;

            if next < frame.n_samples() {
                self.carry = CarryOver::Partial { frame, cursor: next };
                return Ok(ReadOutcome::new(n, ReadStatus::Ok));
            }
        }

        while n < len {
            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    debug!("flac: end of stream");
                    self.state = State::Ended;
                    return Ok(ReadOutcome::new(n, ReadStatus::EndOfStream));
                }
                Err(err) => {
                    self.state = State::Failed;
                    return Err(TransferError::new(n, err));
                }
            };

            if frame.channels() != self.config.channels {
                self.state = State::Failed;
                return Err(TransferError::new(
                    n,
                    Error::InvalidData("flac: frame channel count differs from the stream"),
                ));
            }

            let next = copy_frame(&frame, 0, buf, n, depth, direct);

            n += next;

            if next < frame.n_samples() {
                trace!("flac: carrying over {} samples", frame.n_samples() - next);
                self.carry = CarryOver::Partial { frame, cursor: next };
            }
        }

        Ok(ReadOutcome::new(n, ReadStatus::Ok))
    }

    fn seek(&mut self, _: u64) -> Result<()> {
        unsupported_error("flac: seeking is not supported")
    }
}
