// Riffle
// Copyright (c) 2024 The Project Riffle Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io::{Seek, Write};

use riffle_core::codecs::{Encoder, WriteResult};
use riffle_core::conv;
use riffle_core::errors::{invalid_state_error, Error, Result, TransferError};
use riffle_core::formats::StreamConfig;
use riffle_core::sample::SampleSlice;

use log::debug;

use crate::writer::WavWriter;

/// The number of bytes in an encoded sample.
const BYTES_PER_SAMPLE: usize = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Open,
    Failed,
    Closed,
}

/// A streaming 16-bit PCM WAVE encoder.
///
/// Samples of any representation are quantized to signed 16-bit PCM and appended to the `data`
/// chunk in little-endian byte order. 16-bit input is copied as-is.
pub struct WavEncoder<W: Write + Seek> {
    writer: WavWriter<W>,
    config: StreamConfig,
    scratch: Vec<u8>,
    samples_written: u64,
    state: State,
}

impl<W: Write + Seek> WavEncoder<W> {
    /// Instantiate an encoder writing to `sink`. The header is written immediately.
    pub fn try_new(sink: W, config: &StreamConfig) -> Result<Self> {
        let writer = WavWriter::try_new(sink, config)?;

        Ok(WavEncoder {
            writer,
            config: *config,
            scratch: Vec::new(),
            samples_written: 0,
            state: State::Open,
        })
    }

    /// Get the stream configuration.
    pub fn config(&self) -> StreamConfig {
        self.config
    }

    /// The number of samples written to the sink.
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// Get the container writer.
    pub fn writer(&self) -> &WavWriter<W> {
        &self.writer
    }

    /// Gets a reference to the sink.
    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }

    fn serialize(&mut self, buf: SampleSlice<'_>) {
        self.scratch.clear();
        self.scratch.reserve(buf.len() * BYTES_PER_SAMPLE);

        match buf {
            SampleSlice::Int16(samples) => {
                for &s in samples {
                    self.scratch.extend_from_slice(&s.to_le_bytes());
                }
            }
            _ => {
                for i in 0..buf.len() {
                    self.scratch.extend_from_slice(&conv::float_to_pcm16_le(buf.get_float(i)));
                }
            }
        }
    }
}

impl<W: Write + Seek> Encoder for WavEncoder<W> {
    fn write(&mut self, buf: SampleSlice<'_>) -> WriteResult {
        match self.state {
            State::Open => (),
            State::Failed => {
                return Err(TransferError::new(
                    0,
                    Error::InvalidState("wav: encoder failed previously"),
                ))
            }
            State::Closed => {
                return Err(TransferError::new(0, Error::InvalidState("wav: encoder is closed")))
            }
        }

        self.serialize(buf);

        match self.writer.append_payload(&self.scratch) {
            Ok(()) => {
                self.samples_written += buf.len() as u64;
                Ok(buf.len())
            }
            Err(err) => {
                self.state = State::Failed;

                // Only whole samples are counted.
                let count = err.count / BYTES_PER_SAMPLE;
                self.samples_written += count as u64;

                Err(TransferError::new(count, err.error))
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.state == State::Closed {
            return invalid_state_error("wav: encoder is already closed");
        }

        self.state = State::Closed;

        debug!("wav: closing after {} samples", self.samples_written);

        self.writer.close()
    }
}
