// Riffle
// Copyright (c) 2024 The Project Riffle Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use riffle_core::errors::{invalid_data_error, Result};
use riffle_core::formats::StreamConfig;

pub const RIFF_TAG: [u8; 4] = *b"RIFF";
pub const WAVE_TAG: [u8; 4] = *b"WAVE";
pub const FMT_TAG: [u8; 4] = *b"fmt ";
pub const DATA_TAG: [u8; 4] = *b"data";

/// The WAVE format tag for integer PCM.
pub const WAVE_FORMAT_PCM: u16 = 1;

/// The length of the basic `fmt ` chunk body.
pub const FMT_CHUNK_LEN: u32 = 16;

/// The total length of the header, up to and including the `data` chunk size field.
pub const HEADER_LEN: usize = 44;

/// The offset of the RIFF chunk size field relative to the start of the header.
pub const RIFF_SIZE_OFFSET: u64 = 4;

/// The offset of the `data` chunk size field relative to the start of the header.
pub const DATA_SIZE_OFFSET: u64 = 40;

/// The bytes of the header that precede the RIFF chunk body, and are therefore not counted by the
/// RIFF chunk size.
const RIFF_PREAMBLE_LEN: u32 = 8;

/// The largest payload the 32-bit size fields can describe.
pub const MAX_PAYLOAD_LEN: u32 = u32::MAX - (HEADER_LEN as u32 - RIFF_PREAMBLE_LEN);

/// The `fmt ` chunk of a PCM WAVE file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WaveFormatChunk {
    /// The number of channels.
    pub n_channels: u16,
    /// The sample rate in Hz.
    pub sample_rate: u32,
    /// The data rate in bytes/second.
    pub avg_bytes_per_sec: u32,
    /// The byte alignment of one audio frame, `n_channels * bits_per_sample / 8`.
    pub block_align: u16,
    /// The width of each sample.
    pub bits_per_sample: u16,
}

impl WaveFormatChunk {
    /// Describe a stream of interleaved 16-bit PCM samples.
    pub fn pcm16(config: &StreamConfig) -> Result<WaveFormatChunk> {
        if config.sample_rate == 0 {
            return invalid_data_error("wav: sample rate cannot be 0");
        }

        let n_channels = match u16::try_from(config.channels) {
            Ok(0) => return invalid_data_error("wav: channel count cannot be 0"),
            Ok(n_channels) => n_channels,
            Err(_) => return invalid_data_error("wav: too many channels"),
        };

        let block_align = match n_channels.checked_mul(2) {
            Some(block_align) => block_align,
            None => return invalid_data_error("wav: block align overflows"),
        };

        let avg_bytes_per_sec = match config.sample_rate.checked_mul(u32::from(block_align)) {
            Some(rate) => rate,
            None => return invalid_data_error("wav: byte rate overflows"),
        };

        Ok(WaveFormatChunk {
            n_channels,
            sample_rate: config.sample_rate,
            avg_bytes_per_sec,
            block_align,
            bits_per_sample: 16,
        })
    }

    /// Serialize the chunk body.
    pub fn to_bytes(&self) -> [u8; FMT_CHUNK_LEN as usize] {
        let mut buf = [0; FMT_CHUNK_LEN as usize];

        buf[0..2].copy_from_slice(&WAVE_FORMAT_PCM.to_le_bytes());
        buf[2..4].copy_from_slice(&self.n_channels.to_le_bytes());
        buf[4..8].copy_from_slice(&self.sample_rate.to_le_bytes());
        buf[8..12].copy_from_slice(&self.avg_bytes_per_sec.to_le_bytes());
        buf[12..14].copy_from_slice(&self.block_align.to_le_bytes());
        buf[14..16].copy_from_slice(&self.bits_per_sample.to_le_bytes());

        buf
    }
}

impl fmt::Display for WaveFormatChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pcm {} Hz, {} channel(s), {} bits per sample",
            self.sample_rate, self.n_channels, self.bits_per_sample
        )
    }
}

/// The value of the RIFF chunk size field for a payload of `payload_len` bytes.
pub fn riff_chunk_len(payload_len: u32) -> u32 {
    payload_len + (HEADER_LEN as u32 - RIFF_PREAMBLE_LEN)
}

/// Serialize the complete header for a payload of `payload_len` bytes.
pub fn header(format: &WaveFormatChunk, payload_len: u32) -> [u8; HEADER_LEN] {
    let mut buf = [0; HEADER_LEN];

    buf[0..4].copy_from_slice(&RIFF_TAG);
    buf[4..8].copy_from_slice(&riff_chunk_len(payload_len).to_le_bytes());
    buf[8..12].copy_from_slice(&WAVE_TAG);
    buf[12..16].copy_from_slice(&FMT_TAG);
    buf[16..20].copy_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    buf[20..36].copy_from_slice(&format.to_bytes());
    buf[36..40].copy_from_slice(&DATA_TAG);
    buf[40..44].copy_from_slice(&payload_len.to_le_bytes());

    buf
}

#[cfg(test)]
mod tests {
    use riffle_core::errors::Error;
    use riffle_core::formats::StreamConfig;

    use super::*;

    #[test]
    fn verify_header_layout() {
        let format = WaveFormatChunk::pcm16(&StreamConfig::new(44100, 2)).unwrap();

        let expected: [u8; HEADER_LEN] = [
            b'R', b'I', b'F', b'F', 0x24, 0x00, 0x00, 0x00, // RIFF, 36
            b'W', b'A', b'V', b'E', // WAVE
            b'f', b'm', b't', b' ', 0x10, 0x00, 0x00, 0x00, // fmt, 16
            0x01, 0x00, 0x02, 0x00, // PCM, 2 channels
            0x44, 0xac, 0x00, 0x00, // 44100 Hz
            0x10, 0xb1, 0x02, 0x00, // 176400 bytes/sec
            0x04, 0x00, 0x10, 0x00, // block align 4, 16 bits
            b'd', b'a', b't', b'a', 0x00, 0x00, 0x00, 0x00, // data, 0
        ];

        assert_eq!(header(&format, 0), expected);
    }

    #[test]
    fn verify_header_sizes() {
        let format = WaveFormatChunk::pcm16(&StreamConfig::new(8000, 1)).unwrap();
        let buf = header(&format, 1000);

        assert_eq!(&buf[4..8], &1036u32.to_le_bytes());
        assert_eq!(&buf[40..44], &1000u32.to_le_bytes());
        assert_eq!(riff_chunk_len(MAX_PAYLOAD_LEN), u32::MAX);
    }

    #[test]
    fn verify_invalid_configs() {
        for config in [
            StreamConfig::new(0, 2),
            StreamConfig::new(44100, 0),
            StreamConfig::new(44100, 65536),
            StreamConfig::new(u32::MAX, 2),
        ] {
            assert!(matches!(WaveFormatChunk::pcm16(&config), Err(Error::InvalidData(_))));
        }

        let format = WaveFormatChunk::pcm16(&StreamConfig::new(48000, 6)).unwrap();
        assert_eq!(format.block_align, 12);
        assert_eq!(format.avg_bytes_per_sec, 576000);
    }
}
