// Riffle
// Copyright (c) 2024 The Project Riffle Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io;

use riffle_core::codecs::DecoderOptions;
use riffle_core::errors::{invalid_data_error, unsupported_error, Error, Result};
use riffle_core::formats::{Frame, FrameSource, StreamInfo};
use riffle_core::io::MediaSource;

use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{Decoder as _, DecoderOptions as PacketDecoderOptions};
use symphonia::core::errors::Error as ParseError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSourceStream, ReadOnlySource};
use symphonia::default::codecs::FlacDecoder as PacketDecoder;
use symphonia::default::formats::FlacReader;

use log::{debug, warn};

/// Map a bitstream parser error onto a Riffle error.
fn map_parse_error(err: ParseError) -> Error {
    match err {
        ParseError::IoError(err) => Error::IoError(err),
        ParseError::DecodeError(msg) => Error::InvalidData(msg),
        ParseError::Unsupported(msg) => Error::Unsupported(msg),
        err => {
            debug!("flac: parser error: {}", err);
            Error::InvalidData("flac: malformed stream")
        }
    }
}

fn is_end_of_stream(err: &ParseError) -> bool {
    matches!(err, ParseError::IoError(err) if err.kind() == io::ErrorKind::UnexpectedEof)
}

/// A `FrameSource` reading a native FLAC stream.
///
/// Frames are delivered at the stream's native bit depth, the same values the encoder was given.
pub struct FlacStream {
    reader: FlacReader,
    decoder: PacketDecoder,
    track_id: u32,
    info: StreamInfo,
    verify: bool,
    is_finished: bool,
}

impl FlacStream {
    /// Open the FLAC stream in `source`. The stream information block is parsed immediately, the
    /// audio frames on demand.
    pub fn try_new(source: Box<dyn MediaSource>, options: &DecoderOptions) -> Result<Self> {
        let mss = MediaSourceStream::new(Box::new(ReadOnlySource::new(source)), Default::default());

        let reader = FlacReader::try_new(mss, &FormatOptions::default()).map_err(|err| {
            debug!("flac: failed to open stream: {}", err);
            Error::InvalidData("flac: not a valid stream")
        })?;

        let (track_id, info, decoder) = {
            let track = match reader.default_track() {
                Some(track) => track,
                None => return invalid_data_error("flac: stream has no audio track"),
            };

            let params = &track.codec_params;

            let info = match (params.sample_rate, params.channels, params.bits_per_sample) {
                (Some(sample_rate), Some(channels), Some(bits_per_sample)) => {
                    StreamInfo { sample_rate, channels: channels.count(), bits_per_sample }
                }
                _ => return invalid_data_error("flac: stream information is incomplete"),
            };

            if info.bits_per_sample == 0 || info.bits_per_sample > 32 {
                return invalid_data_error("flac: bits per sample out of range");
            }

            let decoder =
                PacketDecoder::try_new(params, &PacketDecoderOptions { verify: options.verify })
                    .map_err(map_parse_error)?;

            (track.id, info, decoder)
        };

        Ok(FlacStream { reader, decoder, track_id, info, verify: options.verify, is_finished: false })
    }

    /// Check the decoded audio against the stream's MD5 signature.
    fn finalize(&mut self) -> Result<()> {
        if !self.verify {
            return Ok(());
        }

        match self.decoder.finalize().verify_ok {
            Some(true) => {
                debug!("flac: md5 verification passed");
                Ok(())
            }
            Some(false) => invalid_data_error("flac: decoded audio does not match the md5 signature"),
            None => {
                warn!("flac: stream has no md5 signature, verification skipped");
                Ok(())
            }
        }
    }
}

impl FrameSource for FlacStream {
    fn stream_info(&self) -> &StreamInfo {
        &self.info
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.is_finished {
            return Ok(None);
        }

        let packet = loop {
            match self.reader.next_packet() {
                Ok(packet) if packet.track_id() == self.track_id => break packet,
                Ok(_) => continue,
                Err(err) if is_end_of_stream(&err) => {
                    self.is_finished = true;
                    self.finalize()?;
                    return Ok(None);
                }
                Err(err) => return Err(map_parse_error(err)),
            }
        };

        // The parser scales samples to the full 32-bit range. Undo that to restore the native
        // bit depth.
        let shift = 32 - self.info.bits_per_sample;

        let subframes: Vec<Vec<i32>> = match self.decoder.decode(&packet).map_err(map_parse_error)? {
            AudioBufferRef::S32(buf) => (0..buf.spec().channels.count())
                .map(|ch| buf.chan(ch).iter().map(|&s| s >> shift).collect())
                .collect(),
            _ => return unsupported_error("flac: unexpected decoded sample format"),
        };

        Frame::new(subframes).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use riffle_core::errors::Error;

    use super::FlacStream;

    fn open(data: &[u8]) -> Result<FlacStream, Error> {
        FlacStream::try_new(Box::new(Cursor::new(data.to_vec())), &Default::default())
    }

    #[test]
    fn verify_magic_followed_by_garbage() {
        let mut data = b"fLaC".to_vec();
        data.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef, 0x00, 0x11, 0x22]);

        assert!(matches!(open(&data), Err(Error::InvalidData(_))));
    }

    #[test]
    fn verify_not_flac() {
        assert!(matches!(open(b"RIFF\x24\x00\x00\x00WAVE"), Err(Error::InvalidData(_))));
        assert!(matches!(open(b""), Err(Error::InvalidData(_))));
    }
}
