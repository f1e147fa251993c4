// Riffle
// Copyright (c) 2024 The Project Riffle Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io::{Seek, SeekFrom, Write};
use std::result;

use riffle_core::errors::{invalid_state_error, short_io_error, Error, Result, TransferError};
use riffle_core::formats::StreamConfig;

use log::{debug, warn};

use crate::chunks::{self, WaveFormatChunk, DATA_SIZE_OFFSET, MAX_PAYLOAD_LEN, RIFF_SIZE_OFFSET};

/// Write all of `buf` to `sink`. On failure, the error carries the number of bytes the sink
/// accepted before failing. A sink accepting no bytes is a short write. Nothing is retried.
fn write_fully<W: Write>(sink: &mut W, buf: &[u8]) -> result::Result<(), TransferError> {
    let mut written = 0;

    while written < buf.len() {
        match sink.write(&buf[written..]) {
            Ok(0) => {
                return short_io_error("wav: sink accepted fewer bytes than requested")
                    .map_err(|err| TransferError::new(written, err))
            }
            Ok(n) => written += n,
            Err(err) => return Err(TransferError::new(written, Error::IoError(err))),
        }
    }

    Ok(())
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    /// The header was written with placeholder sizes.
    Opened,
    /// At least one payload byte was accepted.
    Writing,
    /// Appending to the payload failed. Only closing is possible.
    Failed,
    /// The header was patched. Terminal.
    Closed,
}

/// A WAVE container writer.
///
/// The header is written with placeholder sizes when the writer is created. The payload is then
/// appended, and on `close` the writer seeks back to patch the RIFF and `data` chunk sizes. The
/// header may start anywhere in the sink; its position is recorded when the writer is created.
pub struct WavWriter<W: Write + Seek> {
    sink: W,
    format: WaveFormatChunk,
    start: u64,
    payload_len: u32,
    state: State,
}

impl<W: Write + Seek> WavWriter<W> {
    /// Instantiate a writer for 16-bit PCM samples described by `config`, and write the header.
    pub fn try_new(mut sink: W, config: &StreamConfig) -> Result<Self> {
        let format = WaveFormatChunk::pcm16(config)?;

        let start = sink.stream_position()?;

        write_fully(&mut sink, &chunks::header(&format, 0))?;

        debug!("wav: header written at offset {}, {}", start, format);

        Ok(WavWriter { sink, format, start, payload_len: 0, state: State::Opened })
    }

    /// Get the format chunk written to the header.
    pub fn format(&self) -> &WaveFormatChunk {
        &self.format
    }

    /// The number of payload bytes committed to the `data` chunk so far.
    pub fn payload_len(&self) -> u32 {
        self.payload_len
    }

    /// Returns `true` if the header was patched.
    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    /// Gets a reference to the sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Gets a mutable reference to the sink. Writing to, or seeking, the sink directly corrupts
    /// the file.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Append `buf` to the `data` chunk.
    ///
    /// On failure, the error carries the number of bytes the sink accepted. Only whole samples of
    /// those are counted towards the payload, so the patched `data` size is always a multiple of
    /// the sample width. No further payload may be appended after a failure.
    pub fn append_payload(&mut self, buf: &[u8]) -> result::Result<(), TransferError> {
        match self.state {
            State::Opened | State::Writing => (),
            State::Failed => {
                return Err(TransferError::new(
                    0,
                    Error::InvalidState("wav: writer failed previously"),
                ))
            }
            State::Closed => {
                return Err(TransferError::new(0, Error::InvalidState("wav: writer is closed")))
            }
        }

        let fits = u32::try_from(buf.len())
            .ok()
            .and_then(|len| self.payload_len.checked_add(len))
            .map_or(false, |len| len <= MAX_PAYLOAD_LEN);

        if !fits {
            return Err(TransferError::new(
                0,
                Error::Unsupported("wav: payload exceeds the maximum file size"),
            ));
        }

        if buf.is_empty() {
            return Ok(());
        }

        self.state = State::Writing;

        let res = write_fully(&mut self.sink, buf);

        // The payload never exceeds the limit checked above.
        let accepted = match &res {
            Ok(()) => buf.len(),
            Err(err) => {
                self.state = State::Failed;

                let sample_len = usize::from(self.format.bits_per_sample / 8);
                err.count - err.count % sample_len
            }
        };

        self.payload_len += accepted as u32;

        res
    }

    /// Patch the header sizes, leave the sink positioned at the end of the payload, and flush it.
    ///
    /// A writer may only be closed once. Subsequent calls fail without touching the sink.
    pub fn close(&mut self) -> Result<()> {
        if self.state == State::Closed {
            return invalid_state_error("wav: writer is already closed");
        }

        // The header is never patched twice, even if patching fails.
        self.state = State::Closed;

        let riff_len = chunks::riff_chunk_len(self.payload_len);

        self.sink.seek(SeekFrom::Start(self.start + RIFF_SIZE_OFFSET))?;
        write_fully(&mut self.sink, &riff_len.to_le_bytes())?;

        self.sink.seek(SeekFrom::Start(self.start + DATA_SIZE_OFFSET))?;
        write_fully(&mut self.sink, &self.payload_len.to_le_bytes())?;

        self.sink.seek(SeekFrom::End(0))?;
        self.sink.flush()?;

        debug!("wav: header patched, riff size {}, data size {}", riff_len, self.payload_len);

        Ok(())
    }
}

impl<W: Write + Seek> Drop for WavWriter<W> {
    fn drop(&mut self) {
        if self.state != State::Closed {
            warn!("wav: writer dropped without close, header sizes were not patched");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Seek, SeekFrom, Write};

    use riffle_core::errors::Error;
    use riffle_core::formats::StreamConfig;

    use super::WavWriter;
    use crate::chunks::HEADER_LEN;

    fn size_fields(buf: &[u8], start: usize) -> (u32, u32) {
        let riff = u32::from_le_bytes(buf[start + 4..start + 8].try_into().unwrap());
        let data = u32::from_le_bytes(buf[start + 40..start + 44].try_into().unwrap());
        (riff, data)
    }

    /// A sink that accepts no bytes at or beyond position `limit`. Bytes before it may still be
    /// overwritten.
    struct LimitedSink {
        inner: Cursor<Vec<u8>>,
        limit: usize,
    }

    impl Write for LimitedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let pos = self.inner.position() as usize;
            let n = buf.len().min(self.limit.saturating_sub(pos));
            self.inner.write(&buf[..n])
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for LimitedSink {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    #[test]
    fn verify_close_patches_sizes() {
        for payload_len in [0, 1, 2, 1000] {
            let mut writer = WavWriter::try_new(Cursor::new(Vec::new()), &StreamConfig::new(8000, 1))
                .unwrap();

            writer.append_payload(&vec![0x5a; payload_len]).unwrap();
            writer.close().unwrap();

            let buf = writer.get_ref().get_ref();
            assert_eq!(buf.len(), HEADER_LEN + payload_len);
            assert_eq!(size_fields(buf, 0), (payload_len as u32 + 36, payload_len as u32));
            assert_eq!(writer.get_ref().position(), buf.len() as u64);
        }
    }

    #[test]
    fn verify_header_at_offset() {
        let mut sink = Cursor::new(Vec::new());
        sink.write_all(b"prefix").unwrap();

        let mut writer = WavWriter::try_new(sink, &StreamConfig::new(44100, 2)).unwrap();
        writer.append_payload(&[1, 2, 3, 4]).unwrap();
        writer.close().unwrap();

        let buf = writer.get_ref().get_ref();
        assert_eq!(&buf[..6], b"prefix");
        assert_eq!(&buf[6..10], b"RIFF");
        assert_eq!(size_fields(buf, 6), (40, 4));
        assert_eq!(&buf[6 + HEADER_LEN..], &[1, 2, 3, 4]);
    }

    #[test]
    fn verify_second_close_does_not_touch_sink() {
        let mut writer =
            WavWriter::try_new(Cursor::new(Vec::new()), &StreamConfig::new(8000, 1)).unwrap();

        writer.append_payload(&[0; 6]).unwrap();
        writer.close().unwrap();

        let before = writer.get_ref().clone();

        assert!(matches!(writer.close(), Err(Error::InvalidState(_))));
        assert_eq!(writer.get_ref().get_ref(), before.get_ref());
        assert_eq!(writer.get_ref().position(), before.position());

        let err = writer.append_payload(&[0; 2]).unwrap_err();
        assert_eq!(err.count, 0);
        assert!(matches!(err.error, Error::InvalidState(_)));
    }

    #[test]
    fn verify_short_write() {
        let sink = LimitedSink { inner: Cursor::new(Vec::new()), limit: HEADER_LEN + 3 };
        let mut writer = WavWriter::try_new(sink, &StreamConfig::new(8000, 1)).unwrap();

        let err = writer.append_payload(&[7; 8]).unwrap_err();
        assert_eq!(err.count, 3);
        assert!(matches!(err.error, Error::ShortIo(_)));

        // Only the whole sample is committed.
        assert_eq!(writer.payload_len(), 2);

        let err = writer.append_payload(&[7; 2]).unwrap_err();
        assert_eq!(err.count, 0);
        assert!(matches!(err.error, Error::InvalidState(_)));

        writer.close().unwrap();

        let buf = writer.get_ref().inner.get_ref();
        assert_eq!(buf.len(), HEADER_LEN + 3);
        assert_eq!(size_fields(buf, 0), (38, 2));
    }

    #[test]
    fn verify_short_header_write() {
        let sink = LimitedSink { inner: Cursor::new(Vec::new()), limit: 10 };

        assert!(matches!(
            WavWriter::try_new(sink, &StreamConfig::new(8000, 1)),
            Err(Error::ShortIo(_))
        ));
    }

    #[test]
    fn verify_invalid_config() {
        assert!(matches!(
            WavWriter::try_new(Cursor::new(Vec::new()), &StreamConfig::new(8000, 0)),
            Err(Error::InvalidData(_))
        ));
    }
}
