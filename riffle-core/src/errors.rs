// Riffle
// Copyright (c) 2024 The Project Riffle Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error;
use std::fmt;
use std::io;
use std::result;

/// `Error` provides an enumeration of all possible errors reported by Riffle.
///
/// Reaching the end of a stream is not an error. It is reported as
/// [`ReadStatus::EndOfStream`](crate::codecs::ReadStatus::EndOfStream) instead.
#[derive(Debug)]
pub enum Error {
    /// An IO error occured while reading, writing, or seeking the stream.
    IoError(std::io::Error),
    /// The stream did not start with the expected magic, or contained malformed data and could
    /// not be decoded.
    InvalidData(&'static str),
    /// An unsupported bit depth, container feature, or operation was requested.
    Unsupported(&'static str),
    /// The sink or source accepted or produced less data than requested.
    ShortIo(&'static str),
    /// The session was used after it was closed, or after a previous fatal error.
    InvalidState(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::IoError(ref err) => err.fmt(f),
            Error::InvalidData(msg) => {
                write!(f, "invalid data: {}", msg)
            }
            Error::Unsupported(feature) => {
                write!(f, "unsupported feature: {}", feature)
            }
            Error::ShortIo(msg) => {
                write!(f, "short io: {}", msg)
            }
            Error::InvalidState(msg) => {
                write!(f, "invalid state: {}", msg)
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::IoError(ref err) => Some(err),
            Error::InvalidData(_) => None,
            Error::Unsupported(_) => None,
            Error::ShortIo(_) => None,
            Error::InvalidState(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

pub type Result<T> = result::Result<T, Error>;

/// `TransferError` is returned when a read or write of samples fails part-way through.
///
/// `count` is the number of samples that were fully transferred before `error` occured. These
/// samples are valid and have been delivered (read) or committed to the sink (write).
#[derive(Debug)]
pub struct TransferError {
    /// The number of samples fully transferred before the error.
    pub count: usize,
    /// The cause.
    pub error: Error,
}

impl TransferError {
    pub fn new(count: usize, error: Error) -> Self {
        TransferError { count, error }
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (after {} samples)", self.error, self.count)
    }
}

impl error::Error for TransferError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<TransferError> for Error {
    fn from(err: TransferError) -> Error {
        err.error
    }
}

/// Convenience function to create an invalid data error.
pub fn invalid_data_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::InvalidData(desc))
}

/// Convenience function to create an unsupport feature error.
pub fn unsupported_error<T>(feature: &'static str) -> Result<T> {
    Err(Error::Unsupported(feature))
}

/// Convenience function to create a short io error.
pub fn short_io_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::ShortIo(desc))
}

/// Convenience function to create an invalid state error.
pub fn invalid_state_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::InvalidState(desc))
}
