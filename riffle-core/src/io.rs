// Riffle
// Copyright (c) 2024 The Project Riffle Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `io` module defines the byte source accepted by decoders.

use std::io;

/// `MediaSource` is a composite trait of [`std::io::Read`] and [`std::io::Seek`]. A source must
/// implement this trait to be probed by a [`Registry`](crate::probe::Registry), which sniffs the
/// leading bytes and then rewinds.
///
/// It is implemented for every type that is `Read + Seek + Send + Sync`, including
/// `std::fs::File` and `std::io::Cursor`.
pub trait MediaSource: io::Read + io::Seek + Send + Sync {}

impl<T: io::Read + io::Seek + Send + Sync> MediaSource for T {}
