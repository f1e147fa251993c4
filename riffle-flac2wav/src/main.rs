// Riffle FLAC to WAVE Tool
// Copyright (c) 2024 The Project Riffle Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use riffle::core::codecs::{copy, CopyOptions, DecoderOptions, Encoder};
use riffle::core::errors::{Error, Result};
use riffle::core::probe::Registry;
use riffle::wav::WavEncoder;

use clap::Parser;
use log::{error, info};

/// Convert FLAC files to 16-bit PCM WAVE files.
///
/// Each output is written next to its input, with the extension replaced by `.wav`.
#[derive(Parser, Debug)]
#[command(name = "flac2wav", version)]
struct Args {
    /// Overwrite existing output files
    #[arg(short, long)]
    force: bool,

    /// Verify the decoded audio against the stream's MD5 signature
    #[arg(long)]
    verify: bool,

    /// Size of the conversion buffer in frames
    #[arg(long, default_value_t = 4096)]
    buffer_frames: usize,

    /// The input file paths
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

fn output_path(path: &Path) -> PathBuf {
    path.with_extension("wav")
}

/// Refuse to overwrite an existing output unless `force` is set.
fn check_output(out_path: &Path, force: bool) -> Result<()> {
    if !force && out_path.exists() {
        return Err(Error::IoError(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists, use --force to overwrite", out_path.display()),
        )));
    }

    Ok(())
}

fn convert(registry: &Registry, path: &Path, args: &Args) -> Result<()> {
    let source = File::open(path)?;

    let mut probed = registry.open(Box::new(source), &DecoderOptions { verify: args.verify })?;

    let config = probed.decoder.config();

    println!("{}: {}, {}", path.display(), probed.name, config);

    let out_path = output_path(path);

    check_output(&out_path, args.force)?;

    let sink = BufWriter::new(File::create(&out_path)?);

    let mut encoder = WavEncoder::try_new(sink, &config)?;

    let options = CopyOptions { buffer_frames: args.buffer_frames };

    let n_samples = copy(&mut encoder, &mut probed.decoder, &options)?;

    encoder.close()?;

    info!("wrote {} samples to {}", n_samples, out_path.display());

    Ok(())
}

fn main() {
    pretty_env_logger::init();

    let args = Args::parse();

    let registry = riffle::default::registry();

    for path in &args.paths {
        if let Err(err) = convert(&registry, path, &args) {
            error!("{}: {}", path.display(), err);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io;
    use std::path::Path;

    use riffle::core::errors::Error;

    use super::{check_output, output_path};

    #[test]
    fn verify_existing_output_requires_force() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("track.wav");

        check_output(&out_path, false).unwrap();

        File::create(&out_path).unwrap();

        match check_output(&out_path, false) {
            Err(Error::IoError(err)) => assert_eq!(err.kind(), io::ErrorKind::AlreadyExists),
            res => panic!("unexpected result {:?}", res),
        }

        check_output(&out_path, true).unwrap();
    }

    #[test]
    fn verify_output_path() {
        assert_eq!(output_path(Path::new("a/b/track.flac")), Path::new("a/b/track.wav"));
        assert_eq!(output_path(Path::new("track")), Path::new("track.wav"));
        assert_eq!(output_path(Path::new("some.dir/track.x.flac")), Path::new("some.dir/track.x.wav"));
    }
}
