// Copyright (c) 2023, BlockProject 3D
//
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without modification,
// are permitted provided that the following conditions are met:
//
//     * Redistributions of source code must retain the above copyright notice,
//       this list of conditions and the following disclaimer.
//     * Redistributions in binary form must reproduce the above copyright notice,
//       this list of conditions and the following disclaimer in the documentation
//       and/or other materials provided with the distribution.
//     * Neither the name of BlockProject 3D nor the names of its contributors
//       may be used to endorse or promote products derived from this software
//       without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS
// "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT
// LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR
// A PARTICULAR PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT OWNER OR
// CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL,
// EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO,
// PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
// PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF
// LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING
// NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE OF THIS
// SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Command line utility to create, append to and extract LOZ archives.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use loz::compression::CompressionMethod;
use loz::file::{OpenMode, OpenOptions, DEFAULT_SEGMENT_SIZE};
use loz::header::SEGMENT_SIZE_MAX;

/// Compress and decompress files in the LOZ format.
#[derive(Parser)]
#[command(name = "loz", version, about)]
#[command(group(clap::ArgGroup::new("action").required(true).args(["create", "add", "extract"])))]
struct Cli {
    /// Compress <INPUT> into a new archive; the archive name defaults to
    /// <INPUT>.lzf
    #[arg(short = 'c', long = "create", num_args = 1..=2, value_names = ["INPUT", "ARCHIVE"])]
    create: Option<Vec<PathBuf>>,

    /// Append the raw bytes of <INPUT> to an archive, honoring the
    /// compression method recorded in it; a missing archive is created
    #[arg(short = 'a', long = "add", num_args = 2, value_names = ["INPUT", "ARCHIVE"])]
    add: Option<Vec<PathBuf>>,

    /// Extract an archive; the output name defaults to the archive name
    /// with its .lzf extension removed
    #[arg(short = 'x', long = "extract", num_args = 1..=2, value_names = ["ARCHIVE", "OUTPUT"])]
    extract: Option<Vec<PathBuf>>,

    /// Compression method for --create: none, rle, rle2, lz, fastlz1 or
    /// fastlz2 (default fastlz2)
    #[arg(short = 'm', long = "method", value_name = "METHOD")]
    method: Option<String>,

    /// Segment size in bytes, in [32, 65535] (default 16384)
    #[arg(short = 's', long = "segmentsize", value_name = "SIZE")]
    segmentsize: Option<usize>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        },
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(args) = cli.create {
        let input = &args[0];
        let archive = match args.get(1) {
            Some(path) => path.clone(),
            None => default_archive_name(input),
        };
        let method = match cli.method.as_deref() {
            Some(name) => CompressionMethod::from_name(name)
                .ok_or_else(|| format!("unsupported method \"{}\"", name))?,
            None => CompressionMethod::FastLz2,
        };
        let mut file = File::open(input)?;
        let mut container = OpenOptions::new()
            .mode(OpenMode::TruncateCreate)
            .compression(method)
            .segment_size(cli.segmentsize.unwrap_or(DEFAULT_SEGMENT_SIZE))
            .open(&archive)?;
        io::copy(&mut file, &mut container)?;
        container.close()?;
    } else if let Some(args) = cli.add {
        if cli.method.is_some() {
            return Err("--method only applies to --create; an archive keeps its method".into());
        }
        let mut file = File::open(&args[0])?;
        let mut container = OpenOptions::new()
            .mode(OpenMode::Update)
            .segment_size(cli.segmentsize.unwrap_or(DEFAULT_SEGMENT_SIZE))
            .open(&args[1])?;
        io::copy(&mut file, &mut container)?;
        container.close()?;
    } else if let Some(args) = cli.extract {
        if cli.method.is_some() {
            return Err("--method does not apply to --extract".into());
        }
        if cli.segmentsize.is_some() {
            return Err("--segmentsize does not apply to --extract".into());
        }
        let archive = &args[0];
        let output = match args.get(1) {
            Some(path) => path.clone(),
            None => default_output_name(archive)?,
        };
        // The archive's own segment size is not recorded in its header, so
        // decode with the largest supported one.
        let mut container = OpenOptions::new().segment_size(SEGMENT_SIZE_MAX).open(archive)?;
        let mut file = File::create(&output)?;
        io::copy(&mut container, &mut file)?;
        file.flush()?;
    }
    Ok(())
}

fn default_archive_name(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".lzf");
    PathBuf::from(name)
}

fn default_output_name(archive: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match archive.extension() {
        Some(ext) if ext == "lzf" => Ok(archive.with_extension("")),
        _ => Err("cannot derive an output name: the archive does not end in .lzf".into()),
    }
}
