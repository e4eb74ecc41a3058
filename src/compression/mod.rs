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

//! Compression codecs and their registry.
//!
//! Every codec is a pure buffer-to-buffer function pair honoring one
//! contract: compressed output never exceeds twice the raw input, for any
//! input length down to a single byte. The streaming layer relies on that
//! bound when sizing its codec scratch buffer.

pub mod fastlz;
pub mod lz;
pub mod rle;
pub mod rle2;

use std::fmt::{Display, Formatter};

use crate::named_enum;

named_enum!(
    /// The compression method applied to every section of an archive.
    #[derive(Copy, Clone, Eq, PartialEq)]
    CompressionMethod {
        /// Store raw bytes unchanged.
        None: "none",
        /// Simple run-length encoding.
        Rle: "rle",
        /// Run-length encoding with signed counters.
        Rle2: "rle2",
        /// Classical marker-based dictionary compression.
        Lz: "lz",
        /// FastLZ, level 1.
        FastLz1: "fastlz1",
        /// FastLZ, level 2.
        FastLz2: "fastlz2"
    }
);

impl CompressionMethod {
    /// Returns the method identified by a file-header id byte.
    pub fn from_id(id: u8) -> Option<CompressionMethod> {
        match id {
            0 => Some(CompressionMethod::None),
            1 => Some(CompressionMethod::Rle),
            2 => Some(CompressionMethod::Rle2),
            3 => Some(CompressionMethod::Lz),
            4 => Some(CompressionMethod::FastLz1),
            5 => Some(CompressionMethod::FastLz2),
            _ => Option::None,
        }
    }

    /// Returns the file-header id byte of this method.
    pub fn to_id(self) -> u8 {
        match self {
            CompressionMethod::None => 0,
            CompressionMethod::Rle => 1,
            CompressionMethod::Rle2 => 2,
            CompressionMethod::Lz => 3,
            CompressionMethod::FastLz1 => 4,
            CompressionMethod::FastLz2 => 5,
        }
    }

    /// Returns the method named by a command-line token, the inverse of
    /// [name](Self::name).
    pub fn from_name(name: &str) -> Option<CompressionMethod> {
        match name {
            "none" => Some(CompressionMethod::None),
            "rle" => Some(CompressionMethod::Rle),
            "rle2" => Some(CompressionMethod::Rle2),
            "lz" => Some(CompressionMethod::Lz),
            "fastlz1" => Some(CompressionMethod::FastLz1),
            "fastlz2" => Some(CompressionMethod::FastLz2),
            _ => Option::None,
        }
    }
}

/// Represents a codec failure.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CodecError {
    /// The output buffer is too small for the produced data.
    Overflow,

    /// The compressed input ended in the middle of a record.
    Truncated,

    /// The compressed input contains an invalid record.
    BadData,
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::Overflow => f.write_str("output buffer overflow"),
            CodecError::Truncated => f.write_str("truncated input"),
            CodecError::BadData => f.write_str("invalid compressed data"),
        }
    }
}

impl std::error::Error for CodecError {}

/// Compresses a raw buffer with the given method.
///
/// `output` must hold at least twice `input.len()` bytes; every codec
/// guarantees its result fits within that bound. Returns the number of
/// bytes written into `output`.
///
/// # Examples
///
/// ```
/// use loz::compression::{self, CompressionMethod};
///
/// let raw = b"aaaaaaaaaaaaaaaaaaaaaaaa";
/// let mut packed = vec![0u8; raw.len() * 2];
/// let size = compression::compress(CompressionMethod::Rle2, raw, &mut packed).unwrap();
/// let mut back = vec![0u8; raw.len()];
/// let len = compression::decompress(CompressionMethod::Rle2, &packed[..size], &mut back).unwrap();
/// assert_eq!(&back[..len], raw);
/// ```
pub fn compress(
    method: CompressionMethod,
    input: &[u8],
    output: &mut [u8],
) -> Result<usize, CodecError> {
    if input.is_empty() {
        return Ok(0);
    }
    if output.len() < 2 * input.len() {
        return Err(CodecError::Overflow);
    }
    match method {
        CompressionMethod::None => {
            output[..input.len()].copy_from_slice(input);
            Ok(input.len())
        },
        CompressionMethod::Rle => rle::compress(input, output),
        CompressionMethod::Rle2 => rle2::compress(input, output),
        CompressionMethod::Lz => lz::compress(input, output),
        CompressionMethod::FastLz1 => fastlz::compress(1, input, output),
        CompressionMethod::FastLz2 => fastlz::compress(2, input, output),
    }
}

/// Decompresses a section payload with the given method.
///
/// Returns the number of bytes written into `output`.
pub fn decompress(
    method: CompressionMethod,
    input: &[u8],
    output: &mut [u8],
) -> Result<usize, CodecError> {
    if input.is_empty() {
        return Ok(0);
    }
    match method {
        CompressionMethod::None => {
            if output.len() < input.len() {
                return Err(CodecError::Overflow);
            }
            output[..input.len()].copy_from_slice(input);
            Ok(input.len())
        },
        CompressionMethod::Rle => rle::decompress(input, output),
        CompressionMethod::Rle2 => rle2::decompress(input, output),
        CompressionMethod::Lz => lz::decompress(input, output),
        CompressionMethod::FastLz1 | CompressionMethod::FastLz2 => {
            fastlz::decompress(input, output)
        },
    }
}
