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

//! Error declarations.

use std::fmt::{Display, Formatter};

use crate::compression::CodecError;
use crate::impl_err_conversion;

/// Represents a LOZ archive error.
#[derive(Debug)]
pub enum Error {
    /// Describes an io error.
    Io(std::io::Error),

    /// End of file reached where more data was expected.
    Eof,

    /// Describes a checksum error.
    ///
    /// # Arguments
    /// * expected checksum value.
    /// * actual checksum value.
    Checksum(u8, u8),

    /// Describes a bad signature error.
    ///
    /// # Arguments
    /// * the incriminated signature.
    BadSignature([u8; 3]),

    /// Describes a bad version error.
    ///
    /// # Arguments
    /// * the incriminated version number.
    BadVersion(u8),

    /// Unknown compression method id in the file header.
    ///
    /// # Arguments
    /// * the incriminated id byte.
    BadCompression(u8),

    /// Segment size outside of the accepted range.
    ///
    /// # Arguments
    /// * the incriminated segment size.
    BadSegmentSize(usize),

    /// Attempted to write into an archive opened read-only.
    ReadOnly,

    /// The underlying compressor or decompressor reported a failure.
    Codec(CodecError),
}

impl_err_conversion!(
    Error {
        std::io::Error => Io,
        CodecError => Codec
    }
);

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Eof => f.write_str("unexpected end of file"),
            Error::Checksum(expected, actual) => write!(
                f,
                "checksum validation failed (expected {:#04X}, got {:#04X})",
                expected, actual
            ),
            Error::BadSignature(sig) => {
                write!(f, "unknown file signature ({}{}{})", sig[0], sig[1], sig[2])
            },
            Error::BadVersion(v) => write!(f, "unknown file version ({})", v),
            Error::BadCompression(id) => write!(f, "unknown compression method ({})", id),
            Error::BadSegmentSize(size) => write!(f, "unsupported segment size ({})", size),
            Error::ReadOnly => f.write_str("archive is opened read-only"),
            Error::Codec(e) => write!(f, "codec error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<Error> for std::io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(inner) => inner,
            Error::Eof => std::io::Error::new(std::io::ErrorKind::UnexpectedEof, Error::Eof),
            other => std::io::Error::new(std::io::ErrorKind::InvalidData, other),
        }
    }
}

/// Represents a result from this crate.
pub type Result<T> = std::result::Result<T, Error>;
