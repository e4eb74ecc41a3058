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

//! Declarations for basic constants and low-level file headers.

use std::io;

use byteorder::{ByteOrder, LittleEndian};

use crate::compression::CompressionMethod;
use crate::crc8;
use crate::error::{Error, Result};
use crate::utils::ReadFill;

/// The size in bytes of the LOZ file header.
pub const SIZE_FILE_HEADER: usize = 6;

/// The size in bytes of a LOZ section header.
pub const SIZE_SECTION_HEADER: usize = 15;

/// The size in bytes of a persisted checksum.
pub const SIZE_CRC: usize = 1;

/// The LOZ file signature.
pub const SIGNATURE: [u8; 3] = *b"LOZ";

/// The two-byte tag opening every section.
pub const BEGIN_MARKER: [u8; 2] = [0xFA, 0xF5];

/// The LOZ version this crate supports.
pub const LOZ_CURRENT_VERSION: u8 = 0x00;

/// The values allowed for the version field in the LOZ file header.
pub const KNOWN_VERSIONS: &[u8] = &[0x00];

/// Smallest accepted segment size.
pub const SEGMENT_SIZE_MIN: usize = 32;

/// Largest accepted segment size.
pub const SEGMENT_SIZE_MAX: usize = 65535;

/// Byte substituted for the raw contents of an unrecoverable section.
pub const FILLER: u8 = b'?';

/// Represents a serializable and deserializable byte structure in a LOZ file.
pub trait Struct<const S: usize>: Sized {
    /// The output of from_bytes.
    ///
    /// *This is to allow returning additional values specific to some structures.*
    type Output;

    /// Attempts to read a structure from an IO backend.
    ///
    /// # Arguments
    ///
    /// * `reader`: the IO backend to read from.
    ///
    /// # Errors
    ///
    /// Returns [Eof](crate::error::Error::Eof) when fewer than `S` bytes
    /// remain, or an error if the structure is corrupted beyond use.
    fn read<TRead: io::Read>(mut reader: TRead) -> Result<Self::Output> {
        let mut buffer: [u8; S] = [0; S];
        let len = reader.read_fill(&mut buffer)?;
        if len != S {
            return Err(Error::Eof);
        }
        Self::from_bytes(buffer)
    }

    /// Attempts to read a structure from a fixed size byte array.
    ///
    /// # Arguments
    ///
    /// * `buffer`: the fixed size byte array to read from.
    fn from_bytes(buffer: [u8; S]) -> Result<Self::Output>;

    /// Converts this structure to a fixed size byte array.
    fn to_bytes(&self) -> [u8; S];

    /// Attempts to write this structure to an IO backend.
    ///
    /// # Arguments
    ///
    /// * `writer`: the IO backend to write to.
    ///
    /// # Errors
    ///
    /// Returns an error if the data could not be written to the IO backend.
    fn write<TWriter: io::Write>(&self, writer: &mut TWriter) -> Result<()> {
        let buf = self.to_bytes();
        writer.write_all(&buf)?;
        Ok(())
    }
}

/// The LOZ file header.
///
/// On-disk layout: the 3-byte signature, the version byte, the compression
/// id byte and a checksum over the two preceding bytes.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct FileHeader {
    /// Version of the LOZ format.
    ///
    /// Offset: +3
    pub version: u8,

    /// Compression method applied to every section of the file.
    ///
    /// Offset: +4
    pub compression: CompressionMethod,
}

impl FileHeader {
    /// Creates the file header for a new archive.
    pub fn new(compression: CompressionMethod) -> FileHeader {
        FileHeader {
            version: LOZ_CURRENT_VERSION,
            compression,
        }
    }
}

impl Struct<SIZE_FILE_HEADER> for FileHeader {
    type Output = FileHeader;

    fn from_bytes(buffer: [u8; SIZE_FILE_HEADER]) -> Result<FileHeader> {
        let signature = [buffer[0], buffer[1], buffer[2]];
        if signature != SIGNATURE {
            return Err(Error::BadSignature(signature));
        }
        let version = buffer[3];
        if !KNOWN_VERSIONS.contains(&version) {
            return Err(Error::BadVersion(version));
        }
        let compression =
            CompressionMethod::from_id(buffer[4]).ok_or(Error::BadCompression(buffer[4]))?;
        let expected = crc8::checksum_of(&buffer[3..5]);
        if buffer[5] == crc8::CRC_PLACEHOLDER || buffer[5] != expected {
            return Err(Error::Checksum(expected, buffer[5]));
        }
        Ok(FileHeader {
            version,
            compression,
        })
    }

    fn to_bytes(&self) -> [u8; SIZE_FILE_HEADER] {
        let mut block: [u8; SIZE_FILE_HEADER] = [0; SIZE_FILE_HEADER];
        block[0..3].copy_from_slice(&SIGNATURE);
        block[3] = self.version;
        block[4] = self.compression.to_id();
        block[5] = crc8::checksum_of(&block[3..5]);
        block
    }
}

/// A LOZ section header.
///
/// `offset` and `verified` describe where and how the header was read;
/// they are not part of the on-disk layout. The checksum stored on disk
/// covers the three size fields only, the begin marker and the checksum
/// byte itself are excluded.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SectionHeader {
    /// File position of the begin marker.
    pub offset: u64,

    /// Position of the first raw byte of this section in the decompressed
    /// stream.
    ///
    /// Offset: +2
    pub rawpos: u32,

    /// Number of raw bytes represented by this section.
    ///
    /// Offset: +6
    pub rawsize: u32,

    /// Length of the compressed payload following the header.
    ///
    /// Offset: +10
    pub compsize: u32,

    /// Whether the stored header checksum matched on read.
    pub verified: bool,
}

impl SectionHeader {
    /// File position of the byte just after this section (header, payload
    /// and payload checksum).
    pub fn end(&self) -> u64 {
        self.offset + (SIZE_SECTION_HEADER + self.compsize as usize + SIZE_CRC) as u64
    }

    /// Position just after this section's raw bytes in the decompressed
    /// stream.
    pub fn rawpos_end(&self) -> u64 {
        self.rawpos as u64 + self.rawsize as u64
    }

    /// Computes the persistable checksum of the three size fields.
    pub fn checksum(&self) -> u8 {
        let block = self.to_bytes();
        crc8::checksum_of(&block[2..14])
    }
}

impl Struct<SIZE_SECTION_HEADER> for SectionHeader {
    type Output = SectionHeader;

    fn from_bytes(buffer: [u8; SIZE_SECTION_HEADER]) -> Result<SectionHeader> {
        let marker_ok = buffer[0] == BEGIN_MARKER[0] && buffer[1] == BEGIN_MARKER[1];
        let stored = buffer[14];
        let expected = crc8::checksum_of(&buffer[2..14]);
        let verified = marker_ok && stored != crc8::CRC_PLACEHOLDER && stored == expected;
        Ok(SectionHeader {
            offset: 0,
            rawpos: LittleEndian::read_u32(&buffer[2..6]),
            rawsize: LittleEndian::read_u32(&buffer[6..10]),
            compsize: LittleEndian::read_u32(&buffer[10..14]),
            verified,
        })
    }

    fn to_bytes(&self) -> [u8; SIZE_SECTION_HEADER] {
        let mut block: [u8; SIZE_SECTION_HEADER] = [0; SIZE_SECTION_HEADER];
        block[0] = BEGIN_MARKER[0];
        block[1] = BEGIN_MARKER[1];
        LittleEndian::write_u32(&mut block[2..6], self.rawpos);
        LittleEndian::write_u32(&mut block[6..10], self.rawsize);
        LittleEndian::write_u32(&mut block[10..14], self.compsize);
        block[14] = crc8::CRC_PLACEHOLDER;
        block
    }
}
