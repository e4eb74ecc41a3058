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

//! Low-level section encoding and decoding.
//!
//! Writing a section is a two-phase operation: the header goes out first
//! with a `0x00` checksum placeholder, then the payload and its checksum,
//! and only then is the real header checksum committed. A crash in between
//! leaves the header detectably invalid, so readers skip the section.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::crc8::{self, Crc8};
use crate::error::{Error, Result};
use crate::header::{SectionHeader, Struct, SIZE_CRC, SIZE_SECTION_HEADER};
use crate::utils::ReadFill;

/// Reads a section header at the given file offset.
///
/// A header whose begin marker or checksum does not match is returned with
/// `verified` unset rather than as an error, so callers can resynchronize
/// by marker scanning.
///
/// # Errors
///
/// Returns [Eof](Error::Eof) if fewer than 15 bytes remain at `offset`.
pub fn read_header<T: Read + Seek>(backend: &mut T, offset: u64) -> Result<SectionHeader> {
    backend.seek(SeekFrom::Start(offset))?;
    let mut header = SectionHeader::read(&mut *backend)?;
    header.offset = offset;
    Ok(header)
}

/// Writes a section header at `header.offset` with a placeholder checksum.
///
/// Returns the real checksum, to be committed with
/// [commit_header_crc](commit_header_crc) once the payload is on disk.
pub fn write_header<T: Write + Seek>(backend: &mut T, header: &SectionHeader) -> Result<u8> {
    backend.seek(SeekFrom::Start(header.offset))?;
    header.write(backend)?;
    Ok(header.checksum())
}

/// Overwrites the checksum byte of a previously written section header
/// with its real value.
pub fn commit_header_crc<T: Write + Seek>(
    backend: &mut T,
    header: &SectionHeader,
    crc: u8,
) -> Result<()> {
    backend.seek(SeekFrom::Start(
        header.offset + (SIZE_SECTION_HEADER - SIZE_CRC) as u64,
    ))?;
    backend.write_all(&[crc])?;
    Ok(())
}

/// Writes a compressed payload and its checksum at the given offset.
pub fn write_payload<T: Write + Seek>(backend: &mut T, offset: u64, payload: &[u8]) -> Result<()> {
    backend.seek(SeekFrom::Start(offset))?;
    backend.write_all(payload)?;
    let mut chksum = Crc8::new();
    chksum.push(payload);
    backend.write_all(&[chksum.finish()])?;
    Ok(())
}

/// Reads a compressed payload and verifies its trailing checksum.
///
/// # Errors
///
/// Returns [Checksum](Error::Checksum) if the stored value is the
/// uncommitted placeholder or does not match the recomputed checksum, and
/// [Eof](Error::Eof) if the file ends before the payload and its checksum
/// byte.
pub fn read_payload<T: Read + Seek>(
    backend: &mut T,
    offset: u64,
    payload: &mut [u8],
) -> Result<()> {
    backend.seek(SeekFrom::Start(offset))?;
    if backend.read_fill(payload)? != payload.len() {
        return Err(Error::Eof);
    }
    let mut stored = [0u8; SIZE_CRC];
    if backend.read_fill(&mut stored)? != SIZE_CRC {
        return Err(Error::Eof);
    }
    let mut chksum = Crc8::new();
    chksum.push(payload);
    let expected = chksum.finish();
    if stored[0] == crc8::CRC_PLACEHOLDER || stored[0] != expected {
        return Err(Error::Checksum(expected, stored[0]));
    }
    Ok(())
}
