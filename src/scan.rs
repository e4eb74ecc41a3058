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

//! Byte-level search for the section begin marker.
//!
//! No alignment is assumed: a hit may be a false positive inside payload
//! bytes, which callers resolve by attempting a verified header read at
//! the returned offset.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{Error, Result};
use crate::header::BEGIN_MARKER;

const SCAN_BLOCK_SIZE: usize = 8192;

/// Searches forward from `start` for the two-byte section begin marker.
///
/// Returns the file offset of the first marker byte.
///
/// # Errors
///
/// Returns [Eof](Error::Eof) when the end of the file is reached without
/// a hit.
pub fn forward<T: Read + Seek>(backend: &mut T, start: u64) -> Result<u64> {
    backend.seek(SeekFrom::Start(start))?;
    let mut block = [0u8; SCAN_BLOCK_SIZE];
    let mut prev = 0u8;
    let mut have_prev = false;
    let mut offset = start;
    loop {
        let len = backend.read(&mut block)?;
        if len == 0 {
            return Err(Error::Eof);
        }
        for &byte in &block[..len] {
            if have_prev && prev == BEGIN_MARKER[0] && byte == BEGIN_MARKER[1] {
                return Ok(offset - 1);
            }
            prev = byte;
            have_prev = true;
            offset += 1;
        }
    }
}

/// Searches backward from `start` (inclusive) for the begin marker,
/// reading one byte per position.
///
/// Returns the file offset of the first marker byte.
///
/// # Errors
///
/// Returns [Eof](Error::Eof) when the beginning of the file is reached
/// without a hit, or when `start` lies outside the file.
pub fn backward<T: Read + Seek>(backend: &mut T, start: u64) -> Result<u64> {
    let mut next = 0u8;
    let mut have_next = false;
    let mut offset = start;
    loop {
        backend.seek(SeekFrom::Start(offset))?;
        let mut byte = [0u8; 1];
        if backend.read(&mut byte)? != 1 {
            return Err(Error::Eof);
        }
        if have_next && byte[0] == BEGIN_MARKER[0] && next == BEGIN_MARKER[1] {
            return Ok(offset);
        }
        next = byte[0];
        have_next = true;
        if offset == 0 {
            return Err(Error::Eof);
        }
        offset -= 1;
    }
}
