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

//! Traversal over the sections of an archive.
//!
//! A verified header gives the exact position of its successor, so forward
//! steps prefer the header chain; everything else falls back to marker
//! scanning, where only a header that passes its checksum terminates the
//! search. A marker hit that does not verify is a false positive (payload
//! bytes, or a damaged section) and is skipped.

use std::io::{Read, Seek, SeekFrom};

use log::debug;

use crate::error::{Error, Result};
use crate::header::{SectionHeader, SIZE_FILE_HEADER};
use crate::{scan, section};

/// Reads the header of the first section of the file.
///
/// The returned header may be unverified when the first section is
/// damaged; policy is left to the caller.
///
/// # Errors
///
/// Returns [Eof](Error::Eof) when the file holds no section at all.
pub fn first<T: Read + Seek>(backend: &mut T) -> Result<SectionHeader> {
    section::read_header(backend, SIZE_FILE_HEADER as u64)
}

/// Locates the section following `current`.
///
/// When `current` is verified, the next header is read directly after its
/// payload and returned as-is, verified or not. When `current` is not
/// verified its sizes cannot be trusted, so the file is scanned forward
/// from `current.offset + 1` and only a verified header is returned.
///
/// # Errors
///
/// Returns [Eof](Error::Eof) when no further section exists.
pub fn next<T: Read + Seek>(backend: &mut T, current: &SectionHeader) -> Result<SectionHeader> {
    if current.verified {
        return section::read_header(backend, current.end());
    }
    let mut fpos = current.offset;
    loop {
        fpos = scan::forward(backend, fpos + 1)?;
        match section::read_header(backend, fpos) {
            Ok(header) if header.verified => {
                debug!("resynchronized on a section at offset {}", fpos);
                return Ok(header);
            },
            Ok(_) => {},
            Err(e) => return Err(e),
        }
    }
}

/// Locates the closest verified section before `current`.
///
/// # Errors
///
/// Returns [Eof](Error::Eof) when no verified section precedes `current`.
pub fn prev<T: Read + Seek>(backend: &mut T, current: &SectionHeader) -> Result<SectionHeader> {
    if current.offset == 0 {
        return Err(Error::Eof);
    }
    scan_back(backend, current.offset - 1)
}

/// Locates the last verified section of the file.
///
/// # Errors
///
/// Returns [Eof](Error::Eof) when the file holds no verified section.
pub fn last<T: Read + Seek>(backend: &mut T) -> Result<SectionHeader> {
    let size = backend.seek(SeekFrom::End(0))?;
    if size == 0 {
        return Err(Error::Eof);
    }
    scan_back(backend, size - 1)
}

fn scan_back<T: Read + Seek>(backend: &mut T, from: u64) -> Result<SectionHeader> {
    let mut fpos = from;
    loop {
        fpos = scan::backward(backend, fpos)?;
        match section::read_header(backend, fpos) {
            Ok(header) if header.verified => return Ok(header),
            // A false positive, a damaged section, or a header truncated by
            // the end of the file; keep scanning backward.
            Ok(_) | Err(Error::Eof) => {},
            Err(e) => return Err(e),
        }
        if fpos == 0 {
            return Err(Error::Eof);
        }
        fpos -= 1;
    }
}
