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

//! Contains various utilities to be used by other modules.

use std::io;

/// Extension of [Read](std::io::Read) to fill a buffer from repeated reads.
pub trait ReadFill {
    /// Reads into `buf` until it is full or the underlying stream is
    /// exhausted. Returns the number of bytes placed into `buf`.
    ///
    /// # Errors
    ///
    /// Returns an [Error](std::io::Error) if the underlying stream could
    /// not be read.
    fn read_fill(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<T: io::Read> ReadFill for T {
    fn read_fill(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut bytes = 0;
        while bytes < buf.len() {
            let len = self.read(&mut buf[bytes..])?;
            if len == 0 {
                break;
            }
            bytes += len;
        }
        Ok(bytes)
    }
}
