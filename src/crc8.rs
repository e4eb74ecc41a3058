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

//! One-byte checksums over headers and payloads (CRC8, polynomial
//! `x^8 + x^2 + x + 1`).

use once_cell::sync::Lazy;

const POLYNOMIAL: u8 = 0x07;

/// Initial value of every checksum computation.
pub const CRC8_INIT: u8 = 0xFF;

/// On-disk value reserved to mark a checksum that has not been committed
/// yet; never produced by [finish](Crc8::finish).
pub const CRC_PLACEHOLDER: u8 = 0x00;

static TABLE: Lazy<[u8; 256]> = Lazy::new(|| {
    let mut table = [0; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut crc = i as u8;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
        }
        *entry = crc;
    }
    table
});

/// CRC8 checksum state.
pub struct Crc8 {
    current: u8,
}

impl Crc8 {
    /// Creates a new checksum computation.
    pub fn new() -> Crc8 {
        Crc8 { current: CRC8_INIT }
    }

    /// Feeds a buffer into the checksum.
    pub fn push(&mut self, buffer: &[u8]) {
        for byte in buffer {
            self.current = TABLE[(self.current ^ *byte) as usize];
        }
    }

    /// Finishes the computation and returns a persistable checksum.
    ///
    /// A raw result of `0x00` is replaced by `0x01`: `0x00` on disk is
    /// reserved for headers whose checksum has not been committed yet, so
    /// persisted checksums are always in `[0x01, 0xFF]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use loz::crc8::Crc8;
    ///
    /// let mut chksum = Crc8::new();
    /// chksum.push(b"123456789");
    /// assert_ne!(chksum.finish(), 0x00);
    /// ```
    pub fn finish(self) -> u8 {
        if self.current == CRC_PLACEHOLDER {
            0x01
        } else {
            self.current
        }
    }
}

impl Default for Crc8 {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the persistable checksum of a byte slice in one call.
pub fn checksum_of(buffer: &[u8]) -> u8 {
    let mut chksum = Crc8::new();
    chksum.push(buffer);
    chksum.finish()
}
