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

//! Run-length codec with signed 8-bit counters.
//!
//! The encoded stream is a sequence of (counter, payload) records. A
//! counter in `[1, 127]` repeats the single following byte that many
//! times; a counter in `[-127, -1]` copies the next `-counter` bytes
//! verbatim. The counter value `0` never appears in well-formed data and
//! makes decoding fail, so zeroed disk regions are caught in-band.

use super::CodecError;

/// Compresses `input` into `output`, returning the encoded size.
pub fn compress(input: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
    if input.is_empty() {
        return Ok(0);
    }
    // `cntr` indexes the counter byte of the record being built, `out` the
    // last byte written so far.
    let mut cntr = 0usize;
    let mut out = 1usize;
    if out >= output.len() {
        return Err(CodecError::Overflow);
    }
    output[cntr] = 1;
    output[out] = input[0];
    let mut prev = input[0];
    for &byte in &input[1..] {
        let count = output[cntr] as i8;
        if byte == prev {
            if count < 0 {
                // The last literal byte becomes the seed of a run of 2.
                output[cntr] = (count + 1) as u8;
                cntr = out;
                out += 1;
                if out >= output.len() {
                    return Err(CodecError::Overflow);
                }
                output[cntr] = 2;
                output[out] = byte;
            } else if count == 127 {
                out += 1;
                if out >= output.len() {
                    return Err(CodecError::Overflow);
                }
                cntr = out;
                out += 1;
                if out >= output.len() {
                    return Err(CodecError::Overflow);
                }
                output[cntr] = 1;
                output[out] = byte;
            } else {
                output[cntr] = (count + 1) as u8;
            }
        } else if count == 1 {
            // A singleton run turns into a literal of 2.
            out += 1;
            if out >= output.len() {
                return Err(CodecError::Overflow);
            }
            output[cntr] = (-2i8) as u8;
            output[out] = byte;
        } else if count > 1 {
            out += 1;
            if out >= output.len() {
                return Err(CodecError::Overflow);
            }
            cntr = out;
            out += 1;
            if out >= output.len() {
                return Err(CodecError::Overflow);
            }
            output[cntr] = 1;
            output[out] = byte;
        } else if count == -127 {
            out += 1;
            if out >= output.len() {
                return Err(CodecError::Overflow);
            }
            cntr = out;
            out += 1;
            if out >= output.len() {
                return Err(CodecError::Overflow);
            }
            output[cntr] = 1;
            output[out] = byte;
        } else {
            out += 1;
            if out >= output.len() {
                return Err(CodecError::Overflow);
            }
            output[out] = byte;
            output[cntr] = (count - 1) as u8;
        }
        prev = byte;
    }
    Ok(out + 1)
}

/// Decompresses `input` into `output`, returning the decoded size.
pub fn decompress(input: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
    if input.is_empty() {
        return Ok(0);
    }
    let mut pos = 0usize;
    let mut out = 0usize;
    while pos < input.len() {
        let cntr = input[pos] as i8;
        pos += 1;
        if cntr > 0 {
            let count = cntr as usize;
            if pos >= input.len() {
                return Err(CodecError::Truncated);
            }
            if out + count > output.len() {
                return Err(CodecError::Overflow);
            }
            output[out..out + count].fill(input[pos]);
            pos += 1;
            out += count;
        } else if cntr < 0 {
            let count = -(cntr as i32) as usize;
            if out + count > output.len() {
                return Err(CodecError::Overflow);
            }
            if pos + count > input.len() {
                return Err(CodecError::Truncated);
            }
            output[out..out + count].copy_from_slice(&input[pos..pos + count]);
            pos += count;
            out += count;
        } else {
            return Err(CodecError::BadData);
        }
    }
    Ok(out)
}
