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

//! Simple run-length codec: the stream is a sequence of (count, byte)
//! pairs, each expanding to `count` copies of `byte`. Worst case output is
//! exactly twice the input, the upper bound of the codec contract.

use super::CodecError;

/// Compresses `input` into `output`, returning the encoded size.
pub fn compress(input: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
    let mut out = 0usize;
    let mut pos = 0usize;
    while pos < input.len() {
        let byte = input[pos];
        let mut count = 1usize;
        while count < 255 && pos + count < input.len() && input[pos + count] == byte {
            count += 1;
        }
        if out + 2 > output.len() {
            return Err(CodecError::Overflow);
        }
        output[out] = count as u8;
        output[out + 1] = byte;
        out += 2;
        pos += count;
    }
    Ok(out)
}

/// Decompresses `input` into `output`, returning the decoded size.
pub fn decompress(input: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
    if input.len() % 2 != 0 {
        return Err(CodecError::Truncated);
    }
    let mut out = 0usize;
    for pair in input.chunks_exact(2) {
        let count = pair[0] as usize;
        if count == 0 {
            return Err(CodecError::BadData);
        }
        if out + count > output.len() {
            return Err(CodecError::Overflow);
        }
        output[out..out + count].fill(pair[1]);
        out += count;
    }
    Ok(out)
}
