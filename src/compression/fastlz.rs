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

//! FastLZ-family codec, levels 1 and 2.
//!
//! The stream is a sequence of opcodes. An opcode below 32 starts a
//! literal run of `opcode + 1` bytes. Any other opcode is a back-reference
//! whose top 3 bits carry the length class and whose low 5 bits carry the
//! high bits of the distance; level 2 extends lengths past 264 with 255
//! continuation bytes and distances past 8 KiB with a 16-bit far form. The
//! level is tagged in the top 3 bits of the very first opcode, which is
//! always a literal run.

use super::CodecError;

const MAX_COPY: usize = 32;
const MAX_LEN: usize = 264;
const MAX_L1_DISTANCE: usize = 8192;
const MAX_L2_DISTANCE: usize = 8191;
const MAX_FAR_DISTANCE: usize = 65535 + MAX_L2_DISTANCE - 1;
const HASH_LOG: u32 = 13;

fn hash3(bytes: &[u8]) -> usize {
    let v = u32::from(bytes[0]) | u32::from(bytes[1]) << 8 | u32::from(bytes[2]) << 16;
    (v.wrapping_mul(2654435761) >> (32 - HASH_LOG)) as usize
}

fn push(output: &mut [u8], out: &mut usize, byte: u8) -> Result<(), CodecError> {
    if *out >= output.len() {
        return Err(CodecError::Overflow);
    }
    output[*out] = byte;
    *out += 1;
    Ok(())
}

fn flush_literals(
    input: &[u8],
    from: usize,
    to: usize,
    output: &mut [u8],
    out: &mut usize,
) -> Result<(), CodecError> {
    let mut anchor = from;
    while anchor < to {
        let run = (to - anchor).min(MAX_COPY);
        if *out + run + 1 > output.len() {
            return Err(CodecError::Overflow);
        }
        output[*out] = (run - 1) as u8;
        *out += 1;
        output[*out..*out + run].copy_from_slice(&input[anchor..anchor + run]);
        *out += run;
        anchor += run;
    }
    Ok(())
}

fn emit_match1(
    len: usize,
    dist: usize,
    output: &mut [u8],
    out: &mut usize,
) -> Result<(), CodecError> {
    let dist = dist - 1;
    if len <= 8 {
        push(output, out, (((len - 2) << 5) | (dist >> 8)) as u8)?;
        push(output, out, (dist & 0xFF) as u8)?;
    } else {
        push(output, out, ((7 << 5) | (dist >> 8)) as u8)?;
        push(output, out, (len - 9) as u8)?;
        push(output, out, (dist & 0xFF) as u8)?;
    }
    Ok(())
}

fn emit_match2(
    len: usize,
    dist: usize,
    output: &mut [u8],
    out: &mut usize,
) -> Result<(), CodecError> {
    let mut code = len - 2;
    let dist = dist - 1;
    if dist < MAX_L2_DISTANCE {
        if code < 7 {
            push(output, out, ((code << 5) | (dist >> 8)) as u8)?;
            push(output, out, (dist & 0xFF) as u8)?;
        } else {
            push(output, out, ((7 << 5) | (dist >> 8)) as u8)?;
            code -= 7;
            while code >= 255 {
                push(output, out, 255)?;
                code -= 255;
            }
            push(output, out, code as u8)?;
            push(output, out, (dist & 0xFF) as u8)?;
        }
    } else {
        let far = dist - MAX_L2_DISTANCE;
        if code < 7 {
            push(output, out, (((code << 5) | 31) as u8))?;
            push(output, out, 255)?;
            push(output, out, (far >> 8) as u8)?;
            push(output, out, (far & 0xFF) as u8)?;
        } else {
            push(output, out, ((7 << 5) | 31) as u8)?;
            code -= 7;
            while code >= 255 {
                push(output, out, 255)?;
                code -= 255;
            }
            push(output, out, code as u8)?;
            push(output, out, 255)?;
            push(output, out, (far >> 8) as u8)?;
            push(output, out, (far & 0xFF) as u8)?;
        }
    }
    Ok(())
}

/// Compresses `input` into `output` at the given level (1 or 2), returning
/// the encoded size.
pub fn compress(level: u8, input: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
    if input.is_empty() {
        return Ok(0);
    }
    let max_distance = if level == 1 {
        MAX_L1_DISTANCE
    } else {
        MAX_FAR_DISTANCE
    };
    let mut table = vec![usize::MAX; 1 << HASH_LOG];
    let mut out = 0usize;
    let mut anchor = 0usize;
    let mut pos = 0usize;
    while pos < input.len() {
        let mut match_len = 0usize;
        let mut match_dist = 0usize;
        if pos + 3 <= input.len() {
            let slot = hash3(&input[pos..]);
            let candidate = table[slot];
            table[slot] = pos;
            if candidate != usize::MAX && pos - candidate <= max_distance {
                let limit = if level == 1 {
                    (input.len() - pos).min(MAX_LEN)
                } else {
                    input.len() - pos
                };
                let mut len = 0usize;
                while len < limit && input[candidate + len] == input[pos + len] {
                    len += 1;
                }
                // Far level-2 references cost 4 to 5 bytes, take them only
                // when they pay for themselves.
                let far = level == 2 && pos - candidate > MAX_L2_DISTANCE;
                if len >= 3 && (!far || len >= 5) {
                    match_len = len;
                    match_dist = pos - candidate;
                }
            }
        }
        if match_len > 0 {
            flush_literals(input, anchor, pos, output, &mut out)?;
            if level == 1 {
                emit_match1(match_len, match_dist, output, &mut out)?;
            } else {
                emit_match2(match_len, match_dist, output, &mut out)?;
            }
            pos += match_len;
            anchor = pos;
        } else {
            pos += 1;
        }
    }
    flush_literals(input, anchor, input.len(), output, &mut out)?;
    output[0] |= (level - 1) << 5;
    Ok(out)
}

/// Decompresses `input` into `output`, dispatching on the level recorded
/// in the stream; returns the decoded size.
pub fn decompress(input: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
    if input.is_empty() {
        return Ok(0);
    }
    match (input[0] >> 5) + 1 {
        1 => decompress1(input, output),
        2 => decompress2(input, output),
        _ => Err(CodecError::BadData),
    }
}

fn copy_match(
    output: &mut [u8],
    out: &mut usize,
    dist: usize,
    len: usize,
) -> Result<(), CodecError> {
    if dist == 0 || dist > *out {
        return Err(CodecError::BadData);
    }
    if *out + len > output.len() {
        return Err(CodecError::Overflow);
    }
    for i in 0..len {
        output[*out + i] = output[*out - dist + i];
    }
    *out += len;
    Ok(())
}

fn decompress1(input: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
    let mut pos = 1usize;
    let mut out = 0usize;
    let mut ctrl = (input[0] & 31) as usize;
    loop {
        if ctrl >= 32 {
            let mut len = (ctrl >> 5) - 1;
            let ofs = (ctrl & 31) << 8;
            if len == 6 {
                if pos >= input.len() {
                    return Err(CodecError::Truncated);
                }
                len += input[pos] as usize;
                pos += 1;
            }
            if pos >= input.len() {
                return Err(CodecError::Truncated);
            }
            let dist = ofs + input[pos] as usize + 1;
            pos += 1;
            copy_match(output, &mut out, dist, len + 3)?;
        } else {
            let count = ctrl + 1;
            if pos + count > input.len() {
                return Err(CodecError::Truncated);
            }
            if out + count > output.len() {
                return Err(CodecError::Overflow);
            }
            output[out..out + count].copy_from_slice(&input[pos..pos + count]);
            pos += count;
            out += count;
        }
        if pos < input.len() {
            ctrl = input[pos] as usize;
            pos += 1;
        } else {
            break;
        }
    }
    Ok(out)
}

fn decompress2(input: &[u8], output: &mut [u8]) -> Result<usize, CodecError> {
    let mut pos = 1usize;
    let mut out = 0usize;
    let mut ctrl = (input[0] & 31) as usize;
    loop {
        if ctrl >= 32 {
            let mut len = (ctrl >> 5) - 1;
            let ofs = (ctrl & 31) << 8;
            if len == 6 {
                loop {
                    if pos >= input.len() {
                        return Err(CodecError::Truncated);
                    }
                    let code = input[pos] as usize;
                    pos += 1;
                    len += code;
                    if code != 255 {
                        break;
                    }
                }
            }
            if pos >= input.len() {
                return Err(CodecError::Truncated);
            }
            let code = input[pos] as usize;
            pos += 1;
            let mut dist = ofs + code + 1;
            if code == 255 && ofs == (31 << 8) {
                if pos + 2 > input.len() {
                    return Err(CodecError::Truncated);
                }
                let far = (input[pos] as usize) << 8 | input[pos + 1] as usize;
                pos += 2;
                dist = far + MAX_L2_DISTANCE + 1;
            }
            copy_match(output, &mut out, dist, len + 3)?;
        } else {
            let count = ctrl + 1;
            if pos + count > input.len() {
                return Err(CodecError::Truncated);
            }
            if out + count > output.len() {
                return Err(CodecError::Overflow);
            }
            output[out..out + count].copy_from_slice(&input[pos..pos + count]);
            pos += count;
            out += count;
        }
        if pos < input.len() {
            ctrl = input[pos] as usize;
            pos += 1;
        } else {
            break;
        }
    }
    Ok(out)
}
