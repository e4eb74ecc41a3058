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

use loz::compression::{self, rle2, CodecError, CompressionMethod};
use loz::crc8::{checksum_of, Crc8};

fn pseudo_random(len: usize, mut seed: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(len);
    for _ in 0..len {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        data.push((seed >> 24) as u8);
    }
    data
}

fn rle2_round_trip(data: &[u8]) {
    let mut packed = vec![0u8; data.len() * 2 + 2];
    let size = rle2::compress(data, &mut packed).unwrap();
    let mut back = vec![0u8; data.len()];
    let len = rle2::decompress(&packed[..size], &mut back).unwrap();
    assert_eq!(&back[..len], data);
}

#[test]
fn rle2_best_case() {
    let data = vec![0x42u8; 200];
    let mut packed = vec![0u8; 400];
    let size = rle2::compress(&data, &mut packed).unwrap();
    assert_eq!(&packed[..size], &[127, 0x42, 73, 0x42]);
    rle2_round_trip(&data);
}

#[test]
fn rle2_worst_case() {
    let data: Vec<u8> = (0..200).map(|i| (i % 2) as u8).collect();
    let mut packed = vec![0u8; 400];
    let size = rle2::compress(&data, &mut packed).unwrap();
    assert!(size <= data.len() + 2);

    // Every counter of the encoded stream must be a literal one.
    let mut pos = 0;
    while pos < size {
        let counter = packed[pos] as i8;
        assert!(counter < 0);
        pos += 1 + (-(counter as i32)) as usize;
    }
    assert_eq!(pos, size);
    rle2_round_trip(&data);
}

#[test]
fn rle2_counter_boundaries() {
    for len in [1usize, 2, 126, 127, 128, 254, 255, 256, 1000] {
        rle2_round_trip(&vec![0xA5u8; len]);
        let literal: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        rle2_round_trip(&literal);
    }
    rle2_round_trip(&pseudo_random(4096, 0xDEADBEEF));
    // Runs glued to literals around the 127 boundaries.
    let mut mixed = vec![7u8; 127];
    mixed.extend((0..127).map(|i| i as u8));
    mixed.extend(std::iter::repeat(9u8).take(128));
    mixed.push(1);
    mixed.push(1);
    rle2_round_trip(&mixed);
}

#[test]
fn rle2_rejects_malformed_streams() {
    let mut out = [0u8; 64];
    // A zero counter marks the stream as malformed.
    assert_eq!(rle2::decompress(&[0x00, 0x05], &mut out), Err(CodecError::BadData));
    // A literal running past the end of the input.
    assert_eq!(
        rle2::decompress(&[(-3i8) as u8, 1, 2], &mut out),
        Err(CodecError::Truncated)
    );
    // A run missing its byte.
    assert_eq!(rle2::decompress(&[5], &mut out), Err(CodecError::Truncated));
    // More output than the buffer can take.
    assert_eq!(rle2::decompress(&[127, 0xEE], &mut [0u8; 10]), Err(CodecError::Overflow));
}

#[test]
fn rle2_reports_output_overflow_on_encode() {
    let data: Vec<u8> = (0..100).map(|i| i as u8).collect();
    let mut packed = [0u8; 16];
    assert_eq!(rle2::compress(&data, &mut packed), Err(CodecError::Overflow));
}

#[test]
fn every_method_honors_the_size_contract() {
    let methods = [
        CompressionMethod::None,
        CompressionMethod::Rle,
        CompressionMethod::Rle2,
        CompressionMethod::Lz,
        CompressionMethod::FastLz1,
        CompressionMethod::FastLz2,
    ];
    let mut inputs: Vec<Vec<u8>> = vec![
        vec![0x00],
        vec![0xFF; 2],
        pseudo_random(1, 7),
        pseudo_random(32, 11),
        pseudo_random(4096, 13),
        vec![0x55; 4096],
        (0..=255u8).cycle().take(2560).collect(),
    ];
    let mut alternating = Vec::new();
    for i in 0..1024 {
        alternating.push((i % 2) as u8);
    }
    inputs.push(alternating);
    for method in methods {
        for data in &inputs {
            let mut packed = vec![0u8; data.len() * 2];
            let size = compression::compress(method, data, &mut packed).unwrap();
            assert!(
                size <= 2 * data.len(),
                "method {} broke the contract on {} bytes",
                method.name(),
                data.len()
            );
            if method == CompressionMethod::None {
                assert_eq!(size, data.len());
            }
            let mut back = vec![0u8; data.len()];
            let len = compression::decompress(method, &packed[..size], &mut back).unwrap();
            assert_eq!(&back[..len], &data[..], "method {}", method.name());
        }
    }
}

#[test]
fn fastlz_long_matches_and_far_distances() {
    // A long single-byte run exercises the multi-byte length encoding.
    let mut data = vec![0x11u8; 5000];
    // A block repeated 9000 bytes later exercises the level 2 far form
    // (distance above 8191), which level 1 cannot reach.
    let block = pseudo_random(512, 99);
    data.extend_from_slice(&block);
    data.extend(pseudo_random(8488, 123));
    data.extend_from_slice(&block);
    for method in [CompressionMethod::FastLz1, CompressionMethod::FastLz2] {
        let mut packed = vec![0u8; data.len() * 2];
        let size = compression::compress(method, &data, &mut packed).unwrap();
        let mut back = vec![0u8; data.len()];
        let len = compression::decompress(method, &packed[..size], &mut back).unwrap();
        assert_eq!(len, data.len(), "method {}", method.name());
        assert_eq!(back, data, "method {}", method.name());
    }
}

#[test]
fn lz_survives_marker_heavy_input() {
    // Every byte value is equally frequent, so whichever marker is picked
    // appears in the data and must be escaped.
    let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    let mut packed = vec![0u8; data.len() * 2];
    let size = compression::compress(CompressionMethod::Lz, &data, &mut packed).unwrap();
    let mut back = vec![0u8; data.len()];
    let len = compression::decompress(CompressionMethod::Lz, &packed[..size], &mut back).unwrap();
    assert_eq!(&back[..len], &data[..]);
}

#[test]
fn method_ids_and_names_round_trip() {
    for id in 0..=5u8 {
        let method = CompressionMethod::from_id(id).unwrap();
        assert_eq!(method.to_id(), id);
        assert_eq!(CompressionMethod::from_name(method.name()), Some(method));
    }
    assert!(CompressionMethod::from_id(6).is_none());
    assert!(CompressionMethod::from_name("zip").is_none());
}

#[test]
fn crc8_is_never_the_placeholder() {
    assert_ne!(checksum_of(&[]), 0x00);
    for len in 0..64usize {
        assert_ne!(checksum_of(&vec![0u8; len]), 0x00);
        assert_ne!(checksum_of(&pseudo_random(len, len as u32 + 1)), 0x00);
    }
}

#[test]
fn crc8_is_incremental() {
    let data = pseudo_random(256, 5);
    let mut chksum = Crc8::new();
    chksum.push(&data[..100]);
    chksum.push(&data[100..]);
    assert_eq!(chksum.finish(), checksum_of(&data));
}

#[test]
fn crc8_detects_single_bit_flips() {
    // Zeroed section-header fields: the checksum of this block is far from
    // the 0x00/0x01 placeholder pair, so the remap cannot mask a flip.
    let data = [0u8; 12];
    let reference = checksum_of(&data);
    for byte_index in 0..data.len() {
        for bit in 0..8 {
            let mut copy = data;
            copy[byte_index] ^= 1 << bit;
            assert_ne!(checksum_of(&copy), reference, "byte {} bit {}", byte_index, bit);
        }
    }
}
