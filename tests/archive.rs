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

use std::fs;
use std::path::{Path, PathBuf};

use loz::compression::CompressionMethod;
use loz::file::{Container, OpenMode, OpenOptions};
use loz::header::{SIZE_FILE_HEADER, SIZE_SECTION_HEADER};
use loz::{iter, Error};

const FILLER: u8 = b'?';

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 20) as u8).collect()
}

fn scratch(name: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    (dir, path)
}

fn options(mode: OpenMode, method: CompressionMethod, segment: usize) -> OpenOptions {
    OpenOptions::new()
        .mode(mode)
        .compression(method)
        .segment_size(segment)
}

fn read_all(path: &Path, segment: usize, len: usize) -> Vec<u8> {
    let mut archive = options(OpenMode::ReadOnly, CompressionMethod::None, segment)
        .open(path)
        .unwrap();
    let mut back = vec![0u8; len];
    let got = archive.read(&mut back).unwrap();
    back.truncate(got);
    back
}

fn count_sections(path: &Path) -> usize {
    let mut file = fs::File::open(path).unwrap();
    let mut current = match iter::first(&mut file) {
        Ok(header) => header,
        Err(Error::Eof) => return 0,
        Err(e) => panic!("unexpected error: {}", e),
    };
    assert!(current.verified);
    let mut count = 1;
    let mut rawpos = 0u64;
    loop {
        assert_eq!(current.rawpos as u64, rawpos, "sections must tile the raw stream");
        rawpos += current.rawsize as u64;
        match iter::next(&mut file, &current) {
            Ok(header) => {
                assert!(header.verified);
                current = header;
                count += 1;
            },
            Err(Error::Eof) => break,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    count
}

#[test]
fn round_trip_fastlz2() {
    let (_dir, path) = scratch("trip.lzf");
    let data = pattern(81920);
    let mut archive = options(OpenMode::TruncateCreate, CompressionMethod::FastLz2, 4096)
        .open(&path)
        .unwrap();
    archive.write(&data).unwrap();
    archive.close().unwrap();

    let mut archive = options(OpenMode::ReadOnly, CompressionMethod::FastLz2, 4096)
        .open(&path)
        .unwrap();
    let mut back = vec![0u8; data.len()];
    assert_eq!(archive.read(&mut back).unwrap(), data.len());
    assert_eq!(back, data);
    let mut tail = [0u8; 16];
    assert_eq!(archive.read(&mut tail).unwrap(), 0);
}

#[test]
fn round_trip_every_method() {
    let methods = [
        CompressionMethod::None,
        CompressionMethod::Rle,
        CompressionMethod::Rle2,
        CompressionMethod::Lz,
        CompressionMethod::FastLz1,
        CompressionMethod::FastLz2,
    ];
    let mut data = pattern(5000);
    data.extend(std::iter::repeat(0x42).take(3000));
    data.extend((0..2000).map(|i| (i * 7 % 251) as u8));
    for method in methods {
        let (_dir, path) = scratch("method.lzf");
        let mut archive = options(OpenMode::TruncateCreate, method, 256).open(&path).unwrap();
        archive.write(&data).unwrap();
        archive.close().unwrap();
        assert_eq!(read_all(&path, 256, data.len() + 1), data, "method {}", method.name());
    }
}

#[test]
fn incremental_append() {
    let (_dir, path) = scratch("append.lzf");
    let data = pattern(81920);

    let mut archive = options(OpenMode::TruncateCreate, CompressionMethod::FastLz2, 4096)
        .open(&path)
        .unwrap();
    archive.write(&data[..40960]).unwrap();
    archive.close().unwrap();

    let mut archive = options(OpenMode::Update, CompressionMethod::FastLz2, 4096)
        .open(&path)
        .unwrap();
    archive.write(&data[40960..]).unwrap();
    archive.close().unwrap();

    assert_eq!(read_all(&path, 4096, data.len() + 1), data);
    assert_eq!(count_sections(&path), 20);
}

#[test]
fn corrupted_payload_serves_placeholders() {
    let (_dir, path) = scratch("payload.lzf");
    let data = pattern(4096);
    let mut archive = options(OpenMode::TruncateCreate, CompressionMethod::None, 4096)
        .open(&path)
        .unwrap();
    archive.write(&data).unwrap();
    archive.close().unwrap();

    let mut bytes = fs::read(&path).unwrap();
    let crc_offset = SIZE_FILE_HEADER + SIZE_SECTION_HEADER + 4096;
    bytes[crc_offset] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    let mut archive = options(OpenMode::ReadOnly, CompressionMethod::None, 4096)
        .open(&path)
        .unwrap();
    let mut back = vec![0u8; 4096];
    assert_eq!(archive.read(&mut back).unwrap(), 4096);
    assert_eq!(back, vec![FILLER; 4096]);
    let mut tail = [0u8; 8];
    assert_eq!(archive.read(&mut tail).unwrap(), 0);
}

#[test]
fn corrupted_header_recovers_on_next_section() {
    let (_dir, path) = scratch("header.lzf");
    let data = pattern(12288);
    let mut archive = options(OpenMode::TruncateCreate, CompressionMethod::None, 4096)
        .open(&path)
        .unwrap();
    archive.write(&data).unwrap();
    archive.close().unwrap();

    // Header checksum byte of the second section.
    let second = SIZE_FILE_HEADER + (SIZE_SECTION_HEADER + 4096 + 1);
    let mut bytes = fs::read(&path).unwrap();
    bytes[second + 14] ^= 0x55;
    fs::write(&path, &bytes).unwrap();

    let back = read_all(&path, 4096, 12288);
    assert_eq!(back.len(), 12288);
    assert_eq!(&back[..4096], &data[..4096]);
    assert_eq!(&back[4096..8192], &vec![FILLER; 4096][..]);
    assert_eq!(&back[8192..], &data[8192..]);
}

#[test]
fn any_single_bit_flip_in_a_header_resynchronizes() {
    let (_dir, path) = scratch("bits.lzf");
    let data = pattern(64);
    let mut archive = options(OpenMode::TruncateCreate, CompressionMethod::None, 32)
        .open(&path)
        .unwrap();
    archive.write(&data).unwrap();
    archive.close().unwrap();
    let pristine = fs::read(&path).unwrap();

    for byte_index in 0..SIZE_SECTION_HEADER {
        for bit in 0..8 {
            let mut bytes = pristine.clone();
            bytes[SIZE_FILE_HEADER + byte_index] ^= 1 << bit;
            fs::write(&path, &bytes).unwrap();

            let back = read_all(&path, 32, 64);
            assert_eq!(back.len(), 64, "header byte {} bit {}", byte_index, bit);
            assert_eq!(
                &back[..32],
                &vec![FILLER; 32][..],
                "header byte {} bit {}",
                byte_index,
                bit
            );
            assert_eq!(&back[32..], &data[32..], "header byte {} bit {}", byte_index, bit);
        }
    }
}

#[test]
fn aborted_section_is_overwritten_on_append() {
    let (_dir, path) = scratch("aborted.lzf");
    options(OpenMode::TruncateCreate, CompressionMethod::None, 32)
        .open(&path)
        .unwrap()
        .close()
        .unwrap();

    // A section header whose checksum was never committed, as left behind
    // by a writer killed between the header and the payload.
    let mut bytes = fs::read(&path).unwrap();
    bytes.extend_from_slice(&[0xFA, 0xF5]);
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&32u32.to_le_bytes());
    bytes.extend_from_slice(&32u32.to_le_bytes());
    bytes.push(0x00);
    fs::write(&path, &bytes).unwrap();

    let data = pattern(32);
    let mut archive = options(OpenMode::Update, CompressionMethod::None, 32)
        .open(&path)
        .unwrap();
    archive.write(&data).unwrap();
    archive.close().unwrap();

    let mut file = fs::File::open(&path).unwrap();
    let first = iter::first(&mut file).unwrap();
    assert!(first.verified);
    assert_eq!(first.offset, SIZE_FILE_HEADER as u64);
    assert_eq!(first.rawpos, 0);
    assert_eq!(count_sections(&path), 1);
    assert_eq!(read_all(&path, 32, 64), data);
}

#[test]
fn empty_archive_reads_nothing() {
    let (_dir, path) = scratch("empty.lzf");
    options(OpenMode::TruncateCreate, CompressionMethod::FastLz2, 4096)
        .open(&path)
        .unwrap()
        .close()
        .unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len(), SIZE_FILE_HEADER as u64);

    let mut archive = options(OpenMode::ReadOnly, CompressionMethod::FastLz2, 4096)
        .open(&path)
        .unwrap();
    let mut back = [0u8; 32];
    assert_eq!(archive.read(&mut back).unwrap(), 0);
}

#[test]
fn single_byte_with_none_codec_is_23_bytes() {
    let (_dir, path) = scratch("single.lzf");
    let mut archive = options(OpenMode::TruncateCreate, CompressionMethod::None, 32)
        .open(&path)
        .unwrap();
    archive.write(&[0x41]).unwrap();
    archive.close().unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len(), 23);
    assert_eq!(read_all(&path, 32, 4), [0x41]);
}

#[test]
fn segment_size_bounds_are_enforced() {
    let (_dir, path) = scratch("bounds.lzf");
    for size in [31usize, 65536] {
        let result = options(OpenMode::TruncateCreate, CompressionMethod::None, size).open(&path);
        assert!(matches!(result, Err(Error::BadSegmentSize(s)) if s == size));
    }
    for size in [32usize, 65535] {
        let data = pattern(100);
        let mut archive = options(OpenMode::TruncateCreate, CompressionMethod::Rle2, size)
            .open(&path)
            .unwrap();
        archive.write(&data).unwrap();
        archive.close().unwrap();
        assert_eq!(read_all(&path, size, 101), data);
    }
}

#[test]
fn update_initializes_a_missing_archive() {
    let (_dir, path) = scratch("missing.lzf");
    let data = pattern(100);
    let mut archive = options(OpenMode::Update, CompressionMethod::Rle2, 64)
        .open(&path)
        .unwrap();
    archive.write(&data).unwrap();
    archive.close().unwrap();
    assert_eq!(read_all(&path, 64, 101), data);
}

#[test]
fn append_keeps_the_archive_method() {
    let (_dir, path) = scratch("method-kept.lzf");
    options(OpenMode::TruncateCreate, CompressionMethod::Rle2, 64)
        .open(&path)
        .unwrap()
        .close()
        .unwrap();

    let archive = options(OpenMode::Update, CompressionMethod::None, 64)
        .open(&path)
        .unwrap();
    assert_eq!(archive.compression(), CompressionMethod::Rle2);
}

#[test]
fn close_flushes_a_trailing_short_section() {
    let (_dir, path) = scratch("tail.lzf");
    let data = pattern(100);
    let mut archive = options(OpenMode::TruncateCreate, CompressionMethod::None, 64)
        .open(&path)
        .unwrap();
    archive.write(&data).unwrap();
    archive.close().unwrap();
    // One full segment and one short trailing section.
    assert_eq!(count_sections(&path), 2);
    assert_eq!(read_all(&path, 64, 101), data);
}

#[test]
fn formatted_writes_round_trip() {
    let (_dir, path) = scratch("fmt.lzf");
    let mut archive = options(OpenMode::TruncateCreate, CompressionMethod::Rle2, 64)
        .open(&path)
        .unwrap();
    archive.write_fmt(format_args!("temp={} pos={}\n", 21.5, 7)).unwrap();
    archive.write_fmt(format_args!("state={}\n", "idle")).unwrap();
    archive.close().unwrap();

    let back = read_all(&path, 64, 256);
    assert_eq!(back, b"temp=21.5 pos=7\nstate=idle\n");
}

#[test]
fn size_tracks_the_file_length() {
    let (_dir, path) = scratch("size.lzf");
    let mut archive = options(OpenMode::TruncateCreate, CompressionMethod::None, 64)
        .open(&path)
        .unwrap();
    assert_eq!(archive.size(), SIZE_FILE_HEADER as u64);
    archive.write(&pattern(64)).unwrap();
    archive.flush().unwrap();
    assert_eq!(archive.size(), fs::metadata(&path).unwrap().len());
}

#[test]
fn backward_iteration_walks_verified_sections() {
    let (_dir, path) = scratch("backward.lzf");
    let mut archive = options(OpenMode::TruncateCreate, CompressionMethod::None, 32)
        .open(&path)
        .unwrap();
    archive.write(&pattern(96)).unwrap();
    archive.close().unwrap();

    let mut file = fs::File::open(&path).unwrap();
    let last = iter::last(&mut file).unwrap();
    assert_eq!(last.rawpos, 64);
    let second = iter::prev(&mut file, &last).unwrap();
    assert_eq!(second.rawpos, 32);
    let first = iter::prev(&mut file, &second).unwrap();
    assert_eq!(first.rawpos, 0);
    assert_eq!(first.offset, SIZE_FILE_HEADER as u64);
    assert!(matches!(iter::prev(&mut file, &first), Err(Error::Eof)));
}

#[test]
fn invalid_file_headers_fail_open() {
    let (_dir, path) = scratch("badheader.lzf");

    // Unknown compression id, correct checksum.
    let mut bytes = vec![b'L', b'O', b'Z', 0x00, 0x06];
    bytes.push(loz::crc8::checksum_of(&bytes[3..5]));
    fs::write(&path, &bytes).unwrap();
    assert!(matches!(Container::open(&path), Err(Error::BadCompression(6))));

    // Unknown version, correct checksum.
    let mut bytes = vec![b'L', b'O', b'Z', 0x01, 0x00];
    bytes.push(loz::crc8::checksum_of(&bytes[3..5]));
    fs::write(&path, &bytes).unwrap();
    assert!(matches!(Container::open(&path), Err(Error::BadVersion(1))));

    // Corrupted header checksum fails open, even for update.
    options(OpenMode::TruncateCreate, CompressionMethod::None, 64)
        .open(&path)
        .unwrap()
        .close()
        .unwrap();
    let mut bytes = fs::read(&path).unwrap();
    bytes[5] ^= 0x0F;
    fs::write(&path, &bytes).unwrap();
    assert!(matches!(Container::open(&path), Err(Error::Checksum(_, _))));
    let update = options(OpenMode::Update, CompressionMethod::None, 64).open(&path);
    assert!(matches!(update, Err(Error::Checksum(_, _))));

    // Wrong signature.
    let mut bytes = fs::read(&path).unwrap();
    bytes[0] = b'X';
    fs::write(&path, &bytes).unwrap();
    assert!(matches!(Container::open(&path), Err(Error::BadSignature(_))));
}

#[test]
fn writing_a_read_only_archive_fails() {
    let (_dir, path) = scratch("ro.lzf");
    options(OpenMode::TruncateCreate, CompressionMethod::None, 64)
        .open(&path)
        .unwrap()
        .close()
        .unwrap();
    let mut archive = Container::open(&path).unwrap();
    assert!(matches!(archive.write(b"nope"), Err(Error::ReadOnly)));
}
