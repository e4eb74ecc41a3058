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

//! The LOZ archive container: streaming reads and writes over a segmented,
//! checksummed, compressed file.

use std::fmt;
use std::fs;
use std::io::{self, Seek, SeekFrom};
use std::path::Path;

use log::{debug, warn};

use crate::compression::{self, CompressionMethod};
use crate::error::{Error, Result};
use crate::header::{
    FileHeader, SectionHeader, Struct, FILLER, LOZ_CURRENT_VERSION, SEGMENT_SIZE_MAX,
    SEGMENT_SIZE_MIN, SIZE_FILE_HEADER, SIZE_SECTION_HEADER,
};
use crate::{iter, section};

/// Capacity of the scratch buffer backing formatted writes.
const STRING_SCRATCH_SIZE: usize = 16384;

/// Default segment size of newly created archives.
pub const DEFAULT_SEGMENT_SIZE: usize = 16384;

/// The way an archive is opened.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum OpenMode {
    /// Existing archive, reading only.
    ReadOnly,

    /// Read and append; a missing or empty file is initialized. Appended
    /// data lands after the last valid section, so a trailing section left
    /// by an interrupted writer is overwritten.
    Update,

    /// Create a fresh archive, truncating any existing file.
    TruncateCreate,
}

/// Utility to open or create a LOZ [Container](Container).
///
/// # Examples
///
/// ```
/// use loz::{Container, OpenMode, OpenOptions};
/// use loz::compression::CompressionMethod;
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("trace.lzf");
/// let mut archive = OpenOptions::new()
///     .mode(OpenMode::TruncateCreate)
///     .compression(CompressionMethod::Rle2)
///     .segment_size(4096)
///     .open(&path)
///     .unwrap();
/// archive.write(b"hello loz").unwrap();
/// archive.close().unwrap();
///
/// let mut archive = Container::open(&path).unwrap();
/// let mut back = [0u8; 9];
/// archive.read(&mut back).unwrap();
/// assert_eq!(&back, b"hello loz");
/// ```
pub struct OpenOptions {
    mode: OpenMode,
    segment_size: usize,
    compression: CompressionMethod,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenOptions {
    /// Creates a new set of options: read-only, 16384-byte segments,
    /// FastLZ level 2.
    pub fn new() -> OpenOptions {
        OpenOptions {
            mode: OpenMode::ReadOnly,
            segment_size: DEFAULT_SEGMENT_SIZE,
            compression: CompressionMethod::FastLz2,
        }
    }

    /// Defines the open mode.
    pub fn mode(mut self, mode: OpenMode) -> Self {
        self.mode = mode;
        self
    }

    /// Defines the segment size: the raw-byte capacity of every section.
    ///
    /// The accepted range is `[32, 65535]`. When reading an archive this
    /// must be at least the segment size the archive was written with.
    pub fn segment_size(mut self, size: usize) -> Self {
        self.segment_size = size;
        self
    }

    /// Defines the compression method recorded into newly created
    /// archives. When an existing archive is opened, the method stored in
    /// its file header wins.
    pub fn compression(mut self, method: CompressionMethod) -> Self {
        self.compression = method;
        self
    }

    /// Opens the archive at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the segment size is out of range, the file
    /// cannot be opened, or an existing file header fails validation.
    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<Container> {
        Container::with_options(path.as_ref(), self.mode, self.segment_size, self.compression)
    }
}

/// An open LOZ archive.
///
/// Written bytes accumulate in a segment buffer and are flushed as one
/// compressed, checksummed section when the buffer fills, on
/// [flush](Self::flush) and on close. Read bytes are served from decoded
/// sections; a damaged section does not fail the read but yields
/// placeholder bytes (`?`) for its part of the stream, so offsets past the
/// damage stay meaningful.
pub struct Container {
    file: fs::File,
    mode: OpenMode,
    version: u8,
    compression: CompressionMethod,
    segment_size: usize,
    filesize: u64,
    rd_fpos: u64,
    wr_fpos: u64,
    rd_rawpos: u64,
    wr_rawpos: u64,
    rdbuff: Vec<u8>,
    rdbuff_pos: usize,
    rdbuff_len: usize,
    wrbuff: Vec<u8>,
    lzbuff: Vec<u8>,
    strbuff: String,
}

impl Container {
    /// Opens an existing archive read-only.
    ///
    /// The handle uses the largest supported segment size so any archive
    /// can be decoded regardless of the segment size it was written with.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Container> {
        OpenOptions::new().segment_size(SEGMENT_SIZE_MAX).open(path)
    }

    /// Creates a fresh archive, truncating any existing file at `path`.
    pub fn create<P: AsRef<Path>>(
        path: P,
        compression: CompressionMethod,
        segment_size: usize,
    ) -> Result<Container> {
        OpenOptions::new()
            .mode(OpenMode::TruncateCreate)
            .compression(compression)
            .segment_size(segment_size)
            .open(path)
    }

    fn with_options(
        path: &Path,
        mode: OpenMode,
        segment_size: usize,
        compression: CompressionMethod,
    ) -> Result<Container> {
        if !(SEGMENT_SIZE_MIN..=SEGMENT_SIZE_MAX).contains(&segment_size) {
            return Err(Error::BadSegmentSize(segment_size));
        }
        let file = match mode {
            OpenMode::ReadOnly => fs::File::open(path)?,
            OpenMode::Update => fs::OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .open(path)?,
            OpenMode::TruncateCreate => fs::OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?,
        };
        let mut container = Container {
            file,
            mode,
            version: LOZ_CURRENT_VERSION,
            compression,
            segment_size,
            filesize: 0,
            rd_fpos: SIZE_FILE_HEADER as u64,
            wr_fpos: SIZE_FILE_HEADER as u64,
            rd_rawpos: 0,
            wr_rawpos: 0,
            rdbuff: vec![0; segment_size],
            rdbuff_pos: 0,
            rdbuff_len: 0,
            wrbuff: Vec::with_capacity(segment_size),
            lzbuff: vec![0; 2 * segment_size],
            strbuff: String::with_capacity(STRING_SCRATCH_SIZE),
        };
        match mode {
            OpenMode::ReadOnly => container.init_existing()?,
            OpenMode::TruncateCreate => container.init_fresh()?,
            OpenMode::Update => {
                let size = container.file.seek(SeekFrom::End(0))?;
                if size == 0 {
                    container.init_fresh()?;
                } else {
                    container.init_existing()?;
                    container.locate_append_position()?;
                }
            },
        }
        Ok(container)
    }

    fn init_fresh(&mut self) -> Result<()> {
        let header = FileHeader::new(self.compression);
        self.file.seek(SeekFrom::Start(0))?;
        header.write(&mut self.file)?;
        self.filesize = SIZE_FILE_HEADER as u64;
        debug!(
            "created archive: version={}, compression={}",
            self.version,
            self.compression.name()
        );
        Ok(())
    }

    fn init_existing(&mut self) -> Result<()> {
        self.filesize = self.file.seek(SeekFrom::End(0))?;
        self.file.seek(SeekFrom::Start(0))?;
        let header = FileHeader::read(&mut self.file)?;
        self.version = header.version;
        self.compression = header.compression;
        debug!(
            "opened archive: version={}, compression={}",
            self.version,
            self.compression.name()
        );
        Ok(())
    }

    fn locate_append_position(&mut self) -> Result<()> {
        match iter::last(&mut self.file) {
            Ok(last) => {
                self.wr_fpos = last.end();
                self.wr_rawpos = last.rawpos_end();
                debug!(
                    "appending after the section at offset {} (raw position {})",
                    last.offset, self.wr_rawpos
                );
                Ok(())
            },
            Err(Error::Eof) => {
                self.wr_fpos = SIZE_FILE_HEADER as u64;
                self.wr_rawpos = 0;
                debug!("archive holds no valid section, appending from the start");
                Ok(())
            },
            Err(e) => Err(e),
        }
    }

    /// Returns the compression method applied to the sections of this
    /// archive.
    pub fn compression(&self) -> CompressionMethod {
        self.compression
    }

    /// Returns the format version of this archive.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Returns the segment size this handle was opened with.
    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    /// Returns the size in bytes of the archive file as tracked by this
    /// handle. Raw bytes still sitting in the segment buffer are not
    /// counted until they are flushed.
    pub fn size(&self) -> u64 {
        self.filesize
    }

    /// Appends raw bytes to the archive.
    ///
    /// Bytes accumulate in the segment buffer; every full segment is
    /// compressed and written out as one section. Returns the number of
    /// bytes consumed, which is always `data.len()` on success.
    ///
    /// # Errors
    ///
    /// Returns [ReadOnly](Error::ReadOnly) when the archive was opened
    /// read-only. IO and codec failures abort the call; a partially
    /// written trailing section then remains detectably invalid on disk
    /// and is overwritten by the next update open.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        if self.mode == OpenMode::ReadOnly {
            return Err(Error::ReadOnly);
        }
        let mut consumed = 0;
        while consumed < data.len() {
            let space = self.segment_size - self.wrbuff.len();
            let take = space.min(data.len() - consumed);
            self.wrbuff.extend_from_slice(&data[consumed..consumed + take]);
            self.wr_rawpos += take as u64;
            consumed += take;
            if self.wrbuff.len() >= self.segment_size {
                self.flush_segment()?;
            }
        }
        Ok(data.len())
    }

    /// Reads raw bytes from the archive into `out`.
    ///
    /// Damaged sections are served as placeholder bytes of their inferred
    /// raw length instead of failing the call, so the logical stream keeps
    /// its layout. A short count is only returned at the end of the
    /// stream.
    pub fn read(&mut self, out: &mut [u8]) -> Result<usize> {
        let mut produced = 0;
        while produced < out.len() {
            if self.rdbuff_pos >= self.rdbuff_len && !self.fetch_section()? {
                break;
            }
            let take = (self.rdbuff_len - self.rdbuff_pos).min(out.len() - produced);
            out[produced..produced + take]
                .copy_from_slice(&self.rdbuff[self.rdbuff_pos..self.rdbuff_pos + take]);
            self.rdbuff_pos += take;
            self.rd_rawpos += take as u64;
            produced += take;
        }
        Ok(produced)
    }

    /// Appends formatted text to the archive through the string scratch
    /// buffer, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Fails unless the whole formatted string is consumed by the stream.
    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<usize> {
        use fmt::Write;
        self.strbuff.clear();
        if self.strbuff.write_fmt(args).is_err() {
            return Err(Error::Io(io::Error::from(io::ErrorKind::InvalidData)));
        }
        let text = std::mem::take(&mut self.strbuff);
        let outcome = self.write(text.as_bytes());
        let bytes = text.len();
        self.strbuff = text;
        if outcome? != bytes {
            return Err(Error::Io(io::Error::from(io::ErrorKind::WriteZero)));
        }
        Ok(bytes)
    }

    /// Flushes the segment buffer as a (possibly short) section and syncs
    /// the underlying file. A no-op when no bytes are buffered.
    pub fn flush(&mut self) -> Result<()> {
        if self.mode == OpenMode::ReadOnly {
            return Ok(());
        }
        self.flush_segment()?;
        io::Write::flush(&mut self.file)?;
        Ok(())
    }

    /// Flushes pending data and closes the archive.
    ///
    /// Dropping the handle also flushes, but without a way to report
    /// failures.
    pub fn close(mut self) -> Result<()> {
        self.flush()
    }

    fn flush_segment(&mut self) -> Result<()> {
        if self.wrbuff.is_empty() {
            return Ok(());
        }
        let compsize = compression::compress(self.compression, &self.wrbuff, &mut self.lzbuff)?;
        let header = SectionHeader {
            offset: self.wr_fpos,
            rawpos: (self.wr_rawpos - self.wrbuff.len() as u64) as u32,
            rawsize: self.wrbuff.len() as u32,
            compsize: compsize as u32,
            verified: false,
        };
        let crc = section::write_header(&mut self.file, &header)?;
        section::write_payload(
            &mut self.file,
            self.wr_fpos + SIZE_SECTION_HEADER as u64,
            &self.lzbuff[..compsize],
        )?;
        section::commit_header_crc(&mut self.file, &header, crc)?;
        self.wr_fpos = header.end();
        if self.wr_fpos > self.filesize {
            self.filesize = self.wr_fpos;
        }
        self.wrbuff.clear();
        Ok(())
    }

    // Decodes the next section into the read buffer. Returns false at the
    // end of the stream.
    fn fetch_section(&mut self) -> Result<bool> {
        loop {
            let mut current = match section::read_header(&mut self.file, self.rd_fpos) {
                Ok(header) => header,
                Err(Error::Eof) => return Ok(false),
                Err(e) => return Err(e),
            };
            if current.verified
                && (current.rawsize as usize > self.segment_size
                    || current.compsize as usize > self.lzbuff.len())
            {
                // The checksum matched but the sizes cannot belong to this
                // archive; recover as if the header were damaged.
                current.verified = false;
            }
            if current.verified {
                let payload = &mut self.lzbuff[..current.compsize as usize];
                match section::read_payload(
                    &mut self.file,
                    current.offset + SIZE_SECTION_HEADER as u64,
                    payload,
                ) {
                    Ok(()) => {
                        let size = compression::decompress(
                            self.compression,
                            &self.lzbuff[..current.compsize as usize],
                            &mut self.rdbuff,
                        )?;
                        self.rdbuff_len = size;
                    },
                    Err(Error::Checksum(expected, actual)) => {
                        warn!(
                            "section at offset {} has a corrupted payload (checksum {:#04X}, expected {:#04X}), serving {} placeholder bytes",
                            current.offset, actual, expected, current.rawsize
                        );
                        self.rdbuff[..current.rawsize as usize].fill(FILLER);
                        self.rdbuff_len = current.rawsize as usize;
                    },
                    Err(Error::Eof) => return Ok(false),
                    Err(e) => return Err(e),
                }
                self.rd_fpos = current.end();
            } else {
                let next = match iter::next(&mut self.file, &current) {
                    Ok(header) => header,
                    Err(Error::Io(e)) => return Err(Error::Io(e)),
                    Err(_) => {
                        warn!(
                            "section at offset {} is damaged and no later section is recoverable",
                            current.offset
                        );
                        return Ok(false);
                    },
                };
                let inferred = match (next.rawpos as u64).checked_sub(self.rd_rawpos) {
                    Some(len) if len as usize <= self.segment_size => len as usize,
                    _ => {
                        warn!(
                            "cannot infer the raw size of the damaged section at offset {}",
                            current.offset
                        );
                        return Ok(false);
                    },
                };
                self.rd_fpos = next.offset;
                if inferred == 0 {
                    continue;
                }
                warn!(
                    "section at offset {} is damaged, serving {} placeholder bytes",
                    current.offset, inferred
                );
                self.rdbuff[..inferred].fill(FILLER);
                self.rdbuff_len = inferred;
            }
            self.rdbuff_pos = 0;
            return Ok(true);
        }
    }
}

impl io::Read for Container {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Container::read(self, buf).map_err(io::Error::from)
    }
}

impl io::Write for Container {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Container::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Container::flush(self).map_err(io::Error::from)
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        // close() already drained the buffer, in which case this is a
        // no-op.
        if let Err(e) = self.flush() {
            warn!("could not flush the archive on drop: {}", e);
        }
    }
}
