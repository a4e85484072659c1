//! Streaming access to a single entry's content.

use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::{self, Read};

use crate::io::ReadAt;

use super::structures::{CompressionMethod, ZipFileEntry, invalid};

/// Reads the byte range `[pos, end)` of the archive.
struct RangeReader<'a, R: ReadAt> {
    reader: &'a R,
    pos: u64,
    end: u64,
}

impl<R: ReadAt> Read for RangeReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.end - self.pos;
        let want = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        if want == 0 {
            return Ok(0);
        }

        let n = self.reader.read_at(self.pos, &mut buf[..want])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "archive truncated inside entry data",
            ));
        }
        self.pos += n as u64;
        Ok(n)
    }
}

enum Decoder<'a, R: ReadAt> {
    Stored(RangeReader<'a, R>),
    Deflate(DeflateDecoder<RangeReader<'a, R>>),
}

/// Decompressed content of one entry.
///
/// The CRC-32 and uncompressed size recorded in the Central Directory are
/// checked when the stream reaches its end; a mismatch surfaces as an
/// `InvalidData` error from the final `read`.
pub struct EntryReader<'a, R: ReadAt> {
    decoder: Decoder<'a, R>,
    crc: Crc,
    expected_crc: u32,
    expected_size: u64,
    read: u64,
}

impl<'a, R: ReadAt> EntryReader<'a, R> {
    pub(crate) fn new(reader: &'a R, data_offset: u64, entry: &ZipFileEntry) -> Self {
        let raw = RangeReader {
            reader,
            pos: data_offset,
            end: data_offset + entry.compressed_size,
        };
        let decoder = match entry.compression_method {
            CompressionMethod::Deflate => Decoder::Deflate(DeflateDecoder::new(raw)),
            // Unknown methods are refused before an EntryReader is built
            CompressionMethod::Stored | CompressionMethod::Unknown(_) => Decoder::Stored(raw),
        };

        Self {
            decoder,
            crc: Crc::new(),
            expected_crc: entry.crc32,
            expected_size: entry.uncompressed_size,
            read: 0,
        }
    }

    fn verify(&self) -> io::Result<()> {
        if self.read != self.expected_size {
            return Err(invalid("entry size does not match the Central Directory"));
        }
        if self.crc.sum() != self.expected_crc {
            return Err(invalid("CRC-32 mismatch"));
        }
        Ok(())
    }
}

impl<R: ReadAt> Read for EntryReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let n = match &mut self.decoder {
            Decoder::Stored(r) => r.read(buf)?,
            Decoder::Deflate(r) => r.read(buf)?,
        };

        if n == 0 {
            self.verify()?;
            return Ok(0);
        }

        self.read += n as u64;
        if self.read > self.expected_size {
            return Err(invalid("entry is larger than declared"));
        }
        self.crc.update(&buf[..n]);
        Ok(n)
    }
}
