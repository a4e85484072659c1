//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures,
//! reading from any source that implements the [`ReadAt`] trait.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all files
//! 4. For extraction, read each file's Local File Header and data
//!
//! Malformed structures are reported as [`std::io::ErrorKind::InvalidData`].

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Cursor, Read};

use crate::io::ReadAt;

use super::entry::EntryReader;
use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// ZIP64 extended information extra field ID
const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Low-level ZIP file parser.
///
/// Generic over the reader type so the same code reads archives from
/// local files and from in-memory buffers.
///
/// ## Example
///
/// ```ignore
/// let parser = ZipParser::new(reader);
/// for entry in parser.list_files()? {
///     let mut data = parser.open_entry(&entry)?;
///     std::io::copy(&mut data, &mut std::io::sink())?;
/// }
/// ```
pub struct ZipParser<R: ReadAt> {
    /// The underlying data source
    reader: R,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    /// Create a new parser for the given reader.
    pub fn new(reader: R) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Handles both the simple case (no comment) and archives with
    /// comments by searching backwards for the signature.
    ///
    /// Returns a tuple of (EOCD record, offset of EOCD in file).
    pub fn find_eocd(&self) -> io::Result<(EndOfCentralDirectory, u64)> {
        // Common case first: no comment, EOCD is the last 22 bytes
        if self.size >= EndOfCentralDirectory::SIZE as u64 {
            let offset = self.size - EndOfCentralDirectory::SIZE as u64;
            let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
            self.reader.read_exact_at(offset, &mut buf)?;

            if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
                let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
                return Ok((eocd, offset));
            }
        }

        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf)?;

        // Search backwards for EOCD signature (PK\x05\x06)
        for i in (0..buf.len().saturating_sub(EndOfCentralDirectory::SIZE)).rev() {
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                // The comment length field must account for every remaining byte
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(
                        &buf[i..i + EndOfCentralDirectory::SIZE],
                    )?;
                    return Ok((eocd, search_start + i as u64));
                }
            }
        }

        Err(invalid("not a valid ZIP file"))
    }

    /// Read the ZIP64 End of Central Directory record.
    ///
    /// Called when the regular EOCD has fields saturated to 0xFFFF or
    /// 0xFFFFFFFF. The locator sits immediately before the regular EOCD.
    pub fn read_zip64_eocd(&self, eocd_offset: u64) -> io::Result<Zip64EOCD> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .ok_or_else(|| invalid("missing ZIP64 locator"))?;
        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        self.reader.read_exact_at(locator_offset, &mut locator_buf)?;

        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
        self.reader
            .read_exact_at(locator.eocd64_offset, &mut eocd64_buf)?;

        Zip64EOCD::from_bytes(&eocd64_buf)
    }

    /// List all entries in the archive, in Central Directory order.
    pub fn list_files(&self) -> io::Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd()?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset)?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        // Reject before allocating: a corrupt EOCD can claim any size
        if cd_offset.checked_add(cd_size).is_none_or(|end| end > self.size) {
            return Err(invalid("Central Directory lies outside the archive"));
        }

        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader.read_exact_at(cd_offset, &mut cd_data)?;

        let capacity = total_entries.min(cd_size / CDFH_MIN_SIZE as u64) as usize;
        let mut entries = Vec::with_capacity(capacity);
        let mut cursor = Cursor::new(cd_data.as_slice());

        for _ in 0..total_entries {
            let entry = self.parse_cdfh(&mut cursor)?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Parse a Central Directory File Header from a cursor.
    fn parse_cdfh(&self, cursor: &mut Cursor<&[u8]>) -> io::Result<ZipFileEntry> {
        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig)?;
        if sig != CDFH_SIGNATURE {
            return Err(invalid("invalid Central Directory File Header"));
        }

        let version_made_by = cursor.read_u16::<LittleEndian>()?;
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;
        let file_comment_length = cursor.read_u16::<LittleEndian>()?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let external_attrs = cursor.read_u32::<LittleEndian>()?;
        let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut file_name_bytes)?;
        // Lossy: non-UTF8 names still extract, with replacement characters
        let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();

        let is_directory =
            ZipFileEntry::detect_directory(&file_name, version_made_by, external_attrs);

        let extra_field_end = cursor.position() + extra_field_length as u64;

        while cursor.position() + 4 <= extra_field_end {
            let header_id = cursor.read_u16::<LittleEndian>()?;
            let field_size = cursor.read_u16::<LittleEndian>()?;
            let field_end = (cursor.position() + field_size as u64).min(extra_field_end);

            if header_id == ZIP64_EXTRA_ID {
                // Values are present only for header fields saturated to 0xFFFFFFFF,
                // always in this order
                if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    uncompressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    compressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    lfh_offset = cursor.read_u64::<LittleEndian>()?;
                }
            }

            cursor.set_position(field_end);
        }

        // Skip the remainder of the extra field and the file comment
        cursor.set_position(extra_field_end + file_comment_length as u64);

        Ok(ZipFileEntry {
            file_name,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
            version_made_by,
            flags,
            external_attrs,
            is_directory,
        })
    }

    /// Get the actual data offset for a file entry.
    ///
    /// The Local File Header has variable-length fields that may differ
    /// from the Central Directory entry, so it is read to find where the
    /// entry's data begins.
    pub fn get_data_offset(&self, entry: &ZipFileEntry) -> io::Result<u64> {
        let mut lfh_buf = vec![0u8; LFH_SIZE];
        self.reader.read_exact_at(entry.lfh_offset, &mut lfh_buf)?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            return Err(invalid("invalid Local File Header"));
        }

        let mut cursor = Cursor::new(&lfh_buf);
        cursor.set_position(26); // Offset to filename length field

        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    /// Open a decompressing, CRC-checked stream over an entry's content.
    ///
    /// Fails with `InvalidData` for encrypted entries, unsupported
    /// compression methods, and data that runs past the end of the archive.
    pub fn open_entry(&self, entry: &ZipFileEntry) -> io::Result<EntryReader<'_, R>> {
        if entry.is_encrypted() {
            return Err(invalid("encrypted entries are not supported"));
        }
        if let CompressionMethod::Unknown(method) = entry.compression_method {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported compression method {method}"),
            ));
        }

        let data_offset = self.get_data_offset(entry)?;
        if data_offset
            .checked_add(entry.compressed_size)
            .is_none_or(|end| end > self.size)
        {
            return Err(invalid("entry data lies outside the archive"));
        }

        Ok(EntryReader::new(&self.reader, data_offset, entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-built single-entry STORED archive, optionally with a trailing comment
    fn tiny_zip(name: &str, data: &[u8], comment: &[u8]) -> Vec<u8> {
        let mut crc = flate2::Crc::new();
        crc.update(data);
        let crc = crc.sum();

        let mut out = Vec::new();
        // Local File Header
        out.extend_from_slice(LFH_SIGNATURE);
        out.extend_from_slice(&20u16.to_le_bytes()); // version needed
        out.extend_from_slice(&0u16.to_le_bytes()); // flags
        out.extend_from_slice(&0u16.to_le_bytes()); // method
        out.extend_from_slice(&0u32.to_le_bytes()); // time + date
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(data);

        let cd_offset = out.len() as u32;
        out.extend_from_slice(CDFH_SIGNATURE);
        out.extend_from_slice(&0x031Eu16.to_le_bytes()); // made by unix
        out.extend_from_slice(&20u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // extra
        out.extend_from_slice(&0u16.to_le_bytes()); // comment
        out.extend_from_slice(&0u16.to_le_bytes()); // disk
        out.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        out.extend_from_slice(&(0o100640u32 << 16).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // lfh offset
        out.extend_from_slice(name.as_bytes());
        let cd_size = out.len() as u32 - cd_offset;

        out.extend_from_slice(EndOfCentralDirectory::SIGNATURE);
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&cd_size.to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());
        out.extend_from_slice(&(comment.len() as u16).to_le_bytes());
        out.extend_from_slice(comment);
        out
    }

    #[test]
    fn lists_and_reads_stored_entry() {
        let parser = ZipParser::new(tiny_zip("a/b.txt", b"hi", b""));
        let entries = parser.list_files().unwrap();

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.file_name, "a/b.txt");
        assert!(!entry.is_directory);
        assert_eq!(entry.permissions(), 0o640);

        let mut data = Vec::new();
        parser.open_entry(entry).unwrap().read_to_end(&mut data).unwrap();
        assert_eq!(data, b"hi");
    }

    #[test]
    fn finds_eocd_behind_comment() {
        let parser = ZipParser::new(tiny_zip("x.csv", b"1,2\n", b"dataset v2"));
        let entries = parser.list_files().unwrap();
        assert_eq!(entries[0].file_name, "x.csv");
    }

    #[test]
    fn garbage_is_not_a_zip() {
        let parser = ZipParser::new(b"definitely not a zip archive at all".to_vec());
        let err = parser.list_files().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn empty_input_is_not_a_zip() {
        let parser = ZipParser::new(Vec::new());
        assert!(parser.list_files().is_err());
    }

    #[test]
    fn corrupted_content_fails_crc() {
        let mut archive = tiny_zip("a.txt", b"hello", b"");
        // Content starts right after the 30-byte header and the 5-byte name
        archive[35] = b'j';

        let parser = ZipParser::new(archive);
        let entries = parser.list_files().unwrap();
        let mut data = Vec::new();
        let err = parser
            .open_entry(&entries[0])
            .unwrap()
            .read_to_end(&mut data)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn unknown_method_is_rejected_at_open() {
        let parser = ZipParser::new(tiny_zip("a.txt", b"hello", b""));
        let mut entry = parser.list_files().unwrap().remove(0);
        entry.compression_method = CompressionMethod::Unknown(14);
        assert!(parser.open_entry(&entry).is_err());
    }
}
