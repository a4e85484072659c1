use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Cursor};

/// Build the `InvalidData` error used for every malformed structure.
pub(crate) fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn from_bytes(data: &[u8]) -> io::Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(invalid("invalid End of Central Directory"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
pub struct Zip64EOCDLocator {
    pub disk_with_eocd64: u32,
    pub eocd64_offset: u64,
    pub total_disks: u32,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn from_bytes(data: &[u8]) -> io::Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(invalid("invalid ZIP64 locator"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_with_eocd64: cursor.read_u32::<LittleEndian>()?,
            eocd64_offset: cursor.read_u64::<LittleEndian>()?,
            total_disks: cursor.read_u32::<LittleEndian>()?,
        })
    }
}

/// ZIP64 End of Central Directory - 56 bytes minimum
pub struct Zip64EOCD {
    pub eocd64_size: u64,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub disk_number: u32,
    pub disk_with_cd: u32,
    pub disk_entries: u64,
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> io::Result<Self> {
        if data.len() < Self::MIN_SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(invalid("invalid ZIP64 End of Central Directory"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            eocd64_size: cursor.read_u64::<LittleEndian>()?,
            version_made_by: cursor.read_u16::<LittleEndian>()?,
            version_needed: cursor.read_u16::<LittleEndian>()?,
            disk_number: cursor.read_u32::<LittleEndian>()?,
            disk_with_cd: cursor.read_u32::<LittleEndian>()?,
            disk_entries: cursor.read_u64::<LittleEndian>()?,
            total_entries: cursor.read_u64::<LittleEndian>()?,
            cd_size: cursor.read_u64::<LittleEndian>()?,
            cd_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// Host system value for Unix in the upper byte of "version made by"
const HOST_UNIX: u8 = 3;

const S_IFMT: u32 = 0o170000;
const S_IFDIR: u32 = 0o040000;

/// Default mode for files that carry no Unix attributes
pub const DEFAULT_FILE_MODE: u32 = 0o666;

/// Parsed ZIP file entry information
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub version_made_by: u16,
    pub flags: u16,
    pub external_attrs: u32,
    pub is_directory: bool,
}

impl ZipFileEntry {
    /// Full Unix mode (type and permission bits) if the archive recorded one
    pub fn unix_mode(&self) -> Option<u32> {
        let host = (self.version_made_by >> 8) as u8;
        let mode = self.external_attrs >> 16;
        (host == HOST_UNIX && mode != 0).then_some(mode)
    }

    /// Permission bits to create the extracted file with
    pub fn permissions(&self) -> u32 {
        self.unix_mode().map_or(DEFAULT_FILE_MODE, |mode| mode & 0o777)
    }

    /// Entry is encrypted (general purpose flag bit 0)
    pub fn is_encrypted(&self) -> bool {
        self.flags & 0x0001 != 0
    }

    pub(crate) fn detect_directory(
        file_name: &str,
        version_made_by: u16,
        external_attrs: u32,
    ) -> bool {
        if file_name.ends_with('/') {
            return true;
        }
        let host = (version_made_by >> 8) as u8;
        host == HOST_UNIX && (external_attrs >> 16) & S_IFMT == S_IFDIR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, made_by: u16, attrs: u32) -> ZipFileEntry {
        ZipFileEntry {
            file_name: name.to_string(),
            compression_method: CompressionMethod::Stored,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            lfh_offset: 0,
            version_made_by: made_by,
            flags: 0,
            external_attrs: attrs,
            is_directory: ZipFileEntry::detect_directory(name, made_by, attrs),
        }
    }

    #[test]
    fn unix_permissions_come_from_external_attrs() {
        let e = entry("run.sh", 0x031E, 0o100755 << 16);
        assert_eq!(e.unix_mode(), Some(0o100755));
        assert_eq!(e.permissions(), 0o755);
    }

    #[test]
    fn non_unix_host_gets_default_mode() {
        let e = entry("data.csv", 0x0014, 0x20);
        assert_eq!(e.unix_mode(), None);
        assert_eq!(e.permissions(), DEFAULT_FILE_MODE);
    }

    #[test]
    fn directory_by_name_or_mode() {
        assert!(entry("a/", 0x0014, 0).is_directory);
        assert!(entry("a", 0x031E, 0o040755 << 16).is_directory);
        assert!(!entry("a", 0x031E, 0o100644 << 16).is_directory);
    }

    #[test]
    fn compression_method_from_header() {
        assert_eq!(CompressionMethod::from_u16(0), CompressionMethod::Stored);
        assert_eq!(CompressionMethod::from_u16(8), CompressionMethod::Deflate);
        assert_eq!(CompressionMethod::from_u16(12), CompressionMethod::Unknown(12));
    }

    #[test]
    fn eocd_rejects_bad_signature() {
        let err = EndOfCentralDirectory::from_bytes(&[0u8; 22]).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
