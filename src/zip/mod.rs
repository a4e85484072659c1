//! ZIP archive parsing and safe extraction.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`entry`]: Decompressing, CRC-checked stream over one entry's data
//! - [`path`]: Destination boundary checks (zip-slip prevention)
//! - [`extractor`]: [`extract`] and the [`ZipExtractor`] it is built on
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! The EOCD is read first (from the end of the file), then the Central
//! Directory, which gives the entry list in archive order.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for files > 4GB
//! - STORED (no compression) and DEFLATE methods
//! - Unix permission bits from external attributes
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods
//! - Symlink entries are extracted as regular files holding the link target

pub mod entry;
mod extractor;
pub mod parser;
pub mod path;
pub mod structures;

pub use entry::EntryReader;
pub use extractor::{ZipExtractor, extract};
pub use parser::ZipParser;
pub use structures::*;
