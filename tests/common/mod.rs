//! Fixture archives for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// One entry of a fixture archive.
pub enum Item<'a> {
    Dir(&'a str),
    File(&'a str, &'a [u8]),
    /// File with explicit Unix permission bits
    FileMode(&'a str, &'a [u8], u32),
    /// File stored without compression
    Stored(&'a str, &'a [u8]),
}

fn deflated() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Write a ZIP archive to `path` holding `items` in order.
pub fn write_zip(path: &Path, items: &[Item<'_>]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);

    for item in items {
        match item {
            Item::Dir(name) => zip.add_directory(*name, deflated()).unwrap(),
            Item::File(name, data) => {
                zip.start_file(*name, deflated()).unwrap();
                zip.write_all(data).unwrap();
            }
            Item::FileMode(name, data, mode) => {
                zip.start_file(*name, deflated().unix_permissions(*mode)).unwrap();
                zip.write_all(data).unwrap();
            }
            Item::Stored(name, data) => {
                let stored =
                    SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
                zip.start_file(*name, stored).unwrap();
                zip.write_all(data).unwrap();
            }
        }
    }

    zip.finish().unwrap();
}
