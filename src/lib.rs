//! # datafetch
//!
//! Fetch a zipped dataset over HTTP, extract it without letting any entry
//! escape the destination directory, and read its delimited-text tables.
//!
//! The pipeline has four steps, each usable on its own:
//!
//! 1. [`Fetcher::fetch`] downloads a URL to a local file (single GET, no retry)
//! 2. [`extract`] unpacks a ZIP archive, rejecting zip-slip entries
//! 3. [`read_table`] parses one extracted file into a [`Table`]
//! 4. [`for_each_row`] walks the rows, stopping when the handler says so
//!
//! Extraction and table reading are synchronous. Fetching is async and needs
//! a tokio runtime.
//!
//! ## Example
//!
//! ```no_run
//! use datafetch::{Fetcher, extract, read_table};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let archive = Path::new("dataset.zip");
//!     Fetcher::new()?
//!         .fetch("https://example.com/dataset.zip", archive)
//!         .await?;
//!
//!     let paths = extract(archive, Path::new("data"))?;
//!     let table = read_table(&paths[1])?;
//!
//!     table.for_each_row(|index, fields| {
//!         println!("{index}: {}", fields.join(" | "));
//!         index == 9
//!     });
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod table;
pub mod zip;

pub use cli::Cli;
pub use error::{Error, FetchFailure, PartialExtraction, Result};
pub use io::{Fetcher, LocalFileReader, ReadAt};
pub use table::{
    QuoteError, Row, Table, TableOptions, Traversal, for_each_row, read_table, read_table_with,
};
pub use crate::zip::{ZipExtractor, ZipFileEntry, extract};
