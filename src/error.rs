//! Error types for fetching, extraction and table reading.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the crate [`enum@Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the library.
///
/// Every variant names the path or URL it concerns, so a caller can report
/// the failure without inspecting anything else.
#[derive(Error, Debug)]
pub enum Error {
    /// The archive is missing, unreadable, or not a valid ZIP container.
    #[error("cannot open archive {path}: {source}")]
    ArchiveOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An entry resolves outside the destination root.
    #[error("{path}: illegal file path")]
    IllegalPath { path: PathBuf },

    /// A directory or file could not be created, or entry bytes could not be copied.
    #[error("extraction failed at {path}: {source}")]
    ExtractionIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A table file is missing or unreadable.
    #[error("unable to read input file {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A table file is not well-formed delimited text.
    #[error("unable to parse {path} as CSV: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The HTTP request failed or answered with a status other than 200.
    #[error("could not download {url}: {source}")]
    HttpFetch {
        url: String,
        #[source]
        source: FetchFailure,
    },

    /// The downloaded body could not be written to disk.
    #[error("could not write download to {path}: {source}")]
    DownloadWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why an HTTP fetch failed.
#[derive(Error, Debug)]
pub enum FetchFailure {
    /// The server answered, but not with `200 OK`.
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    /// The request never completed (DNS, connect, TLS, body read).
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl Error {
    /// Returns `true` if the archive tried to write outside its destination.
    ///
    /// ```
    /// use datafetch::Error;
    /// use std::path::PathBuf;
    ///
    /// let err = Error::IllegalPath { path: PathBuf::from("/tmp/evil.txt") };
    /// assert!(err.is_security_violation());
    /// ```
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(self, Self::IllegalPath { .. })
    }

    /// The filesystem path this error concerns, if it has one.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::ArchiveOpen { path, .. }
            | Self::IllegalPath { path }
            | Self::ExtractionIo { path, .. }
            | Self::FileOpen { path, .. }
            | Self::Parse { path, .. }
            | Self::DownloadWrite { path, .. } => Some(path.as_path()),
            Self::HttpFetch { .. } => None,
        }
    }
}

/// An extraction that stopped part way.
///
/// `extracted` holds the paths recorded before the failure, in archive order.
/// It is best effort: entries after the failing one were never visited, and
/// nothing already written is rolled back.
#[derive(Error, Debug)]
#[error("{error} ({} entries processed)", .extracted.len())]
pub struct PartialExtraction {
    pub extracted: Vec<PathBuf>,
    #[source]
    pub error: Error,
}

impl PartialExtraction {
    pub(crate) fn new(extracted: Vec<PathBuf>, error: Error) -> Self {
        Self { extracted, error }
    }
}

impl From<PartialExtraction> for Error {
    fn from(partial: PartialExtraction) -> Self {
        partial.error
    }
}
