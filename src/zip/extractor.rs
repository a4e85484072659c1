use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Error, PartialExtraction};
use crate::io::{LocalFileReader, ReadAt};

use super::parser::ZipParser;
use super::path::{destination_root, resolve_within};
use super::structures::ZipFileEntry;

/// Extract the ZIP archive at `source` into `dest`.
///
/// `dest` is created if it does not exist. Every entry must resolve inside
/// `dest`; the first one that does not stops the whole extraction with
/// [`Error::IllegalPath`]. Existing files are overwritten.
///
/// On success, returns one absolute path per entry (directories included),
/// in archive order. On failure the paths recorded so far travel with the
/// error in [`PartialExtraction`]. Files already written are left in place.
///
/// ```no_run
/// let paths = datafetch::extract("dataset.zip".as_ref(), "data".as_ref())?;
/// for path in &paths {
///     println!("{}", path.display());
/// }
/// # Ok::<(), datafetch::PartialExtraction>(())
/// ```
pub fn extract(source: &Path, dest: &Path) -> Result<Vec<PathBuf>, PartialExtraction> {
    let open_error = |e: io::Error| {
        PartialExtraction::new(
            Vec::new(),
            Error::ArchiveOpen {
                path: source.to_path_buf(),
                source: e,
            },
        )
    };

    let reader = LocalFileReader::new(source).map_err(open_error)?;
    let extractor = ZipExtractor::new(reader);
    let entries = extractor.list_files().map_err(open_error)?;

    debug!(archive = %source.display(), entries = entries.len(), "opened archive");
    extractor.extract_entries(&entries, dest)
}

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: R) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all entries in the archive
    pub fn list_files(&self) -> io::Result<Vec<ZipFileEntry>> {
        self.parser.list_files()
    }

    /// Extract `entries` (as returned by [`list_files`](Self::list_files)) under `dest`.
    pub fn extract_entries(
        &self,
        entries: &[ZipFileEntry],
        dest: &Path,
    ) -> Result<Vec<PathBuf>, PartialExtraction> {
        let root = destination_root(dest)
            .and_then(|root| ensure_dir(&root).map(|()| root))
            .map_err(|e| {
                PartialExtraction::new(
                    Vec::new(),
                    Error::ExtractionIo {
                        path: dest.to_path_buf(),
                        source: e,
                    },
                )
            })?;

        let mut extracted = Vec::with_capacity(entries.len());

        for entry in entries {
            let path = match resolve_within(&root, &entry.file_name) {
                Ok(path) => path,
                Err(escaped) => {
                    warn!(
                        entry = %entry.file_name,
                        path = %escaped.display(),
                        "entry escapes destination"
                    );
                    return Err(PartialExtraction::new(
                        extracted,
                        Error::IllegalPath { path: escaped },
                    ));
                }
            };

            extracted.push(path.clone());

            let written = if entry.is_directory {
                debug!(path = %path.display(), "creating directory");
                ensure_dir(&path)
            } else {
                self.extract_to_file(entry, &path)
            };

            if let Err(e) = written {
                return Err(PartialExtraction::new(
                    extracted,
                    Error::ExtractionIo { path, source: e },
                ));
            }
        }

        info!(dest = %root.display(), entries = extracted.len(), "extraction complete");
        Ok(extracted)
    }

    /// Extract a single file entry to `output_path`.
    ///
    /// The destination file is created (or truncated) before the entry is
    /// opened. Both handles are released before this returns, whatever the
    /// outcome.
    pub fn extract_to_file(&self, entry: &ZipFileEntry, output_path: &Path) -> io::Result<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir(parent)?;
            }
        }

        let file = create_file(output_path, entry.permissions())?;
        let mut out = BufWriter::new(file);
        let mut data = self.parser.open_entry(entry)?;

        // A failed copy wins over anything flushing or closing would report
        let bytes = io::copy(&mut data, &mut out)?;
        out.into_inner().map_err(io::IntoInnerError::into_error)?;

        debug!(entry = %entry.file_name, bytes, "extracted file");
        Ok(())
    }
}

/// `create_dir_all` that tolerates the directory already being there.
fn ensure_dir(path: &Path) -> io::Result<()> {
    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}

fn create_file(path: &Path, mode: u32) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    options.open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_dir_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a/b/c");
        ensure_dir(&dir).unwrap();
        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn ensure_dir_over_a_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("plain");
        fs::write(&file, b"x").unwrap();
        assert!(ensure_dir(&file).is_err());
    }

    #[test]
    fn create_file_truncates() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("f.txt");
        fs::write(&path, b"a much longer previous content").unwrap();

        {
            use std::io::Write;
            let mut f = create_file(&path, 0o644).unwrap();
            f.write_all(b"new").unwrap();
        }
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn missing_archive_is_archive_open_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = extract(&tmp.path().join("none.zip"), &tmp.path().join("out"))
            .unwrap_err();
        assert!(err.extracted.is_empty());
        assert!(matches!(err.error, Error::ArchiveOpen { .. }));
    }
}
