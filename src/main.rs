//! Main entry point for the datafetch CLI application.
//!
//! Downloads (or opens) a ZIP archive, extracts it, and optionally prints
//! one of the extracted files as a table.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use datafetch::{Cli, Fetcher, TableOptions, extract, read_table_with};

/// Application entry point.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let archive = if cli.is_http_url() {
        let path = cli.archive_path();
        let bytes = Fetcher::new()?.fetch(&cli.source, &path).await?;
        if !cli.is_quiet() {
            eprintln!("Downloaded {} to {}", format_size(bytes), path.display());
        }
        path
    } else {
        PathBuf::from(&cli.source)
    };

    // Extraction is blocking filesystem work; keep it off the runtime threads
    let source = archive.clone();
    let dest = cli.extract_dir.clone();
    let extracted = tokio::task::spawn_blocking(move || extract(&source, &dest))
        .await
        .context("extraction task panicked")?
        .with_context(|| format!("failed to extract {}", archive.display()))?;

    for path in &extracted {
        if cli.list {
            println!("{}", path.display());
        } else if !cli.is_quiet() {
            println!("  extracting: {}", path.display());
        }
    }

    if let Some(pattern) = &cli.table {
        let Some(path) = extracted
            .iter()
            .find(|p| p.is_file() && matches_name(pattern, p))
        else {
            bail!("no extracted file matches {pattern}");
        };
        print_table(path, &cli)?;
    }

    Ok(())
}

/// Install the tracing subscriber; `RUST_LOG` wins over the CLI flags.
fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Print the rows of `path` as tab-separated lines, honoring `-n`.
fn print_table(path: &Path, cli: &Cli) -> Result<()> {
    if !cli.delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character");
    }
    let options = TableOptions {
        delimiter: cli.delimiter as u8,
        flexible: cli.flexible,
        ..TableOptions::default()
    };

    let table = read_table_with(path, &options)?;
    if cli.rows == Some(0) {
        return Ok(());
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut write_error = None;

    table.for_each_row(|index, fields| {
        if let Err(e) = writeln!(out, "{}", fields.join("\t")) {
            write_error = Some(e);
            return true;
        }
        cli.rows.is_some_and(|limit| index + 1 >= limit)
    });

    match write_error {
        // Output closed early (e.g. piped into `head`)
        Some(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Match an extracted path against a `-t` argument.
///
/// Patterns with wildcards are matched against both the full path and the
/// file name; plain names must equal the file name or a trailing part of
/// the path.
fn matches_name(pattern: &str, path: &Path) -> bool {
    let basename = path
        .file_name()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    if has_glob_chars(pattern) {
        glob_match(pattern, &path.to_string_lossy()) || glob_match(pattern, &basename)
    } else {
        basename == pattern || path.ends_with(pattern)
    }
}

/// Check if a pattern contains glob wildcard characters.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            // Star: skip it, or let it swallow one more character
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
