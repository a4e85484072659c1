use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::error::{Error, Result};

use super::{Row, Table};

/// How delimited text is split into fields.
#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Field separator, `,` by default
    pub delimiter: u8,
    /// Quote character, `"` by default
    pub quote: u8,
    /// Allow rows with differing field counts
    pub flexible: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            flexible: false,
        }
    }
}

/// Quoting that the reader refuses. Positions are 1-based line and byte column.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    /// A quote inside a field that did not start with one.
    #[error("line {line}, column {column}: bare quote in non-quoted field")]
    Bare { line: u64, column: u64 },

    /// A closing quote followed by something other than a delimiter or line end.
    #[error("line {line}, column {column}: extraneous quote in quoted field")]
    Extraneous { line: u64, column: u64 },

    /// Input ended inside the quoted field that opens at this position.
    #[error("line {line}, column {column}: quoted field is never closed")]
    Unterminated { line: u64, column: u64 },
}

/// Read a comma-separated file into a [`Table`].
///
/// Every row must have as many fields as the first one. Quoted fields may
/// contain delimiters, doubled quotes and newlines. Blank lines are skipped.
/// Stray or unbalanced quotes are a parse error, see [`QuoteError`].
pub fn read_table(path: &Path) -> Result<Table> {
    read_table_with(path, &TableOptions::default())
}

/// Read a delimited-text file into a [`Table`] using `options`.
///
/// Nothing is returned on a parse failure; the file is closed on every path.
pub fn read_table_with(path: &Path, options: &TableOptions) -> Result<Table> {
    let file = File::open(path).map_err(|e| Error::FileOpen {
        path: path.to_path_buf(),
        source: e,
    })?;

    let table = parse_table(file, options).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!(path = %path.display(), rows = table.len(), "parsed table");
    Ok(table)
}

/// Parse delimited text from any reader.
///
/// Quote errors surface as a `csv::ErrorKind::Io` wrapping a [`QuoteError`].
pub fn parse_table<R: Read>(mut reader: R, options: &TableOptions) -> csv::Result<Table> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    check_quotes(&data, options.delimiter, options.quote)
        .map_err(|e| csv::Error::from(io::Error::new(io::ErrorKind::InvalidData, e)))?;

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(options.delimiter)
        .quote(options.quote)
        .flexible(options.flexible)
        .from_reader(data.as_slice());

    let rows = csv_reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect::<Row>()))
        .collect::<csv::Result<Vec<Row>>>()?;

    Ok(Table::from(rows))
}

#[derive(Clone, Copy)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// Reject quoting the `csv` reader would otherwise accept silently.
fn check_quotes(data: &[u8], delimiter: u8, quote: u8) -> std::result::Result<(), QuoteError> {
    let ends_field = |byte: u8| byte == delimiter || byte == b'\n' || byte == b'\r';

    let mut state = QuoteState::FieldStart;
    let (mut line, mut column) = (1u64, 0u64);
    let mut opened_at = (line, column);

    for &byte in data {
        column += 1;
        state = match state {
            QuoteState::FieldStart if byte == quote => {
                opened_at = (line, column);
                QuoteState::Quoted
            }
            QuoteState::FieldStart | QuoteState::Unquoted => {
                if byte == quote {
                    return Err(QuoteError::Bare { line, column });
                }
                if ends_field(byte) {
                    QuoteState::FieldStart
                } else {
                    QuoteState::Unquoted
                }
            }
            QuoteState::Quoted if byte == quote => QuoteState::QuoteInQuoted,
            QuoteState::Quoted => QuoteState::Quoted,
            // Doubled quote is an escaped quote
            QuoteState::QuoteInQuoted if byte == quote => QuoteState::Quoted,
            QuoteState::QuoteInQuoted if ends_field(byte) => QuoteState::FieldStart,
            QuoteState::QuoteInQuoted => return Err(QuoteError::Extraneous { line, column }),
        };

        if byte == b'\n' {
            line += 1;
            column = 0;
        }
    }

    if let QuoteState::Quoted = state {
        let (line, column) = opened_at;
        return Err(QuoteError::Unterminated { line, column });
    }
    Ok(())
}
