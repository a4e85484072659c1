//! Delimited-text tables.
//!
//! A [`Table`] is just rows of text fields. No header row is singled out
//! and no field is converted to another type; row 0 is whatever the file
//! starts with.
//!
//! - [`read_table`] parses a whole file into a [`Table`] in one pass.
//! - [`for_each_row`] walks rows in order and lets the caller stop early.

mod dispatch;
mod reader;

pub use dispatch::{Traversal, for_each_row};
pub use reader::{QuoteError, TableOptions, parse_table, read_table, read_table_with};

/// One line of delimited text.
pub type Row = Vec<String>;

/// An ordered sequence of rows, produced once per parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Visit rows in order; see [`for_each_row`].
    pub fn for_each_row<F>(&self, handler: F) -> Traversal
    where
        F: FnMut(usize, &[String]) -> bool,
    {
        for_each_row(&self.rows, handler)
    }
}

impl From<Vec<Row>> for Table {
    fn from(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

impl IntoIterator for Table {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
