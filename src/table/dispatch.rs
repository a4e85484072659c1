use super::Row;

/// How a [`for_each_row`] walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Every row was visited.
    Exhausted { visited: usize },
    /// The handler asked to stop after the row at `index`.
    Stopped { index: usize },
}

impl Traversal {
    /// Number of times the handler ran.
    pub fn visited(&self) -> usize {
        match *self {
            Traversal::Exhausted { visited } => visited,
            Traversal::Stopped { index } => index + 1,
        }
    }
}

/// Call `handler(index, fields)` for each row in ascending order.
///
/// The handler returns `true` to stop; no later row is visited. Each call
/// starts again from row 0.
///
/// ```
/// use datafetch::table::{Traversal, for_each_row};
///
/// let rows = vec![vec!["a".to_string()], vec!["b".to_string()], vec!["c".to_string()]];
/// let mut seen = Vec::new();
/// let outcome = for_each_row(&rows, |i, row| {
///     seen.push(row[0].clone());
///     i == 1
/// });
/// assert_eq!(seen, ["a", "b"]);
/// assert_eq!(outcome, Traversal::Stopped { index: 1 });
/// ```
pub fn for_each_row<F>(rows: &[Row], mut handler: F) -> Traversal
where
    F: FnMut(usize, &[String]) -> bool,
{
    for (index, row) in rows.iter().enumerate() {
        if handler(index, row.as_slice()) {
            return Traversal::Stopped { index };
        }
    }
    Traversal::Exhausted {
        visited: rows.len(),
    }
}
