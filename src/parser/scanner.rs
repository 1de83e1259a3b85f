//! Cursor-driven row search.
//!
//! Every search takes the cursor by `&mut usize` so that whatever a nested
//! call consumes stays consumed for its caller. A search leaves the cursor
//! on the matching row, never past it. Running off the end of the table is
//! not an error: the search returns `None` with the cursor at `rows.len()`.

use regex::Regex;

use crate::model::Row;

/// First cell of `row` matching `pattern`.
pub fn match_in_row<'r>(row: &'r [String], pattern: &Regex) -> Option<&'r str> {
    row.iter()
        .map(String::as_str)
        .find(|cell| pattern.is_match(cell))
}

/// Whether any cell of `row` matches any of `patterns`.
pub fn contains_match(row: &[String], patterns: &[&Regex]) -> bool {
    patterns
        .iter()
        .any(|re| row.iter().any(|cell| re.is_match(cell)))
}

/// Advance `cursor` to the next row with a cell matching `pattern`.
pub fn match_next<'r>(rows: &'r [Row], pattern: &Regex, cursor: &mut usize) -> Option<&'r str> {
    while *cursor < rows.len() {
        if let Some(text) = match_in_row(&rows[*cursor], pattern) {
            return Some(text);
        }
        *cursor += 1;
    }
    None
}

/// Like [`match_next`], but every pattern is tried on a row, in priority
/// order, before moving on to the next row.
pub fn match_first_of<'r>(
    rows: &'r [Row],
    patterns: &[&Regex],
    cursor: &mut usize,
) -> Option<&'r str> {
    while *cursor < rows.len() {
        let row = &rows[*cursor];
        if let Some(text) = patterns.iter().find_map(|re| match_in_row(row, re)) {
            return Some(text);
        }
        *cursor += 1;
    }
    None
}

/// Whether the row at `cursor` exists and matches any of `patterns`.
pub fn row_matches(rows: &[Row], cursor: usize, patterns: &[&Regex]) -> bool {
    rows.get(cursor)
        .is_some_and(|row| contains_match(row, patterns))
}
