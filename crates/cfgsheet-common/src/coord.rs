//! Grid coordinates shared by the loader and error reporting.
//!
//! Rows and columns are 1-based physical positions in the source sheet, the
//! same numbering a user sees in a spreadsheet UI (`A1` is row 1, column 1).

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest column index addressable with three letters (`XFD`).
pub const MAX_COL: u32 = 16_384;

/// Errors returned when converting between letters and column indices.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CoordError {
    ZeroColumn,
    ColOverflow(u32),
    InvalidLetters(String),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::ZeroColumn => write!(f, "column indices are 1-based"),
            CoordError::ColOverflow(col) => write!(f, "col {col} exceeds {MAX_COL}"),
            CoordError::InvalidLetters(s) => write!(f, "`{s}` is not a column name"),
        }
    }
}

impl std::error::Error for CoordError {}

/// Render a 1-based column index as spreadsheet letters (`1 -> A`, `27 -> AA`).
///
/// Column `0` has no letter form and renders as an empty string.
pub fn col_to_letters(col: u32) -> String {
    let mut n = col;
    let mut buf = Vec::with_capacity(3);
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        buf.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}

/// Parse spreadsheet letters into a 1-based column index.
pub fn letters_to_col(letters: &str) -> Result<u32, CoordError> {
    let trimmed = letters.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(CoordError::InvalidLetters(letters.to_string()));
    }
    let mut col: u32 = 0;
    for b in trimmed.bytes() {
        let digit = (b.to_ascii_uppercase() - b'A') as u32 + 1;
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add(digit))
            .ok_or(CoordError::ColOverflow(u32::MAX))?;
        if col > MAX_COL {
            return Err(CoordError::ColOverflow(col));
        }
    }
    Ok(col)
}

/// Physical position of a single cell.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct CellLocation {
    pub row: u32,
    pub col: u32,
}

impl CellLocation {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// A1-style name of the cell, e.g. `C5`.
    pub fn to_a1(&self) -> String {
        format!("{}{}", col_to_letters(self.col), self.row)
    }
}

impl fmt::Display for CellLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.col == 0 {
            write!(f, "row {}", self.row)
        } else {
            f.write_str(&self.to_a1())
        }
    }
}

impl From<(u32, u32)> for CellLocation {
    fn from(value: (u32, u32)) -> Self {
        Self::new(value.0, value.1)
    }
}
