//! A1-style cell and range addresses

use crate::error::{ExportError, ExportResult};
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Rows in an Excel worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Columns in an Excel worksheet (`A` to `XFD`)
pub const MAX_COLUMNS: u32 = 16_384;

/// Convert column index to Excel column letter (0→A, 25→Z, 26→AA, ...)
pub fn column_letter(index: usize) -> String {
    let mut result = String::new();
    let mut num = index;
    loop {
        result.insert(0, (b'A' + (num % 26) as u8) as char);
        if num < 26 {
            break;
        }
        num = num / 26 - 1;
    }
    result
}

/// Column letters to a zero-based index (A→0, AA→26). Case-insensitive.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0usize, |acc, c| {
        let c = c.to_ascii_uppercase();
        c.is_ascii_uppercase()
            .then(|| acc * 26 + (c as usize - 'A' as usize + 1))
    })
    .map(|n| n - 1)
}

/// `B3` for row 2, column 1 (both zero-based)
pub fn cell_reference(row: usize, col: usize) -> String {
    format!("{}{}", column_letter(col), row + 1)
}

/// An inclusive, zero-based rectangle of cells such as `A1:D20`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeAddress {
    pub first_row: u32,
    pub first_col: u32,
    pub last_row: u32,
    pub last_col: u32,
}

impl RangeAddress {
    pub fn new(first: (u32, u32), last: (u32, u32)) -> Self {
        Self {
            first_row: first.0.min(last.0),
            first_col: first.1.min(last.1),
            last_row: first.0.max(last.0),
            last_col: first.1.max(last.1),
        }
    }

    pub fn height(&self) -> usize {
        (self.last_row - self.first_row) as usize + 1
    }

    pub fn width(&self) -> usize {
        (self.last_col - self.first_col) as usize + 1
    }

    pub fn start(&self) -> (u32, u32) {
        (self.first_row, self.first_col)
    }
}

impl FromStr for RangeAddress {
    type Err = ExportError;

    /// Parses `A1`, `B2:D10` or `$A$1:$C$5`; corners may be given in any order
    /// and must lie inside a worksheet.
    fn from_str(value: &str) -> ExportResult<Self> {
        let upper = value.trim().to_ascii_uppercase();
        let invalid = || ExportError::Range(value.to_string());
        let address_pattern =
            Regex::new(r"^\$?([A-Z]{1,3})\$?(\d+)(?::\$?([A-Z]{1,3})\$?(\d+))?$")
                .map_err(|e| ExportError::Range(format!("Regex error: {}", e)))?;
        let captures = address_pattern.captures(&upper).ok_or_else(invalid)?;

        let corner = |letters: usize, digits: usize| -> ExportResult<(u32, u32)> {
            let col = captures
                .get(letters)
                .and_then(|m| column_index(m.as_str()))
                .ok_or_else(invalid)?;
            let row = captures
                .get(digits)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .filter(|&row| (1..=MAX_ROWS).contains(&row))
                .ok_or_else(invalid)?;
            let col = u32::try_from(col)
                .ok()
                .filter(|&col| col < MAX_COLUMNS)
                .ok_or_else(invalid)?;
            Ok((row - 1, col))
        };

        let first = corner(1, 2)?;
        let last = if captures.get(3).is_some() {
            corner(3, 4)?
        } else {
            first
        };
        Ok(Self::new(first, last))
    }
}

impl fmt::Display for RangeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = cell_reference(self.first_row as usize, self.first_col as usize);
        if self.height() == 1 && self.width() == 1 {
            return write!(f, "{}", first);
        }
        let last = cell_reference(self.last_row as usize, self.last_col as usize);
        write!(f, "{}:{}", first, last)
    }
}
