use crate::excel::address::cell_reference;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

//==============================================================================
// Cell Values
//==============================================================================

/// A single spreadsheet cell value, as read from a workbook range
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Excel error value such as `#DIV/0!`, kept as its display text
    Error(String),
}

impl CellValue {
    /// Empty cells and whitespace-only strings carry no data
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Integral value, if the cell holds a whole number
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            CellValue::Float(f)
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 =>
            {
                Some(*f as i64)
            }
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.as_integer().is_some()
    }

    pub fn is_number(&self) -> bool {
        matches!(self, CellValue::Int(_) | CellValue::Float(_))
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            CellValue::DateTime(_) | CellValue::Date(_) | CellValue::Time(_)
        )
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(n) => write!(f, "{}", format_number(*n)),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

/// Format a number for display, removing unnecessary decimal places
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{:.0}", n);
    }
    let text = format!("{}", n);
    if text.contains('e') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

//==============================================================================
// Cell Grid (the exported range)
//==============================================================================

/// A rectangular block of cells taken from one worksheet.
///
/// Rows are stored row-major and padded with [`CellValue::Empty`] so that every
/// row has the same width. `start` is the zero-based (row, column) position of
/// the top-left cell in its worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct CellGrid {
    pub sheet_name: String,
    pub start: (u32, u32),
    rows: Vec<Vec<CellValue>>,
    width: usize,
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellGrid {
    pub fn new(sheet_name: impl Into<String>, start: (u32, u32), mut rows: Vec<Vec<CellValue>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, CellValue::Empty);
        }
        Self {
            sheet_name: sheet_name.into(),
            start,
            rows,
            width,
        }
    }

    /// Grid anchored at A1 of an unnamed sheet
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        Self::new("Sheet1", (0, 0), rows)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width == 0
    }

    /// Cell at a grid-relative position; out-of-range positions read as empty
    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Values of one column starting at `from_row`
    pub fn column(&self, col: usize, from_row: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().skip(from_row).map(move |row| row.get(col).unwrap_or(&EMPTY_CELL))
    }

    pub fn contains_any_data(&self) -> bool {
        self.rows.iter().flatten().any(|cell| !cell.is_empty())
    }

    /// A1-style address of the grid, e.g. `B2:D10` (`B2` for a single cell)
    pub fn address(&self) -> String {
        let (row, col) = (self.start.0 as usize, self.start.1 as usize);
        let first = cell_reference(row, col);
        if self.height() <= 1 && self.width <= 1 {
            return first;
        }
        let last = cell_reference(
            row + self.height().max(1) - 1,
            col + self.width.max(1) - 1,
        );
        format!("{}:{}", first, last)
    }
}
