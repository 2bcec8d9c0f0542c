//! Workbook reader: worksheet ranges → [`CellGrid`]

use crate::error::{ExportError, ExportResult};
use crate::excel::address::RangeAddress;
use crate::types::{CellGrid, CellValue};
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A worksheet and the block of cells it uses
#[derive(Debug, Clone, PartialEq)]
pub struct SheetSummary {
    pub name: String,
    pub used_range: Option<RangeAddress>,
}

/// Reads ranges from `.xlsx`, `.xlsm`, `.xlsb`, `.xls` and `.ods` workbooks
pub struct WorkbookReader {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
    use_formatted_values: bool,
}

impl WorkbookReader {
    /// Open a workbook. With `use_formatted_values` off, date cells are read
    /// as their serial numbers.
    pub fn open<P: AsRef<Path>>(path: P, use_formatted_values: bool) -> ExportResult<Self> {
        let path = path.as_ref().to_path_buf();
        let workbook = open_workbook_auto(&path).map_err(|e| {
            ExportError::Workbook(format!("Failed to open {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), "opened workbook");
        Ok(Self {
            path,
            workbook,
            use_formatted_values,
        })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    /// Every worksheet with its used range (`None` for empty sheets)
    pub fn sheets(&mut self) -> ExportResult<Vec<SheetSummary>> {
        let mut summaries = Vec::new();
        for name in self.sheet_names() {
            let range = self.workbook.worksheet_range(&name)?;
            summaries.push(SheetSummary {
                used_range: used_range(&range),
                name,
            });
        }
        Ok(summaries)
    }

    /// Reads a range of a worksheet.
    ///
    /// Without a sheet name the first worksheet is used; without an address
    /// the sheet's used range is read. Rows and columns past the used range
    /// hold no data and are cut off.
    pub fn read_range(
        &mut self,
        sheet: Option<&str>,
        address: Option<&RangeAddress>,
    ) -> ExportResult<CellGrid> {
        let names = self.sheet_names();
        let sheet_name = match sheet {
            Some(name) => names
                .iter()
                .find(|n| n.as_str() == name)
                .or_else(|| names.iter().find(|n| n.eq_ignore_ascii_case(name)))
                .cloned()
                .ok_or_else(|| ExportError::SheetNotFound(name.to_string()))?,
            None => names
                .first()
                .cloned()
                .ok_or_else(|| ExportError::Workbook("workbook has no worksheets".to_string()))?,
        };

        let data = self.workbook.worksheet_range(&sheet_name)?;
        let used = used_range(&data);
        let address = match (address, used) {
            (Some(address), Some(used)) => clip_to(address, &used).ok_or_else(|| {
                ExportError::EmptyRange(format!("{}!{}", sheet_name, address))
            })?,
            (Some(address), None) => {
                return Err(ExportError::EmptyRange(format!("{}!{}", sheet_name, address)))
            }
            (None, Some(used)) => used,
            (None, None) => return Err(ExportError::EmptyRange(format!("{}!A1", sheet_name))),
        };

        let mut rows = Vec::with_capacity(address.height());
        for row in address.first_row..=address.last_row {
            let mut cells = Vec::with_capacity(address.width());
            for col in address.first_col..=address.last_col {
                let cell = data
                    .get_value((row, col))
                    .map(|value| convert_cell(value, self.use_formatted_values))
                    .unwrap_or_default();
                cells.push(cell);
            }
            rows.push(cells);
        }

        let grid = CellGrid::new(sheet_name, address.start(), rows);
        if !grid.contains_any_data() {
            return Err(ExportError::EmptyRange(format!(
                "{}!{}",
                grid.sheet_name,
                grid.address()
            )));
        }
        debug!(
            path = %self.path.display(),
            sheet = %grid.sheet_name,
            range = %grid.address(),
            rows = grid.height(),
            columns = grid.width(),
            "read range"
        );
        Ok(grid)
    }
}

/// `address` with its bottom and right edges pulled in to the used range
fn clip_to(address: &RangeAddress, used: &RangeAddress) -> Option<RangeAddress> {
    let last_row = address.last_row.min(used.last_row);
    let last_col = address.last_col.min(used.last_col);
    if last_row < address.first_row || last_col < address.first_col {
        return None;
    }
    Some(RangeAddress::new(address.start(), (last_row, last_col)))
}

fn used_range(range: &Range<Data>) -> Option<RangeAddress> {
    if range.is_empty() {
        return None;
    }
    Some(RangeAddress::new(range.start()?, range.end()?))
}

/// Convert one calamine cell
pub fn convert_cell(value: &Data, use_formatted_values: bool) -> CellValue {
    match value {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if use_formatted_values => serial_to_value(dt.as_f64())
            .unwrap_or(CellValue::Float(dt.as_f64())),
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) => parse_iso(s).unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}

/// Serial of 9999-12-31, the last day Excel can show
const MAX_SERIAL: f64 = 2_958_465.0;

/// Excel serial date (1900 system) to a date, time or date-time value
fn serial_to_value(serial: f64) -> Option<CellValue> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    if serial > MAX_SERIAL {
        return None;
    }
    let seconds = (serial * 86_400.0).round() as i64;
    let datetime = epoch.checked_add_signed(Duration::try_seconds(seconds)?)?;

    if serial < 1.0 {
        Some(CellValue::Time(datetime.time()))
    } else if seconds % 86_400 == 0 {
        Some(CellValue::Date(datetime.date()))
    } else {
        Some(CellValue::DateTime(datetime))
    }
}

fn parse_iso(value: &str) -> Option<CellValue> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(CellValue::DateTime(dt));
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(CellValue::Date(d));
    }
    NaiveTime::parse_from_str(value, "%H:%M:%S%.f")
        .ok()
        .map(CellValue::Time)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_dates() {
        assert_eq!(
            serial_to_value(45_292.0),
            Some(CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
        );
        assert_eq!(
            serial_to_value(0.75),
            Some(CellValue::Time(NaiveTime::from_hms_opt(18, 0, 0).unwrap()))
        );
        assert_eq!(
            serial_to_value(45_292.5),
            Some(CellValue::DateTime(
                NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap()
            ))
        );
        assert_eq!(serial_to_value(-1.0), None);
        assert_eq!(serial_to_value(1e17), None);
        assert_eq!(serial_to_value(f64::INFINITY), None);
        assert!(matches!(serial_to_value(MAX_SERIAL), Some(CellValue::Date(_))));
    }

    #[test]
    fn test_iso_values() {
        assert!(matches!(
            convert_cell(&Data::DateTimeIso("2024-02-03T04:05:06".into()), true),
            CellValue::DateTime(_)
        ));
        assert!(matches!(
            convert_cell(&Data::DateTimeIso("2024-02-03".into()), true),
            CellValue::Date(_)
        ));
        assert_eq!(
            convert_cell(&Data::DateTimeIso("soon".into()), true),
            CellValue::Text("soon".into())
        );
    }

    #[test]
    fn test_plain_cells() {
        assert_eq!(convert_cell(&Data::Int(3), true), CellValue::Int(3));
        assert_eq!(
            convert_cell(&Data::String("x".into()), false),
            CellValue::Text("x".into())
        );
        assert_eq!(convert_cell(&Data::Empty, true), CellValue::Empty);
    }

    #[test]
    fn test_missing_workbook() {
        assert!(matches!(
            WorkbookReader::open("does-not-exist.xlsx", true),
            Err(ExportError::Workbook(_))
        ));
    }
}
