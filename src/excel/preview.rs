//! Preview workbook: the proposed table laid over its data, colored by state

use crate::error::ExportResult;
use crate::excel::naming::worksheet_name_avoiding_duplicates;
use crate::schema::{ColumnProposal, IssueTarget, TableProposal, ValidationIssue};
use crate::sql::column_definition;
use crate::types::CellValue;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_xlsxwriter::{Color, Format, FormatBorder, Note, Workbook, Worksheet};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Cell fill colors
pub mod colors {
    pub const ERRORED: u32 = 0xFF8282;
    pub const LOCKED: u32 = 0xD7D7D7;
    pub const NEW_ROW: u32 = 0xFFFCC7;
    pub const UNCOMMITTED: u32 = 0xB8E5F7;
    pub const WARNING: u32 = 0xFCC451;
}

pub const COLUMNS_SHEET: &str = "Columns";

const DATE_FORMAT: &str = "yyyy-mm-dd";
const TIME_FORMAT: &str = "hh:mm:ss";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnState {
    Generated,
    Exported,
    Excluded,
    Warning,
    Errored,
}

impl ColumnState {
    fn header_color(self) -> u32 {
        match self {
            ColumnState::Generated => colors::NEW_ROW,
            ColumnState::Exported => colors::UNCOMMITTED,
            ColumnState::Excluded => colors::LOCKED,
            ColumnState::Warning => colors::WARNING,
            ColumnState::Errored => colors::ERRORED,
        }
    }

    /// Warnings only color the header; data keeps the exported color
    fn body_color(self) -> u32 {
        match self {
            ColumnState::Warning => colors::UNCOMMITTED,
            other => other.header_color(),
        }
    }
}

/// Where the preview went and how to unprotect it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewReport {
    pub data_sheet: String,
    pub rows: usize,
    pub protection_key: String,
}

pub struct PreviewWriter<'a> {
    proposal: &'a TableProposal,
    issues: Vec<ValidationIssue>,
}

impl<'a> PreviewWriter<'a> {
    pub fn new(proposal: &'a TableProposal) -> Self {
        Self {
            proposal,
            issues: proposal.validate(),
        }
    }

    /// Writes the preview workbook. Both sheets are protected with a fresh key.
    pub fn write(&self, output_path: &Path) -> ExportResult<PreviewReport> {
        let mut workbook = Workbook::new();
        let protection_key = Uuid::new_v4().to_string();
        let data_sheet =
            worksheet_name_avoiding_duplicates(&[COLUMNS_SHEET], &self.proposal.grid().sheet_name);

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&data_sheet)?;
        self.write_data_sheet(worksheet)?;
        worksheet.protect_with_password(&protection_key);

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(COLUMNS_SHEET)?;
        self.write_columns_sheet(worksheet)?;
        worksheet.protect_with_password(&protection_key);

        workbook.save(output_path)?;
        info!(path = %output_path.display(), sheet = %data_sheet, "wrote preview workbook");

        Ok(PreviewReport {
            data_sheet,
            rows: self.proposal.row_count(),
            protection_key,
        })
    }

    /// Synthetic key first when used, then every data column
    fn preview_columns(&self) -> Vec<&'a ColumnProposal> {
        let proposal = self.proposal;
        let mut columns = Vec::new();
        if proposal.add_primary_key() {
            columns.push(proposal.synthetic_key());
        }
        columns.extend(proposal.data_columns());
        columns
    }

    fn column_issues(&self, column: &ColumnProposal) -> Vec<&ValidationIssue> {
        let target = if column.is_synthetic() {
            IssueTarget::PrimaryKey
        } else {
            IssueTarget::Column(column.name.clone())
        };
        self.issues.iter().filter(|i| i.target == target).collect()
    }

    fn column_state(&self, column: &ColumnProposal) -> ColumnState {
        let issues = self.column_issues(column);
        if column.exclude {
            ColumnState::Excluded
        } else if issues.iter().any(|i| i.blocking) {
            ColumnState::Errored
        } else if !issues.is_empty() {
            ColumnState::Warning
        } else if column.is_synthetic() {
            ColumnState::Generated
        } else {
            ColumnState::Exported
        }
    }

    fn write_data_sheet(&self, worksheet: &mut Worksheet) -> ExportResult<()> {
        let columns = self.preview_columns();

        for (col_idx, column) in columns.iter().enumerate() {
            let col = col_idx as u16;
            let state = self.column_state(column);
            let header = cell_format(state.header_color()).set_bold();
            worksheet.write_string_with_format(0, col, &column.name, &header)?;

            let definition = if column.exclude {
                "(excluded)".to_string()
            } else {
                column_definition(column)
            };
            let italic = cell_format(state.header_color()).set_italic();
            worksheet.write_string_with_format(1, col, &definition, &italic)?;

            let issues = self.column_issues(column);
            if !issues.is_empty() {
                let text: Vec<&str> = issues.iter().map(|i| i.message.as_str()).collect();
                let note = Note::new(text.join("\n")).set_author("sheet-export");
                worksheet.insert_note(0, col, &note)?;
            }
            worksheet.set_column_width(col, 18)?;
        }

        for (row_idx, row) in self.proposal.data_rows().iter().enumerate() {
            let excel_row = row_idx as u32 + 2;
            for (col_idx, column) in columns.iter().enumerate() {
                let col = col_idx as u16;
                let color = self.column_state(column).body_color();
                match column.source {
                    None => {
                        worksheet.write_string_with_format(
                            excel_row,
                            col,
                            "(auto)",
                            &cell_format(color).set_italic(),
                        )?;
                    }
                    Some(source) => {
                        let value = row.get(source).unwrap_or(&CellValue::Empty);
                        write_cell_value(worksheet, excel_row, col, value, color)?;
                    }
                }
            }
        }

        worksheet.set_freeze_panes(2, 0)?;
        Ok(())
    }

    fn write_columns_sheet(&self, worksheet: &mut Worksheet) -> ExportResult<()> {
        let headers = [
            "Column",
            "Type",
            "Primary key",
            "Allow null",
            "Unique",
            "Index",
            "Excluded",
            "Issues",
        ];
        let bold = Format::new().set_bold().set_border(FormatBorder::Thin);
        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
            worksheet.set_column_width(col as u16, if col == 7 { 60 } else { 14 })?;
        }

        let key_names: Vec<&str> = self
            .proposal
            .primary_key_columns()
            .iter()
            .map(|c| c.name.as_str())
            .collect();

        for (idx, column) in self.preview_columns().iter().enumerate() {
            let row = idx as u32 + 1;
            let format = cell_format(self.column_state(column).header_color());
            let is_key = key_names.contains(&column.name.as_str());
            let issues: Vec<String> = self
                .column_issues(column)
                .iter()
                .map(|i| i.to_string())
                .collect();

            worksheet.write_string_with_format(row, 0, &column.name, &format)?;
            worksheet.write_string_with_format(row, 1, column.data_type.to_string(), &format)?;
            for (col, flag) in [
                is_key,
                column.allow_null,
                column.unique,
                column.create_index,
                column.exclude,
            ]
            .into_iter()
            .enumerate()
            {
                worksheet.write_boolean_with_format(row, col as u16 + 2, flag, &format)?;
            }
            worksheet.write_string_with_format(row, 7, issues.join("; "), &format)?;
        }
        Ok(())
    }
}

fn cell_format(color: u32) -> Format {
    Format::new()
        .set_background_color(Color::RGB(color))
        .set_border(FormatBorder::Thin)
}

/// Write a single cell value based on its type
fn write_cell_value(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    color: u32,
) -> ExportResult<()> {
    let format = cell_format(color);
    match value {
        CellValue::Empty => {
            worksheet.write_blank(row, col, &format)?;
        }
        CellValue::Int(i) => {
            worksheet.write_number_with_format(row, col, *i as f64, &format)?;
        }
        CellValue::Float(f) => {
            worksheet.write_number_with_format(row, col, *f, &format)?;
        }
        CellValue::Bool(b) => {
            worksheet.write_boolean_with_format(row, col, *b, &format)?;
        }
        CellValue::Text(s) | CellValue::Error(s) => {
            worksheet.write_string_with_format(row, col, s, &format)?;
        }
        CellValue::Date(d) => {
            let serial = date_serial(*d);
            worksheet.write_number_with_format(row, col, serial, &format.set_num_format(DATE_FORMAT))?;
        }
        CellValue::Time(t) => {
            let serial = time_serial(*t);
            worksheet.write_number_with_format(row, col, serial, &format.set_num_format(TIME_FORMAT))?;
        }
        CellValue::DateTime(dt) => {
            let serial = datetime_serial(*dt);
            worksheet.write_number_with_format(
                row,
                col,
                serial,
                &format.set_num_format(DATETIME_FORMAT),
            )?;
        }
    }
    Ok(())
}

fn date_serial(date: NaiveDate) -> f64 {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .map(|epoch| (date - epoch).num_days() as f64)
        .unwrap_or_default()
}

fn time_serial(time: NaiveTime) -> f64 {
    time.num_seconds_from_midnight() as f64 / 86_400.0
}

fn datetime_serial(datetime: NaiveDateTime) -> f64 {
    date_serial(datetime.date()) + time_serial(datetime.time())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serials() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(date_serial(date), 45_292.0);
        assert_eq!(time_serial(NaiveTime::from_hms_opt(6, 0, 0).unwrap()), 0.25);
        assert_eq!(datetime_serial(date.and_hms_opt(12, 0, 0).unwrap()), 45_292.5);
    }

    #[test]
    fn test_state_colors() {
        assert_eq!(ColumnState::Warning.header_color(), colors::WARNING);
        assert_eq!(ColumnState::Warning.body_color(), colors::UNCOMMITTED);
        assert_eq!(ColumnState::Excluded.body_color(), colors::LOCKED);
    }
}
