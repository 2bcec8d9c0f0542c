//! Spreadsheet side of an export
//!
//! - Reading: workbook range → [`CellGrid`](crate::types::CellGrid)
//! - Addresses: A1-style cells and ranges
//! - Naming: worksheet and table names that avoid existing ones
//! - Preview: the proposed table written to a colored `.xlsx`

pub mod address;
pub mod naming;
pub mod preview;
pub mod reader;

pub use address::{cell_reference, column_letter, RangeAddress};
pub use preview::{PreviewReport, PreviewWriter};
pub use reader::{SheetSummary, WorkbookReader};
