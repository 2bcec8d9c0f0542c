//! Sheet Export - spreadsheet ranges to MySQL tables
//!
//! This library reads a range of an Excel workbook, proposes a MySQL table
//! for it (column names, data types, primary key, indexes), lets the caller
//! override the proposal, and generates or runs the `CREATE TABLE` and
//! `INSERT` statements that copy the data into a MySQL schema.
//!
//! # Features
//!
//! - Data type inference from cell values (INTEGER, DECIMAL, DATE, VARCHAR(n), ...)
//! - Primary key proposal: an existing integer column or an added AUTO_INCREMENT key
//! - Column overrides, recorded as YAML/JSON export plans validated by JSON Schema
//! - Blocking errors and warnings computed from the current proposal
//! - Batched `INSERT` generation and execution over sqlx
//! - Colored `.xlsx` preview of the proposed table
//!
//! # Example
//!
//! ```no_run
//! use sheet_export::excel::WorkbookReader;
//! use sheet_export::sql::SqlGenerator;
//! use sheet_export::{ExportSettings, TableProposal};
//!
//! let settings = ExportSettings::default();
//! let mut reader = WorkbookReader::open("orders.xlsx", settings.use_formatted_values)?;
//! let grid = reader.read_range(Some("Orders"), None)?;
//!
//! let mut proposal = TableProposal::from_grid(grid, &settings)?;
//! proposal.set_table_name("customer_orders");
//!
//! for issue in proposal.validate() {
//!     println!("{}", issue);
//! }
//! println!("{}", SqlGenerator::new(&proposal).create_table());
//! # Ok::<(), sheet_export::error::ExportError>(())
//! ```

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod excel;
pub mod schema;
pub mod sql;
pub mod types;

// Re-export commonly used types
pub use config::ExportSettings;
pub use error::{ExportError, ExportResult};
pub use schema::{ColumnProposal, ExportPlan, MySqlDataType, TableProposal, ValidationIssue};
pub use sql::{SqlGenerator, SqlValue};
pub use types::{CellGrid, CellValue};
