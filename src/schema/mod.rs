//! Table proposals for a cell range: data types, columns, primary key
//! strategy, validation and export plans.

pub mod column;
pub mod data_type;
pub mod plan;
pub mod table;
pub mod validation;

pub use column::{has_discouraged_characters, ColumnProposal};
pub use data_type::{MySqlDataType, CATALOG, VARCHAR_LENGTHS};
pub use plan::{ColumnPlan, ExportPlan, PrimaryKeyPlan};
pub use table::{default_key_name, normalize_table_name, propose_table_name, TableProposal};
pub use validation::{IssueKind, IssueTarget, ValidationIssue, MAX_IDENTIFIER_LENGTH};
