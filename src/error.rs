use crate::schema::ValidationIssue;
use thiserror::Error;

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Excel write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Invalid range '{0}'")]
    Range(String),

    #[error("Worksheet '{0}' not found")]
    SheetNotFound(String),

    #[error("Range {0} contains no data")]
    EmptyRange(String),

    #[error("Column index {index} out of range ({count} columns)")]
    ColumnIndex { index: usize, count: usize },

    #[error("Invalid data type '{0}'")]
    DataType(String),

    #[error("Invalid override: {0}")]
    Override(String),

    #[error("Export plan error: {0}")]
    Plan(String),

    #[error("Validation failed:\n{}", format_issues(.0))]
    Validation(Vec<ValidationIssue>),

    #[error("Table '{0}' already exists in the schema")]
    TableExists(String),

    #[error("{stage} failed: {message}")]
    Database { stage: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<calamine::Error> for ExportError {
    fn from(e: calamine::Error) -> Self {
        ExportError::Workbook(e.to_string())
    }
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("  - {}", issue))
        .collect::<Vec<_>>()
        .join("\n")
}
