//! Export settings loaded from a YAML file
//!
//! Every field is optional in the file; missing fields keep their defaults.
//!
//! ```yaml
//! use_formatted_values: true
//! detect_data_types: true
//! auto_index_int_columns: true
//! auto_allow_empty_non_index_columns: true
//! rows_per_insert: 100
//! default_schema: sales
//! ```

use crate::error::{ExportError, ExportResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Settings that shape the initial proposal and the generated SQL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportSettings {
    /// Read dates as dates; when off, date cells are read as serial numbers
    pub use_formatted_values: bool,
    /// Infer column types; when off, every column is `Varchar(255)`
    pub detect_data_types: bool,
    /// Index integer columns automatically
    pub auto_index_int_columns: bool,
    /// Allow NULL in every column that is not indexed
    pub auto_allow_empty_non_index_columns: bool,
    /// Rows per INSERT statement
    pub rows_per_insert: usize,
    /// Schema used when none is given on the command line
    pub default_schema: Option<String>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            use_formatted_values: true,
            detect_data_types: true,
            auto_index_int_columns: true,
            auto_allow_empty_non_index_columns: true,
            rows_per_insert: 100,
            default_schema: None,
        }
    }
}

impl ExportSettings {
    /// Load settings from a YAML file
    pub fn load(path: &Path) -> ExportResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: ExportSettings = serde_yaml::from_str(&content)?;
        settings.validate()?;
        debug!(path = %path.display(), ?settings, "loaded export settings");
        Ok(settings)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> ExportResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> ExportResult<()> {
        if self.rows_per_insert == 0 {
            return Err(ExportError::Config(
                "rows_per_insert must be at least 1".to_string(),
            ));
        }
        if let Some(schema) = &self.default_schema {
            if schema.trim().is_empty() {
                return Err(ExportError::Config(
                    "default_schema must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "rows_per_insert: 25\ndetect_data_types: false").unwrap();

        let settings = ExportSettings::load(file.path()).unwrap();
        assert_eq!(settings.rows_per_insert, 25);
        assert!(!settings.detect_data_types);
        assert!(settings.use_formatted_values);
        assert!(settings.auto_index_int_columns);
    }

    #[test]
    fn test_zero_rows_per_insert_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "rows_per_insert: 0").unwrap();
        assert!(matches!(
            ExportSettings::load(file.path()),
            Err(ExportError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "row_per_insert: 10").unwrap();
        assert!(matches!(
            ExportSettings::load(file.path()),
            Err(ExportError::Yaml(_))
        ));
    }
}
