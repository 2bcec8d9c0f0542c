//! Checks that decide whether a table proposal can be exported

use crate::schema::column::{has_discouraged_characters, ColumnProposal};
use crate::schema::table::TableProposal;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// MySQL identifier length limit
pub const MAX_IDENTIFIER_LENGTH: usize = 64;

pub const NAMES_WARNING: &str =
    "Names with spaces or upper-case letters are discouraged in MySQL identifiers";
pub const KEY_COLUMN_EXISTS_WARNING: &str =
    "A column with this name already exists, pick another name for the primary key";
pub const DATA_NOT_UNIQUE_WARNING: &str =
    "The column contains duplicate values and cannot be made unique";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    EmptyTableName,
    NameTooLong,
    DiscouragedName,
    EmptyColumnName,
    DuplicateColumnName,
    KeyColumnExists,
    DataNotUnique,
    EmptyValuesInNonNullColumn,
    EmptyValuesInKeyColumn,
    NoColumns,
    NoPrimaryKey,
}

/// What an issue is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueTarget {
    Table,
    PrimaryKey,
    Column(String),
}

/// A validation finding. Blocking issues prevent the export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub target: IssueTarget,
    pub kind: IssueKind,
    pub message: String,
    pub blocking: bool,
}

impl ValidationIssue {
    pub fn new(target: IssueTarget, kind: IssueKind, message: impl Into<String>, blocking: bool) -> Self {
        Self {
            target,
            kind,
            message: message.into(),
            blocking,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = if self.blocking { "error" } else { "warning" };
        match &self.target {
            IssueTarget::Table => write!(f, "{} [table]: {}", level, self.message),
            IssueTarget::PrimaryKey => write!(f, "{} [primary key]: {}", level, self.message),
            IssueTarget::Column(name) => {
                write!(f, "{} [column '{}']: {}", level, name, self.message)
            }
        }
    }
}

impl TableProposal {
    /// Runs every check against the proposal's current state
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        self.validate_table_name(&mut issues);
        self.validate_synthetic_key(&mut issues);
        self.validate_columns(&mut issues);
        self.validate_primary_key(&mut issues);
        issues
    }

    pub fn is_exportable(&self) -> bool {
        self.validate().iter().all(|issue| !issue.blocking)
    }

    /// Issues concerning one data column
    pub fn column_issues(&self, index: usize) -> Vec<ValidationIssue> {
        match self.column(index) {
            Ok(column) => {
                let target = IssueTarget::Column(column.name.clone());
                self.validate()
                    .into_iter()
                    .filter(|issue| issue.target == target)
                    .collect()
            }
            Err(_) => Vec::new(),
        }
    }

    fn validate_table_name(&self, issues: &mut Vec<ValidationIssue>) {
        let name = self.name();
        if name.is_empty() {
            issues.push(ValidationIssue::new(
                IssueTarget::Table,
                IssueKind::EmptyTableName,
                "The table name is empty",
                true,
            ));
        } else if name.chars().count() > MAX_IDENTIFIER_LENGTH {
            issues.push(ValidationIssue::new(
                IssueTarget::Table,
                IssueKind::NameTooLong,
                format!("The table name is longer than {} characters", MAX_IDENTIFIER_LENGTH),
                true,
            ));
        }
        if has_discouraged_characters(self.raw_name()) {
            issues.push(ValidationIssue::new(
                IssueTarget::Table,
                IssueKind::DiscouragedName,
                NAMES_WARNING,
                false,
            ));
        }
    }

    fn validate_synthetic_key(&self, issues: &mut Vec<ValidationIssue>) {
        if !self.add_primary_key() {
            return;
        }
        let key = self.synthetic_key();
        if key.name.is_empty() {
            issues.push(ValidationIssue::new(
                IssueTarget::PrimaryKey,
                IssueKind::EmptyColumnName,
                "The primary key column name is empty",
                true,
            ));
            return;
        }
        let lowered = key.name.to_lowercase();
        if self
            .data_columns()
            .iter()
            .any(|c| c.name.to_lowercase() == lowered)
        {
            issues.push(ValidationIssue::new(
                IssueTarget::PrimaryKey,
                IssueKind::KeyColumnExists,
                KEY_COLUMN_EXISTS_WARNING,
                true,
            ));
        }
    }

    fn validate_columns(&self, issues: &mut Vec<ValidationIssue>) {
        let exported: Vec<&ColumnProposal> =
            self.exported_columns().filter(|c| !c.is_synthetic()).collect();
        if exported.is_empty() {
            issues.push(ValidationIssue::new(
                IssueTarget::Table,
                IssueKind::NoColumns,
                "Every column is excluded, there is nothing to export",
                true,
            ));
            return;
        }

        let mut seen = HashSet::new();
        for column in exported {
            let target = IssueTarget::Column(column.name.clone());
            if column.name.is_empty() {
                issues.push(ValidationIssue::new(
                    target,
                    IssueKind::EmptyColumnName,
                    "The column name is empty",
                    true,
                ));
                continue;
            }
            if column.name.chars().count() > MAX_IDENTIFIER_LENGTH {
                issues.push(ValidationIssue::new(
                    target.clone(),
                    IssueKind::NameTooLong,
                    format!("The column name is longer than {} characters", MAX_IDENTIFIER_LENGTH),
                    true,
                ));
            }
            if !seen.insert(column.name.to_lowercase()) {
                issues.push(ValidationIssue::new(
                    target.clone(),
                    IssueKind::DuplicateColumnName,
                    "Another column already uses this name",
                    true,
                ));
            }
            if has_discouraged_characters(&column.name) {
                issues.push(ValidationIssue::new(
                    target.clone(),
                    IssueKind::DiscouragedName,
                    NAMES_WARNING,
                    false,
                ));
            }

            let values = self.column_values(column);
            let has_empty = values.iter().any(|v| v.is_empty());
            let is_key = column.primary_key && !self.add_primary_key();
            if has_empty && is_key {
                issues.push(ValidationIssue::new(
                    target.clone(),
                    IssueKind::EmptyValuesInKeyColumn,
                    "The column is part of the primary key but contains empty cells",
                    true,
                ));
            } else if has_empty && !column.allow_null {
                issues.push(ValidationIssue::new(
                    target.clone(),
                    IssueKind::EmptyValuesInNonNullColumn,
                    "The column contains empty cells but does not allow NULL",
                    true,
                ));
            }

            if column.unique {
                let mut distinct = HashSet::new();
                let duplicated = values
                    .iter()
                    .filter(|v| !v.is_empty())
                    .any(|v| !distinct.insert(v.to_string()));
                if duplicated {
                    issues.push(ValidationIssue::new(
                        target,
                        IssueKind::DataNotUnique,
                        DATA_NOT_UNIQUE_WARNING,
                        true,
                    ));
                }
            }
        }
    }

    fn validate_primary_key(&self, issues: &mut Vec<ValidationIssue>) {
        if !self.add_primary_key() && self.primary_key_columns().is_empty() {
            issues.push(ValidationIssue::new(
                IssueTarget::PrimaryKey,
                IssueKind::NoPrimaryKey,
                "No column is selected as primary key",
                true,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportSettings;
    use crate::types::{CellGrid, CellValue};

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn proposal() -> TableProposal {
        let grid = CellGrid::new(
            "Products",
            (0, 0),
            vec![
                vec![text("sku"), text("name"), text("price")],
                vec![CellValue::Int(10), text("pen"), CellValue::Float(1.5)],
                vec![CellValue::Int(11), text("pen"), CellValue::Empty],
            ],
        );
        TableProposal::from_grid(grid, &ExportSettings::default()).unwrap()
    }

    fn kinds(p: &TableProposal) -> Vec<IssueKind> {
        p.validate().into_iter().map(|i| i.kind).collect()
    }

    #[test]
    fn test_default_proposal_is_exportable() {
        let p = proposal();
        assert!(p.validate().is_empty(), "{:?}", p.validate());
        assert!(p.is_exportable());
    }

    #[test]
    fn test_non_unique_values_block_export() {
        let mut p = proposal();
        p.set_unique(1, true).unwrap();
        assert_eq!(kinds(&p), vec![IssueKind::DataNotUnique]);
        assert!(!p.is_exportable());
        assert_eq!(p.column_issues(1).len(), 1);
        p.set_unique(1, false).unwrap();
        assert!(p.is_exportable());
    }

    #[test]
    fn test_discouraged_names_only_warn() {
        let mut p = proposal();
        p.set_table_name("My Products");
        p.rename_column(1, "Product Name").unwrap();
        let issues = p.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| !i.blocking));
        assert!(p.is_exportable());
    }

    #[test]
    fn test_synthetic_key_collision() {
        let mut p = proposal();
        p.use_synthetic_key();
        p.set_synthetic_key_name("SKU");
        assert_eq!(kinds(&p), vec![IssueKind::KeyColumnExists]);
    }

    #[test]
    fn test_duplicate_and_empty_names() {
        let mut p = proposal();
        p.rename_column(2, "name").unwrap();
        assert_eq!(kinds(&p), vec![IssueKind::DuplicateColumnName]);
        p.rename_column(2, "  ").unwrap();
        assert_eq!(kinds(&p), vec![IssueKind::EmptyColumnName]);
        p.set_exclude(2, true).unwrap();
        assert!(p.is_exportable());
    }

    #[test]
    fn test_empty_cells_need_nullable_column() {
        let mut p = proposal();
        p.set_allow_null(2, false).unwrap();
        assert_eq!(kinds(&p), vec![IssueKind::EmptyValuesInNonNullColumn]);
        p.use_existing_key("price").unwrap();
        assert_eq!(kinds(&p), vec![IssueKind::EmptyValuesInKeyColumn]);
    }

    #[test]
    fn test_empty_table_name_and_no_columns() {
        let mut p = proposal();
        p.set_table_name("   ");
        p.use_synthetic_key();
        for index in 0..3 {
            p.set_exclude(index, true).unwrap();
        }
        assert_eq!(kinds(&p), vec![IssueKind::EmptyTableName, IssueKind::NoColumns]);
    }

    #[test]
    fn test_display() {
        let issue = ValidationIssue::new(
            IssueTarget::Column("Amount".to_string()),
            IssueKind::DataNotUnique,
            DATA_NOT_UNIQUE_WARNING,
            true,
        );
        assert_eq!(
            issue.to_string(),
            format!("error [column 'Amount']: {}", DATA_NOT_UNIQUE_WARNING)
        );

        let issue = ValidationIssue::new(IssueTarget::Table, IssueKind::DiscouragedName, NAMES_WARNING, false);
        assert_eq!(issue.to_string(), format!("warning [table]: {}", NAMES_WARNING));
    }
}
