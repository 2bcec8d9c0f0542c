//! Export plans: the serialized form of every override made to a proposal.
//!
//! A plan is produced from a proposal, edited by hand and applied back to a
//! fresh proposal of the same range. Plans are YAML or JSON and are checked
//! against `schema/export-plan.schema.json` before use.

use crate::error::{ExportError, ExportResult};
use crate::schema::data_type::MySqlDataType;
use crate::schema::table::TableProposal;
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExportPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_row_is_headers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<PrimaryKeyPlan>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnPlan>,
}

/// Either a synthetic key name or the names of existing key columns
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PrimaryKeyPlan {
    #[serde(default)]
    pub synthetic: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
}

/// Overrides for one range column; absent fields keep the proposed value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnPlan {
    pub source: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<MySqlDataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_null: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_index: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<bool>,
}

impl ExportPlan {
    /// Captures the full state of a proposal
    pub fn from_proposal(proposal: &TableProposal) -> Self {
        let primary_key = if proposal.add_primary_key() {
            PrimaryKeyPlan {
                synthetic: Some(proposal.synthetic_key().name.clone()),
                columns: Vec::new(),
            }
        } else {
            PrimaryKeyPlan {
                synthetic: None,
                columns: proposal
                    .primary_key_columns()
                    .iter()
                    .map(|c| c.name.clone())
                    .collect(),
            }
        };

        let columns = proposal
            .data_columns()
            .iter()
            .enumerate()
            .map(|(index, column)| ColumnPlan {
                source: column.source.unwrap_or(index),
                name: Some(column.name.clone()),
                data_type: Some(column.data_type),
                allow_null: Some(column.allow_null),
                unique: Some(column.unique),
                create_index: Some(column.create_index),
                exclude: Some(column.exclude),
            })
            .collect();

        Self {
            sheet: Some(proposal.grid().sheet_name.clone()),
            range: Some(proposal.grid().address()),
            table_name: Some(proposal.raw_name().to_string()),
            first_row_is_headers: Some(proposal.first_row_is_headers()),
            primary_key: Some(primary_key),
            columns,
        }
    }

    /// Applies the plan's overrides to a proposal.
    ///
    /// Exclusions are applied after the key strategy, so a plan may move the
    /// key away from a column and exclude it in one go.
    pub fn apply(&self, proposal: &mut TableProposal) -> ExportResult<()> {
        if let Some(headers) = self.first_row_is_headers {
            proposal.set_first_row_is_headers(headers);
        }
        if let Some(name) = &self.table_name {
            proposal.set_table_name(name);
        }

        for column in &self.columns {
            let index = column.source;
            if let Some(name) = &column.name {
                proposal.rename_column(index, name)?;
            }
            if let Some(data_type) = column.data_type {
                proposal.set_data_type(index, data_type)?;
            }
            if let Some(unique) = column.unique {
                proposal.set_unique(index, unique)?;
            }
            if let Some(create_index) = column.create_index {
                proposal.set_create_index(index, create_index)?;
            }
            if let Some(allow_null) = column.allow_null {
                proposal.set_allow_null(index, allow_null)?;
            }
            if column.exclude == Some(false) {
                proposal.set_exclude(index, false)?;
            }
        }

        if let Some(key) = &self.primary_key {
            match (&key.synthetic, key.columns.is_empty()) {
                (Some(_), false) => {
                    return Err(ExportError::Plan(
                        "primary_key sets both a synthetic key and key columns".to_string(),
                    ));
                }
                (Some(name), true) => {
                    proposal.use_synthetic_key();
                    proposal.set_synthetic_key_name(name);
                }
                (None, false) => proposal.use_existing_keys(&key.columns)?,
                (None, true) => proposal.use_synthetic_key(),
            }
        }

        for column in self.columns.iter().filter(|c| c.exclude == Some(true)) {
            proposal.set_exclude(column.source, true)?;
        }

        debug!(
            table = proposal.name(),
            columns = self.columns.len(),
            "applied export plan"
        );
        Ok(())
    }

    /// Parses a YAML or JSON plan and checks it against the plan schema
    pub fn parse(content: &str) -> ExportResult<Self> {
        let value: serde_json::Value = serde_yaml::from_str(content)?;
        validate_against_schema(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn load(path: &Path) -> ExportResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let plan = Self::parse(&content)
            .map_err(|e| ExportError::Plan(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "loaded export plan");
        Ok(plan)
    }

    pub fn to_yaml(&self) -> ExportResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json(&self) -> ExportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn validate_against_schema(value: &serde_json::Value) -> ExportResult<()> {
    let schema_str = include_str!("../../schema/export-plan.schema.json");
    let schema_value: serde_json::Value = serde_json::from_str(schema_str)
        .map_err(|e| ExportError::Plan(format!("Failed to parse plan schema: {}", e)))?;
    let compiled = JSONSchema::compile(&schema_value)
        .map_err(|e| ExportError::Plan(format!("Failed to compile plan schema: {}", e)))?;

    if let Err(errors) = compiled.validate(value) {
        let messages: Vec<String> = errors.map(|e| format!("  - {}", e)).collect();
        return Err(ExportError::Plan(format!(
            "Schema validation failed:\n{}",
            messages.join("\n")
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportSettings;
    use crate::types::{CellGrid, CellValue};
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn proposal() -> TableProposal {
        let grid = CellGrid::new(
            "Staff",
            (0, 0),
            vec![
                vec![text("emp_no"), text("name"), text("salary")],
                vec![CellValue::Int(7), text("Ann"), CellValue::Float(1200.5)],
                vec![CellValue::Int(8), text("Bob"), CellValue::Float(990.0)],
            ],
        );
        TableProposal::from_grid(grid, &ExportSettings::default()).unwrap()
    }

    #[test]
    fn test_plan_round_trip() {
        let mut edited = proposal();
        edited.set_table_name("Team Members");
        edited.rename_column(1, "full_name").unwrap();
        edited.set_data_type(2, MySqlDataType::Double).unwrap();
        edited.set_unique(1, true).unwrap();
        edited.set_create_index(1, false).unwrap();
        edited.use_synthetic_key();
        edited.set_synthetic_key_name("member_id");
        edited.set_exclude(0, true).unwrap();

        let plan = ExportPlan::from_proposal(&edited);
        let reparsed = ExportPlan::parse(&plan.to_yaml().unwrap()).unwrap();
        assert_eq!(reparsed, plan);

        let mut fresh = proposal();
        reparsed.apply(&mut fresh).unwrap();
        assert_eq!(ExportPlan::from_proposal(&fresh), plan);
        assert_eq!(fresh.name(), "team_members");
        assert_eq!(fresh.synthetic_key().name, "member_id");
    }

    #[test]
    fn test_partial_plan() {
        let plan = ExportPlan::parse(
            r#"
table_name: staff_2024
columns:
  - source: 2
    data_type: Decimal(10, 2)
"#,
        )
        .unwrap();
        let mut p = proposal();
        plan.apply(&mut p).unwrap();
        assert_eq!(p.name(), "staff_2024");
        assert_eq!(p.synthetic_key().name, "staff_2024_id");
        assert_eq!(
            p.column(2).unwrap().data_type,
            MySqlDataType::Decimal { precision: 10, scale: 2 }
        );
        assert_eq!(p.column(1).unwrap().name, "name");
    }

    #[test]
    fn test_json_plan_moves_key() {
        let plan = ExportPlan::parse(
            r#"{"primary_key": {"columns": ["name"]}, "columns": [{"source": 0, "exclude": true}]}"#,
        )
        .unwrap();
        let mut p = proposal();
        plan.apply(&mut p).unwrap();
        let keys: Vec<&str> = p.primary_key_columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(keys, vec!["name"]);
        assert!(p.column(0).unwrap().exclude);
    }

    #[test]
    fn test_schema_rejects_unknown_fields() {
        let err = ExportPlan::parse("table: x\n").unwrap_err();
        assert!(matches!(err, ExportError::Plan(_)));
        assert!(ExportPlan::parse("columns:\n  - name: x\n").is_err());
    }

    #[test]
    fn test_bad_data_type_and_index() {
        assert!(ExportPlan::parse("columns:\n  - source: 0\n    data_type: Blob\n").is_err());
        let plan = ExportPlan::parse("columns:\n  - source: 9\n    name: x\n").unwrap();
        assert!(matches!(
            plan.apply(&mut proposal()),
            Err(ExportError::ColumnIndex { index: 9, .. })
        ));
    }

    #[test]
    fn test_conflicting_key_plan() {
        let plan = ExportPlan::parse("primary_key:\n  synthetic: id\n  columns: [name]\n").unwrap();
        assert!(matches!(plan.apply(&mut proposal()), Err(ExportError::Plan(_))));
    }
}
