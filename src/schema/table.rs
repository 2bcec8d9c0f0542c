//! Table proposal built from a cell range, and the operations that override it

use crate::config::ExportSettings;
use crate::error::{ExportError, ExportResult};
use crate::schema::column::ColumnProposal;
use crate::schema::data_type::MySqlDataType;
use crate::types::{CellGrid, CellValue};
use tracing::debug;

/// Lower-cases a table name and replaces spaces with underscores
pub fn normalize_table_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Table name suggested for a worksheet; default sheet names ("Sheet1") suggest nothing
pub fn propose_table_name(sheet_name: &str) -> String {
    if sheet_name.to_lowercase().starts_with("sheet") {
        String::new()
    } else {
        normalize_table_name(sheet_name.trim())
    }
}

/// Name of the synthetic key column for a table
pub fn default_key_name(table_name: &str) -> String {
    if table_name.is_empty() {
        "id".to_string()
    } else {
        format!("{}_id", table_name)
    }
}

/// Proposed definition of a new MySQL table for a range of cells.
///
/// The synthetic key column always sits at position 0 of the column list and
/// is only part of the table while `add_primary_key` is set. Data columns are
/// addressed 0-based, in range order.
#[derive(Debug, Clone)]
pub struct TableProposal {
    name: String,
    raw_name: String,
    grid: CellGrid,
    columns: Vec<ColumnProposal>,
    first_row_is_headers: bool,
    add_primary_key: bool,
    key_name_overridden: bool,
    detect_data_types: bool,
    auto_index_int_columns: bool,
    auto_allow_empty_non_index_columns: bool,
}

impl TableProposal {
    /// Builds the default proposal for a range: names from the header row,
    /// inferred types and the default primary key.
    pub fn from_grid(grid: CellGrid, settings: &ExportSettings) -> ExportResult<Self> {
        if grid.is_empty() || !grid.contains_any_data() {
            return Err(ExportError::EmptyRange(grid.address()));
        }

        let name = propose_table_name(&grid.sheet_name);
        let mut proposal = Self {
            raw_name: name.clone(),
            columns: vec![ColumnProposal::synthetic_key(default_key_name(&name))],
            name,
            grid,
            first_row_is_headers: true,
            add_primary_key: true,
            key_name_overridden: false,
            detect_data_types: settings.detect_data_types,
            auto_index_int_columns: settings.auto_index_int_columns,
            auto_allow_empty_non_index_columns: settings.auto_allow_empty_non_index_columns,
        };
        proposal.build_columns();
        proposal.set_default_primary_key();

        debug!(
            table = %proposal.name,
            range = %proposal.grid.address(),
            columns = proposal.grid.width(),
            synthetic_key = proposal.add_primary_key,
            "built table proposal"
        );
        Ok(proposal)
    }

    //--------------------------------------------------------------------------
    // Accessors
    //--------------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table name as last entered, before normalization
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    pub fn first_row_is_headers(&self) -> bool {
        self.first_row_is_headers
    }

    /// Whether the synthetic auto-increment key is added
    pub fn add_primary_key(&self) -> bool {
        self.add_primary_key
    }

    pub fn synthetic_key(&self) -> &ColumnProposal {
        &self.columns[0]
    }

    pub fn data_columns(&self) -> &[ColumnProposal] {
        &self.columns[1..]
    }

    pub fn column(&self, index: usize) -> ExportResult<&ColumnProposal> {
        let count = self.data_columns().len();
        self.columns
            .get(index + 1)
            .ok_or(ExportError::ColumnIndex { index, count })
    }

    fn column_mut(&mut self, index: usize) -> ExportResult<&mut ColumnProposal> {
        let count = self.data_columns().len();
        self.columns
            .get_mut(index + 1)
            .ok_or(ExportError::ColumnIndex { index, count })
    }

    /// Index of the first data column carrying `name` (case-sensitive)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.data_columns().iter().position(|c| c.name == name)
    }

    /// Columns that make it into the table, in order
    pub fn exported_columns(&self) -> impl Iterator<Item = &ColumnProposal> + '_ {
        let add_key = self.add_primary_key;
        self.columns
            .iter()
            .filter(move |c| if c.is_synthetic() { add_key } else { !c.exclude })
    }

    pub fn primary_key_columns(&self) -> Vec<&ColumnProposal> {
        if self.add_primary_key {
            vec![self.synthetic_key()]
        } else {
            self.data_columns()
                .iter()
                .filter(|c| c.primary_key && !c.exclude)
                .collect()
        }
    }

    /// Data columns that may be picked as the key
    pub fn primary_key_candidates(&self) -> Vec<&str> {
        self.data_columns()
            .iter()
            .filter(|c| !c.exclude)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// First grid row holding data rather than headers
    pub fn data_start_row(&self) -> usize {
        usize::from(self.first_row_is_headers)
    }

    pub fn data_rows(&self) -> &[Vec<CellValue>] {
        let rows = self.grid.rows();
        &rows[self.data_start_row().min(rows.len())..]
    }

    pub fn row_count(&self) -> usize {
        self.data_rows().len()
    }

    /// Values of a data column below the header row
    pub fn column_values(&self, column: &ColumnProposal) -> Vec<&CellValue> {
        match column.source {
            Some(source) => self.grid.column(source, self.data_start_row()).collect(),
            None => Vec::new(),
        }
    }

    /// True when every data row has an integer in the first column.
    /// An empty cell disqualifies the column, since it cannot hold a key value.
    pub fn first_column_contains_integers(&self) -> bool {
        if self.grid.width() == 0 || self.row_count() == 0 {
            return false;
        }
        self.grid
            .column(0, self.data_start_row())
            .all(CellValue::is_integer)
    }

    //--------------------------------------------------------------------------
    // Initial proposal
    //--------------------------------------------------------------------------

    fn build_columns(&mut self) {
        let data_start = self.data_start_row();
        let key_name = self.columns[0].name.clone();
        let mut columns = vec![ColumnProposal::synthetic_key(key_name)];

        for col in 0..self.grid.width() {
            let name = if self.first_row_is_headers {
                let header = self.grid.get(0, col).to_string();
                let header = header.trim();
                if header.is_empty() {
                    format!("Column{}", col + 1)
                } else {
                    header.to_string()
                }
            } else {
                format!("Column{}", col + 1)
            };

            let data_type = if self.detect_data_types {
                MySqlDataType::infer(self.grid.column(col, data_start))
            } else {
                MySqlDataType::DEFAULT_STRING
            };

            let mut column = ColumnProposal::new(name, data_type, col);
            column.create_index = self.auto_index_int_columns && data_type.is_integer();
            let has_empty = self.grid.column(col, data_start).any(CellValue::is_empty);
            column.allow_null =
                has_empty || (self.auto_allow_empty_non_index_columns && !column.create_index);
            columns.push(column);
        }

        self.columns = columns;
    }

    /// Uses the first column as key when it holds only integers, the synthetic key otherwise
    fn set_default_primary_key(&mut self) {
        if self.first_column_contains_integers() {
            self.add_primary_key = false;
            let first = &mut self.columns[1];
            first.primary_key = true;
            first.exclude = false;
        } else {
            self.add_primary_key = true;
        }
    }

    //--------------------------------------------------------------------------
    // Overrides
    //--------------------------------------------------------------------------

    /// Sets the table name; the stored name is normalized and the synthetic
    /// key is renamed after it unless its name was set explicitly.
    pub fn set_table_name(&mut self, raw: &str) {
        let raw = raw.trim();
        self.raw_name = raw.to_string();
        self.name = normalize_table_name(raw);
        if !self.key_name_overridden {
            self.columns[0].name = default_key_name(&self.name);
        }
    }

    /// Switches header mode. Column names and types are rebuilt from the range
    /// and the default primary key is proposed again.
    pub fn set_first_row_is_headers(&mut self, headers: bool) {
        if self.first_row_is_headers == headers {
            return;
        }
        self.first_row_is_headers = headers;
        self.build_columns();
        self.set_default_primary_key();
    }

    pub fn rename_column(&mut self, index: usize, name: &str) -> ExportResult<()> {
        self.column_mut(index)?.name = name.trim().to_string();
        Ok(())
    }

    /// Names the synthetic key. Giving it the default name for the current
    /// table lets it follow table renames again.
    pub fn set_synthetic_key_name(&mut self, name: &str) {
        let name = name.trim();
        self.key_name_overridden = name != default_key_name(&self.name);
        self.columns[0].name = name.to_string();
    }

    pub fn set_data_type(&mut self, index: usize, data_type: MySqlDataType) -> ExportResult<()> {
        let auto_index = self.auto_index_int_columns;
        let column = self.column_mut(index)?;
        column.data_type = data_type;
        if auto_index && data_type == MySqlDataType::Integer {
            column.create_index = true;
        }
        Ok(())
    }

    /// Marks a column unique. Duplicate data is reported by validation.
    pub fn set_unique(&mut self, index: usize, unique: bool) -> ExportResult<()> {
        let column = self.column_mut(index)?;
        column.unique = unique;
        if unique {
            column.create_index = true;
        }
        Ok(())
    }

    pub fn set_create_index(&mut self, index: usize, create_index: bool) -> ExportResult<()> {
        let auto_allow_empty = self.auto_allow_empty_non_index_columns;
        let column = self.column_mut(index)?;
        column.create_index = create_index;
        if auto_allow_empty && !create_index {
            column.allow_null = true;
        }
        Ok(())
    }

    pub fn set_allow_null(&mut self, index: usize, allow_null: bool) -> ExportResult<()> {
        self.column_mut(index)?.allow_null = allow_null;
        Ok(())
    }

    pub fn set_exclude(&mut self, index: usize, exclude: bool) -> ExportResult<()> {
        let add_key = self.add_primary_key;
        let column = self.column_mut(index)?;
        if exclude && column.primary_key && !add_key {
            return Err(ExportError::Override(format!(
                "column '{}' is part of the primary key and cannot be excluded",
                column.name
            )));
        }
        column.exclude = exclude;
        Ok(())
    }

    /// Adds or removes one column from the key. No key column left means the
    /// synthetic key is used; one or more means existing columns form the key.
    pub fn set_primary_key(&mut self, index: usize, primary_key: bool) -> ExportResult<()> {
        let column = self.column_mut(index)?;
        column.primary_key = primary_key;
        if primary_key {
            column.exclude = false;
        }
        let key_count = self.data_columns().iter().filter(|c| c.primary_key).count();
        self.add_primary_key = key_count == 0;
        Ok(())
    }

    /// Uses exactly one existing column as the key
    pub fn use_existing_key(&mut self, name: &str) -> ExportResult<()> {
        self.use_existing_keys(&[name])
    }

    /// Uses the named existing columns as a (composite) key
    pub fn use_existing_keys<S: AsRef<str>>(&mut self, names: &[S]) -> ExportResult<()> {
        if names.is_empty() {
            return Err(ExportError::Override(
                "at least one key column is required".to_string(),
            ));
        }
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let index = self
                .data_columns()
                .iter()
                .position(|c| c.name == name && !c.exclude)
                .ok_or_else(|| {
                    ExportError::Override(format!("no exported column named '{}'", name))
                })?;
            indices.push(index);
        }

        for column in &mut self.columns[1..] {
            column.primary_key = false;
        }
        for index in indices {
            self.columns[index + 1].primary_key = true;
        }
        self.add_primary_key = false;
        Ok(())
    }

    /// Adds the synthetic auto-increment key and clears existing key flags
    pub fn use_synthetic_key(&mut self) {
        for column in &mut self.columns[1..] {
            column.primary_key = false;
        }
        self.add_primary_key = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn proposal(rows: Vec<Vec<CellValue>>) -> TableProposal {
        let grid = CellGrid::new("Orders", (0, 0), rows);
        TableProposal::from_grid(grid, &ExportSettings::default()).unwrap()
    }

    fn orders() -> TableProposal {
        proposal(vec![
            vec![text("Id"), text("Customer"), text("Amount")],
            vec![CellValue::Int(1), text("Ann"), CellValue::Float(10.5)],
            vec![CellValue::Int(2), text("Bob"), CellValue::Empty],
        ])
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_table_name("Sales Data 2024");
        assert_eq!(once, "sales_data_2024");
        assert_eq!(normalize_table_name(&once), once);
    }

    #[test]
    fn test_propose_table_name() {
        assert_eq!(propose_table_name("Sheet1"), "");
        assert_eq!(propose_table_name("sheets"), "");
        assert_eq!(propose_table_name("Q1 Orders"), "q1_orders");
    }

    #[test]
    fn test_defaults_from_headers() {
        let p = orders();
        assert_eq!(p.name(), "orders");
        assert_eq!(p.synthetic_key().name, "orders_id");
        let names: Vec<&str> = p.data_columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Customer", "Amount"]);
        assert_eq!(p.data_columns()[0].data_type, MySqlDataType::Integer);
        assert_eq!(p.data_columns()[1].data_type, MySqlDataType::Varchar(5));
        assert_eq!(
            p.data_columns()[2].data_type,
            MySqlDataType::Decimal { precision: 12, scale: 2 }
        );
        assert_eq!(p.row_count(), 2);
    }

    #[test]
    fn test_integer_first_column_is_default_key() {
        let p = orders();
        assert!(!p.add_primary_key());
        let keys: Vec<&str> = p.primary_key_columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(keys, vec!["Id"]);
    }

    #[test]
    fn test_non_integer_first_column_uses_synthetic_key() {
        let p = proposal(vec![
            vec![text("Code"), text("Qty")],
            vec![CellValue::Int(1), CellValue::Int(3)],
            vec![CellValue::Float(1.5), CellValue::Int(4)],
        ]);
        assert!(p.add_primary_key());
        assert_eq!(p.primary_key_columns()[0].name, "orders_id");
        assert!(p.data_columns().iter().all(|c| !c.primary_key));
    }

    #[test]
    fn test_auto_index_and_allow_null() {
        let p = orders();
        let id = &p.data_columns()[0];
        assert!(id.create_index);
        assert!(!id.allow_null);
        let amount = &p.data_columns()[2];
        assert!(!amount.create_index);
        assert!(amount.allow_null);
    }

    #[test]
    fn test_without_headers() {
        let mut p = orders();
        p.set_first_row_is_headers(false);
        assert_eq!(p.data_columns()[0].name, "Column1");
        assert_eq!(p.row_count(), 3);
        assert!(p.add_primary_key(), "header text makes the first column non-integer");
        assert_eq!(p.data_columns()[1].data_type, MySqlDataType::Varchar(12));
    }

    #[test]
    fn test_table_rename_moves_key_name() {
        let mut p = orders();
        p.set_table_name("  Web Orders ");
        assert_eq!(p.name(), "web_orders");
        assert_eq!(p.raw_name(), "Web Orders");
        assert_eq!(p.synthetic_key().name, "web_orders_id");
    }

    #[test]
    fn test_custom_key_name_survives_table_rename() {
        let mut p = orders();
        p.set_synthetic_key_name("order_no");
        p.set_table_name("web orders");
        assert_eq!(p.synthetic_key().name, "order_no");

        p.set_synthetic_key_name("web_orders_id");
        p.set_table_name("shop orders");
        assert_eq!(p.synthetic_key().name, "shop_orders_id");
    }

    #[test]
    fn test_first_column_with_gap_uses_synthetic_key() {
        let p = proposal(vec![
            vec![text("Id"), text("Name")],
            vec![CellValue::Int(1), text("a")],
            vec![CellValue::Empty, text("b")],
            vec![CellValue::Int(3), text("c")],
        ]);
        assert!(!p.first_column_contains_integers());
        assert!(p.add_primary_key());
        assert!(p.data_columns().iter().all(|c| !c.primary_key));
        assert!(p.is_exportable(), "{:?}", p.validate());
    }

    #[test]
    fn test_composite_key_and_back() {
        let mut p = orders();
        p.set_primary_key(1, true).unwrap();
        assert_eq!(p.primary_key_columns().len(), 2);
        p.set_primary_key(0, false).unwrap();
        p.set_primary_key(1, false).unwrap();
        assert!(p.add_primary_key());
        p.use_existing_key("Customer").unwrap();
        let keys: Vec<&str> = p.primary_key_columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(keys, vec!["Customer"]);
    }

    #[test]
    fn test_key_column_cannot_be_excluded() {
        let mut p = orders();
        assert!(matches!(p.set_exclude(0, true), Err(ExportError::Override(_))));
        p.set_exclude(1, true).unwrap();
        assert_eq!(p.primary_key_candidates(), vec!["Id", "Amount"]);
        assert!(p.use_existing_key("Customer").is_err());
        p.set_primary_key(1, true).unwrap();
        assert!(!p.column(1).unwrap().exclude);
    }

    #[test]
    fn test_use_synthetic_key_clears_flags() {
        let mut p = orders();
        p.use_synthetic_key();
        assert!(p.add_primary_key());
        assert!(p.data_columns().iter().all(|c| !c.primary_key));
        assert_eq!(p.exported_columns().count(), 4);
    }

    #[test]
    fn test_integer_type_turns_index_on() {
        let mut p = orders();
        p.set_create_index(2, false).unwrap();
        p.set_data_type(2, MySqlDataType::Integer).unwrap();
        assert!(p.column(2).unwrap().create_index);
        p.set_create_index(2, false).unwrap();
        assert!(p.column(2).unwrap().allow_null);
        p.set_unique(1, true).unwrap();
        assert!(p.column(1).unwrap().create_index);
    }

    #[test]
    fn test_bad_index() {
        let mut p = orders();
        assert!(matches!(
            p.rename_column(3, "x"),
            Err(ExportError::ColumnIndex { index: 3, count: 3 })
        ));
    }

    #[test]
    fn test_empty_range_rejected() {
        let grid = CellGrid::from_rows(vec![vec![CellValue::Empty, text(" ")]]);
        assert!(matches!(
            TableProposal::from_grid(grid, &ExportSettings::default()),
            Err(ExportError::EmptyRange(_))
        ));
    }

    #[test]
    fn test_detection_disabled() {
        let settings = ExportSettings {
            detect_data_types: false,
            ..ExportSettings::default()
        };
        let grid = CellGrid::new(
            "Sheet1",
            (0, 0),
            vec![vec![text("n")], vec![CellValue::Int(1)]],
        );
        let p = TableProposal::from_grid(grid, &settings).unwrap();
        assert_eq!(p.name(), "");
        assert_eq!(p.synthetic_key().name, "id");
        assert_eq!(p.data_columns()[0].data_type, MySqlDataType::Varchar(255));
    }
}
