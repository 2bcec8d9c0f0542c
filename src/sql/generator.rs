//! CREATE TABLE and INSERT statements for a table proposal

use crate::schema::{ColumnProposal, TableProposal};
use crate::sql::value::{quote_identifier, SqlValue};

/// Rows per INSERT statement when nothing else is configured
pub const DEFAULT_ROWS_PER_INSERT: usize = 100;

/// Most `?` placeholders MySQL accepts in one prepared statement
pub const MAX_PLACEHOLDERS: usize = 65_535;

/// One parameterized INSERT statement with its bind values, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct InsertBatch {
    pub sql: String,
    pub params: Vec<SqlValue>,
    pub rows: usize,
}

/// Builds the SQL for one proposal
pub struct SqlGenerator<'a> {
    proposal: &'a TableProposal,
    schema: Option<&'a str>,
    rows_per_insert: usize,
}

impl<'a> SqlGenerator<'a> {
    pub fn new(proposal: &'a TableProposal) -> Self {
        Self {
            proposal,
            schema: None,
            rows_per_insert: DEFAULT_ROWS_PER_INSERT,
        }
    }

    /// Qualify the table name with a schema
    pub fn with_schema(mut self, schema: Option<&'a str>) -> Self {
        self.schema = schema.filter(|s| !s.is_empty());
        self
    }

    pub fn with_rows_per_insert(mut self, rows: usize) -> Self {
        self.rows_per_insert = rows.max(1);
        self
    }

    pub fn table_reference(&self) -> String {
        let table = quote_identifier(self.proposal.name());
        match self.schema {
            Some(schema) => format!("{}.{}", quote_identifier(schema), table),
            None => table,
        }
    }

    pub fn create_table(&self) -> String {
        let columns: Vec<&ColumnProposal> = self.proposal.exported_columns().collect();
        let mut lines: Vec<String> = columns.iter().map(|c| column_definition(c)).collect();

        let keys: Vec<&ColumnProposal> = self.proposal.primary_key_columns();
        if !keys.is_empty() {
            let names: Vec<String> = keys.iter().map(|c| quote_identifier(&c.name)).collect();
            lines.push(format!("PRIMARY KEY ({})", names.join(", ")));
        }

        let sole_key = (keys.len() == 1).then(|| keys[0].name.as_str());
        for column in &columns {
            if column.is_synthetic() {
                continue;
            }
            if column.unique {
                lines.push(format!(
                    "UNIQUE INDEX {} ({} ASC)",
                    quote_identifier(&format!("{}_UNIQUE", column.name)),
                    quote_identifier(&column.name)
                ));
            } else if column.create_index && sole_key != Some(column.name.as_str()) {
                lines.push(format!(
                    "INDEX {} ({} ASC)",
                    quote_identifier(&format!("{}_IDX", column.name)),
                    quote_identifier(&column.name)
                ));
            }
        }

        format!(
            "CREATE TABLE {}\n(\n  {}\n)",
            self.table_reference(),
            lines.join(",\n  ")
        )
    }

    /// Data columns sent in INSERT statements (the synthetic key is generated by the server)
    fn insert_columns(&self) -> Vec<&'a ColumnProposal> {
        self.proposal
            .exported_columns()
            .filter(|c| !c.is_synthetic())
            .collect()
    }

    fn insert_prefix(&self, columns: &[&ColumnProposal]) -> String {
        let names: Vec<String> = columns.iter().map(|c| quote_identifier(&c.name)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ",
            self.table_reference(),
            names.join(", ")
        )
    }

    /// Converted values, one vector per data row
    pub fn row_values(&self) -> Vec<Vec<SqlValue>> {
        let columns = self.insert_columns();
        self.proposal
            .data_rows()
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| {
                        let cell = column.source.and_then(|i| row.get(i));
                        cell.map(|cell| SqlValue::from_cell(cell, column.data_type))
                            .unwrap_or(SqlValue::Null)
                    })
                    .collect()
            })
            .collect()
    }

    /// INSERT statements with literal values, `rows_per_insert` rows each
    pub fn insert_statements(&self) -> Vec<String> {
        let columns = self.insert_columns();
        if columns.is_empty() {
            return Vec::new();
        }
        let prefix = self.insert_prefix(&columns);
        self.row_values()
            .chunks(self.rows_per_insert)
            .map(|chunk| {
                let tuples: Vec<String> = chunk
                    .iter()
                    .map(|row| {
                        let literals: Vec<String> = row.iter().map(SqlValue::to_literal).collect();
                        format!("({})", literals.join(", "))
                    })
                    .collect();
                format!("{}{}", prefix, tuples.join(",\n"))
            })
            .collect()
    }

    /// INSERT statements with `?` placeholders, for execution. Batches are
    /// shrunk below `rows_per_insert` when they would exceed [`MAX_PLACEHOLDERS`].
    pub fn insert_batches(&self) -> Vec<InsertBatch> {
        let columns = self.insert_columns();
        if columns.is_empty() {
            return Vec::new();
        }
        let prefix = self.insert_prefix(&columns);
        let tuple = format!("({})", vec!["?"; columns.len()].join(", "));
        let rows_per_batch = self
            .rows_per_insert
            .min((MAX_PLACEHOLDERS / columns.len()).max(1));
        self.row_values()
            .chunks(rows_per_batch)
            .map(|chunk| InsertBatch {
                sql: format!("{}{}", prefix, vec![tuple.as_str(); chunk.len()].join(", ")),
                params: chunk.iter().flatten().cloned().collect(),
                rows: chunk.len(),
            })
            .collect()
    }

    /// The CREATE statement followed by every INSERT, each terminated by `;`
    pub fn copy_sql(&self) -> String {
        let mut statements = vec![self.create_table()];
        statements.extend(self.insert_statements());
        statements
            .iter()
            .map(|s| format!("{};", s))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `` `name` TYPE NOT NULL AUTO_INCREMENT ``
pub fn column_definition(column: &ColumnProposal) -> String {
    let mut definition = format!(
        "{} {}",
        quote_identifier(&column.name),
        column.data_type.sql_type()
    );
    let nullable = column.allow_null && !column.primary_key;
    definition.push_str(if nullable { " NULL" } else { " NOT NULL" });
    if column.auto_increment {
        definition.push_str(" AUTO_INCREMENT");
    }
    definition
}
