//! The export itself: validate, create the table, insert the rows.
//!
//! There is no transaction around the export. A failed `CREATE TABLE` stops
//! before any data is sent; a failed insert leaves the table and every row
//! inserted so far in place.

use crate::db::executor::SqlExecutor;
use crate::db::DbSchema;
use crate::error::{ExportError, ExportResult};
use crate::excel::naming::table_name_copy;
use crate::schema::{TableProposal, ValidationIssue};
use crate::sql::{SqlGenerator, DEFAULT_ROWS_PER_INSERT};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub rows_per_insert: usize,
    /// Pick `name_2`, `name_3`, ... instead of failing when the table exists
    pub rename_if_exists: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            rows_per_insert: DEFAULT_ROWS_PER_INSERT,
            rename_if_exists: false,
        }
    }
}

/// Outcome of a successful export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub table: String,
    pub rows_inserted: usize,
    pub insert_statements: usize,
    /// Non-blocking issues the proposal carried
    pub warnings: Vec<ValidationIssue>,
}

pub struct Exporter<'a, E: SqlExecutor> {
    executor: &'a mut E,
    schema: &'a DbSchema,
    options: ExportOptions,
}

impl<'a, E: SqlExecutor> Exporter<'a, E> {
    pub fn new(executor: &'a mut E, schema: &'a DbSchema, options: ExportOptions) -> Self {
        Self {
            executor,
            schema,
            options,
        }
    }

    pub async fn export(&mut self, proposal: &mut TableProposal) -> ExportResult<ExportReport> {
        let (blocking, warnings): (Vec<_>, Vec<_>) =
            proposal.validate().into_iter().partition(|issue| issue.blocking);
        if !blocking.is_empty() {
            return Err(ExportError::Validation(blocking));
        }

        self.resolve_table_name(proposal).await?;

        let generator = SqlGenerator::new(proposal)
            .with_schema(Some(self.schema.name.as_str()))
            .with_rows_per_insert(self.options.rows_per_insert);

        self.executor
            .execute(&generator.create_table())
            .await
            .map_err(|e| at_stage("CREATE TABLE", e))?;
        info!(table = %self.schema.qualify(proposal.name()), "created table");

        let batches = generator.insert_batches();
        let total = proposal.row_count();
        let mut inserted = 0;
        for batch in &batches {
            self.executor
                .execute_with_params(&batch.sql, &batch.params)
                .await
                .map_err(|e| {
                    warn!(inserted, total, "insert failed, table left in place");
                    at_stage(&format!("INSERT ({} of {} rows inserted)", inserted, total), e)
                })?;
            inserted += batch.rows;
        }
        info!(rows = inserted, statements = batches.len(), "inserted rows");

        Ok(ExportReport {
            table: proposal.name().to_string(),
            rows_inserted: inserted,
            insert_statements: batches.len(),
            warnings,
        })
    }

    async fn resolve_table_name(&mut self, proposal: &mut TableProposal) -> ExportResult<()> {
        let base = proposal.name().to_string();
        if !self.executor.table_exists(&self.schema.name, &base).await? {
            return Ok(());
        }
        if !self.options.rename_if_exists {
            return Err(ExportError::TableExists(base));
        }

        let mut copy_index = 2;
        let mut candidate = table_name_copy(&base, copy_index);
        while self.executor.table_exists(&self.schema.name, &candidate).await? {
            copy_index += 1;
            candidate = table_name_copy(&base, copy_index);
        }

        proposal.set_table_name(&candidate);
        info!(from = %base, to = %candidate, "table exists, using a new name");
        Ok(())
    }
}

/// The export's outcome once its connection has been closed. A failed close
/// is only logged: the rows are committed either way, and an export error
/// must not be masked by it.
pub fn outcome_after_close<T>(result: ExportResult<T>, closed: ExportResult<()>) -> ExportResult<T> {
    if let Err(e) = closed {
        warn!(error = %e, "failed to close the connection");
    }
    result
}

fn at_stage(stage: &str, e: ExportError) -> ExportError {
    match e {
        ExportError::Database { message, .. } => ExportError::Database {
            stage: stage.to_string(),
            message,
        },
        other => ExportError::Database {
            stage: stage.to_string(),
            message: other.to_string(),
        },
    }
}
