use crate::error::ExportResult;
use crate::sql::SqlValue;
use async_trait::async_trait;

/// Runs SQL against a database. Statements run in call order on one connection.
#[async_trait]
pub trait SqlExecutor: Send {
    /// Whether `schema` already holds a table named `table`
    async fn table_exists(&mut self, schema: &str, table: &str) -> ExportResult<bool>;

    /// Runs a statement without parameters, returning the affected row count
    async fn execute(&mut self, sql: &str) -> ExportResult<u64>;

    /// Runs a statement with `?` placeholders bound to `params` in order
    async fn execute_with_params(&mut self, sql: &str, params: &[SqlValue]) -> ExportResult<u64>;
}
