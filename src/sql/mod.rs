//! SQL text for a table proposal: `CREATE TABLE`, batched `INSERT` and the
//! parameterized form used for execution.

pub mod generator;
pub mod value;

pub use generator::{
    column_definition, InsertBatch, SqlGenerator, DEFAULT_ROWS_PER_INSERT, MAX_PLACEHOLDERS,
};
pub use value::{quote_identifier, quote_string, SqlValue};
