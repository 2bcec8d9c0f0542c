//! [`SqlExecutor`] backed by a sqlx MySQL connection

use crate::db::executor::SqlExecutor;
use crate::db::ConnectionDescriptor;
use crate::error::{ExportError, ExportResult};
use crate::sql::SqlValue;
use async_trait::async_trait;
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnectOptions, MySqlConnection};
use sqlx::query::Query;
use sqlx::Connection;
use tracing::{debug, info};

pub struct MySqlExecutor {
    conn: MySqlConnection,
}

impl MySqlExecutor {
    /// Connects and makes `schema` the default database when given
    pub async fn connect(
        descriptor: &ConnectionDescriptor,
        schema: Option<&str>,
    ) -> ExportResult<Self> {
        let mut options = MySqlConnectOptions::new()
            .host(&descriptor.host)
            .port(descriptor.port)
            .username(&descriptor.user);
        if let Some(password) = &descriptor.password {
            options = options.password(password);
        }
        if let Some(schema) = schema {
            options = options.database(schema);
        }

        let conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(|e| database_error("connect", e))?;
        info!(server = %descriptor, "connected to MySQL");
        Ok(Self { conn })
    }

    pub async fn close(self) -> ExportResult<()> {
        self.conn
            .close()
            .await
            .map_err(|e| database_error("disconnect", e))
    }
}

fn database_error(stage: &str, e: sqlx::Error) -> ExportError {
    ExportError::Database {
        stage: stage.to_string(),
        message: e.to_string(),
    }
}

fn bind_param<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &'q SqlValue,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        SqlValue::Null => query.bind(Option::<String>::None),
        SqlValue::Int(i) => query.bind(*i),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Text(s) => query.bind(s.as_str()),
        SqlValue::Date(d) => query.bind(*d),
        SqlValue::Time(t) => query.bind(*t),
        SqlValue::DateTime(dt) => query.bind(*dt),
    }
}

#[async_trait]
impl SqlExecutor for MySqlExecutor {
    async fn table_exists(&mut self, schema: &str, table: &str) -> ExportResult<bool> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema = ? AND table_name = ?",
        )
        .bind(schema)
        .bind(table)
        .fetch_one(&mut self.conn)
        .await
        .map_err(|e| database_error("table lookup", e))?;
        Ok(count > 0)
    }

    async fn execute(&mut self, sql: &str) -> ExportResult<u64> {
        debug!(sql, "executing statement");
        let result = sqlx::query(sql)
            .execute(&mut self.conn)
            .await
            .map_err(|e| database_error("statement", e))?;
        Ok(result.rows_affected())
    }

    async fn execute_with_params(&mut self, sql: &str, params: &[SqlValue]) -> ExportResult<u64> {
        debug!(params = params.len(), "executing parameterized statement");
        let mut query = sqlx::query(sql);
        for value in params {
            query = bind_param(query, value);
        }
        let result = query
            .execute(&mut self.conn)
            .await
            .map_err(|e| database_error("statement", e))?;
        Ok(result.rows_affected())
    }
}
