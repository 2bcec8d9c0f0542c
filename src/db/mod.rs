//! Database side of an export: where the table goes and how SQL is run

pub mod executor;
pub mod export;
pub mod mysql;

pub use executor::SqlExecutor;
pub use export::{outcome_after_close, ExportOptions, ExportReport, Exporter};
pub use mysql::MySqlExecutor;

use crate::sql::quote_identifier;
use std::fmt;

pub const DEFAULT_PORT: u16 = 3306;

/// How to reach a MySQL server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
}

impl ConnectionDescriptor {
    pub fn new(host: impl Into<String>, port: u16, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: None,
        }
    }

    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }
}

/// Never shows the password
impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.host, self.port)
    }
}

/// A schema (database) on a MySQL connection, the target of an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSchema {
    pub connection: ConnectionDescriptor,
    pub name: String,
}

impl DbSchema {
    pub fn new(connection: ConnectionDescriptor, name: impl Into<String>) -> Self {
        Self {
            connection,
            name: name.into(),
        }
    }

    /// `` `schema`.`table` ``
    pub fn qualify(&self, table: &str) -> String {
        format!("{}.{}", quote_identifier(&self.name), quote_identifier(table))
    }
}

impl fmt::Display for DbSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.connection, self.name)
    }
}
