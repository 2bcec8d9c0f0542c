//! CLI command handlers

pub mod commands;

pub use commands::{check, export, preview, propose, sheets, sql, types};

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Which cells to export, and the plan to apply to them
#[derive(Args, Debug, Clone)]
pub struct Selection {
    /// Workbook to read (.xlsx, .xlsm, .xlsb, .xls, .ods)
    pub file: PathBuf,

    /// Worksheet name (default: the plan's sheet, else the first sheet)
    #[arg(short, long)]
    pub sheet: Option<String>,

    /// Range such as A1:D20 (default: the plan's range, else the used range)
    #[arg(short, long)]
    pub range: Option<String>,

    /// Treat the first row as data instead of column names
    #[arg(long)]
    pub no_headers: bool,

    /// Export plan (YAML or JSON) with overrides
    #[arg(short, long)]
    pub plan: Option<PathBuf>,
}

/// MySQL server to export to
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    #[arg(long, default_value = "localhost", env = "SHEET_EXPORT_HOST")]
    pub host: String,

    #[arg(long, default_value_t = crate::db::DEFAULT_PORT, env = "SHEET_EXPORT_PORT")]
    pub port: u16,

    #[arg(short, long, default_value = "root", env = "SHEET_EXPORT_USER")]
    pub user: String,

    #[arg(long, env = "SHEET_EXPORT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Target schema (default: default_schema from the settings file)
    #[arg(long, env = "SHEET_EXPORT_SCHEMA")]
    pub schema: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanFormat {
    #[default]
    Yaml,
    Json,
}
