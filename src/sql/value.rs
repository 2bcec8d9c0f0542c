//! Cell values converted for a target column type, as SQL literals or bind values

use crate::schema::MySqlDataType;
use crate::types::{format_number, CellValue};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// A value ready to be sent to MySQL
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl SqlValue {
    /// Converts a cell for a column of `data_type`.
    ///
    /// Empty cells become `NULL`. Values that do not fit the type are sent
    /// as their display text and left to the server.
    pub fn from_cell(cell: &CellValue, data_type: MySqlDataType) -> Self {
        if cell.is_empty() {
            return SqlValue::Null;
        }
        let converted = match data_type {
            MySqlDataType::Integer | MySqlDataType::BigInt => to_integer(cell),
            MySqlDataType::Decimal { .. } | MySqlDataType::Double => to_number(cell),
            MySqlDataType::Bool => to_bool(cell),
            MySqlDataType::Date => to_date(cell),
            MySqlDataType::Time => to_time(cell),
            MySqlDataType::Datetime => to_datetime(cell),
            MySqlDataType::Varchar(_) | MySqlDataType::Text => None,
        };
        converted.unwrap_or_else(|| SqlValue::Text(cell.to_string()))
    }

    /// Literal as written in an INSERT statement
    pub fn to_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Int(i) => i.to_string(),
            SqlValue::Float(f) if f.is_finite() => format_number(*f),
            SqlValue::Float(f) => quote_string(&f.to_string()),
            SqlValue::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            SqlValue::Text(s) => quote_string(s),
            SqlValue::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            SqlValue::Time(t) => format!("'{}'", t.format("%H:%M:%S")),
            SqlValue::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

fn to_integer(cell: &CellValue) -> Option<SqlValue> {
    match cell {
        CellValue::Bool(b) => Some(SqlValue::Int(i64::from(*b))),
        CellValue::Text(s) => s.trim().parse().ok().map(SqlValue::Int),
        _ => cell.as_integer().map(SqlValue::Int),
    }
}

fn to_number(cell: &CellValue) -> Option<SqlValue> {
    match cell {
        CellValue::Int(i) => Some(SqlValue::Int(*i)),
        CellValue::Float(f) => Some(SqlValue::Float(*f)),
        CellValue::Bool(b) => Some(SqlValue::Int(i64::from(*b))),
        CellValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(SqlValue::Float),
        _ => None,
    }
}

/// Accepts booleans, 0/1 and the words true/false and yes/no
fn to_bool(cell: &CellValue) -> Option<SqlValue> {
    match cell {
        CellValue::Bool(b) => Some(SqlValue::Bool(*b)),
        CellValue::Int(_) | CellValue::Float(_) => match cell.as_integer() {
            Some(0) => Some(SqlValue::Bool(false)),
            Some(1) => Some(SqlValue::Bool(true)),
            _ => None,
        },
        CellValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(SqlValue::Bool(true)),
            "false" | "no" | "0" => Some(SqlValue::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn to_date(cell: &CellValue) -> Option<SqlValue> {
    match cell {
        CellValue::Date(d) => Some(SqlValue::Date(*d)),
        CellValue::DateTime(dt) => Some(SqlValue::Date(dt.date())),
        CellValue::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .ok()
            .map(SqlValue::Date),
        _ => None,
    }
}

fn to_time(cell: &CellValue) -> Option<SqlValue> {
    match cell {
        CellValue::Time(t) => Some(SqlValue::Time(*t)),
        CellValue::DateTime(dt) => Some(SqlValue::Time(dt.time())),
        CellValue::Text(s) => NaiveTime::parse_from_str(s.trim(), "%H:%M:%S")
            .ok()
            .map(SqlValue::Time),
        _ => None,
    }
}

fn to_datetime(cell: &CellValue) -> Option<SqlValue> {
    match cell {
        CellValue::DateTime(dt) => Some(SqlValue::DateTime(*dt)),
        CellValue::Date(d) => d.and_hms_opt(0, 0, 0).map(SqlValue::DateTime),
        CellValue::Text(s) => NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(SqlValue::DateTime),
        _ => None,
    }
}

/// Single-quoted MySQL string literal with backslash escapes
pub fn quote_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '"' => quoted.push_str("\\\""),
            '\0' => quoted.push_str("\\0"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\x1a' => quoted.push_str("\\Z"),
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

/// Back-quoted identifier; embedded back-quotes are doubled
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
