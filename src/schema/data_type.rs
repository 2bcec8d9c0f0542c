//! MySQL column data types and type inference from cell values

use crate::error::{ExportError, ExportResult};
use crate::types::CellValue;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Varchar lengths offered for string columns, smallest first
pub const VARCHAR_LENGTHS: [u32; 7] = [5, 12, 25, 45, 255, 4000, 65535];

/// Column data types a proposal can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MySqlDataType {
    Integer,
    BigInt,
    Decimal { precision: u8, scale: u8 },
    Double,
    Bool,
    Date,
    Time,
    Datetime,
    Varchar(u32),
    Text,
}

/// Types offered to users when overriding a column, with their descriptions
pub const CATALOG: &[(MySqlDataType, &str)] = &[
    (MySqlDataType::Integer, "Integer - Default for whole-number columns"),
    (MySqlDataType::Varchar(5), "Varchar(5) - Small string up to 5 characters"),
    (MySqlDataType::Varchar(12), "Varchar(12) - Small string up to 12 characters"),
    (MySqlDataType::Varchar(25), "Varchar(25) - Small string up to 25 characters"),
    (MySqlDataType::Varchar(45), "Varchar(45) - Standard string up to 45 characters"),
    (MySqlDataType::Varchar(255), "Varchar(255) - Standard string up to 255 characters"),
    (MySqlDataType::Varchar(4000), "Varchar(4000) - Large string up to 4k characters"),
    (MySqlDataType::Varchar(65535), "Varchar(65535) - Maximum string up to 65k characters"),
    (MySqlDataType::Datetime, "Datetime - For columns that store both, date and time"),
    (MySqlDataType::Date, "Date - For columns that only store a date"),
    (MySqlDataType::Time, "Time - For columns that only store a time"),
    (MySqlDataType::Bool, "Bool - Holds values like (0, 1), (True, False) or (Yes, No)"),
    (
        MySqlDataType::BigInt,
        "BigInt - For columns containing large whole-number integers with up to 19 digits",
    ),
    (
        MySqlDataType::Decimal { precision: 12, scale: 2 },
        "Decimal(12, 2) - Exact decimal numbers with 12 digits with 2 of them after decimal point",
    ),
    (
        MySqlDataType::Decimal { precision: 65, scale: 30 },
        "Decimal(65, 30) - Biggest exact decimal numbers with 65 digits with 30 of them after decimal point",
    ),
    (
        MySqlDataType::Double,
        "Double - Biggest float pointing number with approximately 15 decimal places",
    ),
];

impl MySqlDataType {
    /// Fallback type for empty or undetected columns
    pub const DEFAULT_STRING: MySqlDataType = MySqlDataType::Varchar(255);

    /// Type name as written in DDL
    pub fn sql_type(&self) -> String {
        match self {
            MySqlDataType::Integer => "INTEGER".to_string(),
            MySqlDataType::BigInt => "BIGINT".to_string(),
            MySqlDataType::Decimal { precision, scale } => {
                format!("DECIMAL({}, {})", precision, scale)
            }
            MySqlDataType::Double => "DOUBLE".to_string(),
            MySqlDataType::Bool => "BOOL".to_string(),
            MySqlDataType::Date => "DATE".to_string(),
            MySqlDataType::Time => "TIME".to_string(),
            MySqlDataType::Datetime => "DATETIME".to_string(),
            MySqlDataType::Varchar(len) => format!("VARCHAR({})", len),
            MySqlDataType::Text => "TEXT".to_string(),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, MySqlDataType::Integer | MySqlDataType::BigInt)
    }

    /// Smallest offered varchar able to hold `len` characters, `Text` beyond
    pub fn varchar_for_length(len: usize) -> Self {
        VARCHAR_LENGTHS
            .iter()
            .find(|&&max| len <= max as usize)
            .map(|&max| MySqlDataType::Varchar(max))
            .unwrap_or(MySqlDataType::Text)
    }

    /// Detects the most specific type holding every value of a column.
    ///
    /// Empty cells are ignored; a column without data falls back to
    /// `Varchar(255)`.
    pub fn infer<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a CellValue>,
    {
        let values: Vec<&CellValue> = values.into_iter().filter(|v| !v.is_empty()).collect();
        if values.is_empty() {
            return Self::DEFAULT_STRING;
        }

        if values.iter().all(|v| matches!(v, CellValue::Bool(_))) {
            return MySqlDataType::Bool;
        }

        if values.iter().all(|v| v.is_integer()) {
            let fits_int = values.iter().all(|v| {
                v.as_integer()
                    .is_some_and(|i| i >= i32::MIN as i64 && i <= i32::MAX as i64)
            });
            return if fits_int {
                MySqlDataType::Integer
            } else {
                MySqlDataType::BigInt
            };
        }

        if values.iter().all(|v| v.is_number()) {
            let fits_decimal = values
                .iter()
                .filter_map(|v| v.as_f64())
                .all(fits_decimal_12_2);
            return if fits_decimal {
                MySqlDataType::Decimal { precision: 12, scale: 2 }
            } else {
                MySqlDataType::Double
            };
        }

        if values.iter().all(|v| v.is_temporal()) {
            if values.iter().all(|v| matches!(v, CellValue::Date(_))) {
                return MySqlDataType::Date;
            }
            if values.iter().all(|v| matches!(v, CellValue::Time(_))) {
                return MySqlDataType::Time;
            }
            return MySqlDataType::Datetime;
        }

        let longest = values
            .iter()
            .map(|v| v.to_string().chars().count())
            .max()
            .unwrap_or(0);
        Self::varchar_for_length(longest)
    }
}

/// At most 10 integral digits and 2 fractional digits
fn fits_decimal_12_2(value: f64) -> bool {
    if !value.is_finite() || value.abs() >= 1e10 {
        return false;
    }
    let cents = value * 100.0;
    (cents - cents.round()).abs() < 1e-6
}

impl fmt::Display for MySqlDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MySqlDataType::Integer => write!(f, "Integer"),
            MySqlDataType::BigInt => write!(f, "BigInt"),
            MySqlDataType::Decimal { precision, scale } => {
                write!(f, "Decimal({}, {})", precision, scale)
            }
            MySqlDataType::Double => write!(f, "Double"),
            MySqlDataType::Bool => write!(f, "Bool"),
            MySqlDataType::Date => write!(f, "Date"),
            MySqlDataType::Time => write!(f, "Time"),
            MySqlDataType::Datetime => write!(f, "Datetime"),
            MySqlDataType::Varchar(len) => write!(f, "Varchar({})", len),
            MySqlDataType::Text => write!(f, "Text"),
        }
    }
}

impl FromStr for MySqlDataType {
    type Err = ExportError;

    /// Parses a type name such as `Varchar(45)`, `decimal(12,2)` or `INT`.
    fn from_str(value: &str) -> ExportResult<Self> {
        let invalid = || ExportError::DataType(value.to_string());
        let type_pattern =
            Regex::new(r"^\s*([A-Za-z]+)\s*(?:\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\))?\s*$")
                .map_err(|e| ExportError::DataType(format!("Regex error: {}", e)))?;
        let captures = type_pattern.captures(value).ok_or_else(invalid)?;
        let name = captures[1].to_ascii_uppercase();
        let first = captures
            .get(2)
            .map(|m| m.as_str().parse::<u32>())
            .transpose()
            .map_err(|_| invalid())?;
        let second = captures
            .get(3)
            .map(|m| m.as_str().parse::<u32>())
            .transpose()
            .map_err(|_| invalid())?;

        let no_args = first.is_none() && second.is_none();
        match name.as_str() {
            "INT" | "INTEGER" if no_args => Ok(MySqlDataType::Integer),
            "BIGINT" if no_args => Ok(MySqlDataType::BigInt),
            "DOUBLE" | "FLOAT" | "REAL" if no_args => Ok(MySqlDataType::Double),
            "BOOL" | "BOOLEAN" if no_args => Ok(MySqlDataType::Bool),
            "DATE" if no_args => Ok(MySqlDataType::Date),
            "TIME" if no_args => Ok(MySqlDataType::Time),
            "DATETIME" | "TIMESTAMP" if no_args => Ok(MySqlDataType::Datetime),
            "TEXT" if no_args => Ok(MySqlDataType::Text),
            "VARCHAR" => match (first, second) {
                (Some(len), None) if (1..=65535).contains(&len) => Ok(MySqlDataType::Varchar(len)),
                _ => Err(invalid()),
            },
            "DECIMAL" | "NUMERIC" => {
                let precision = first.unwrap_or(12);
                let scale = second.unwrap_or(if first.is_some() { 0 } else { 2 });
                if (1..=65).contains(&precision) && scale <= 30 && scale <= precision {
                    Ok(MySqlDataType::Decimal {
                        precision: precision as u8,
                        scale: scale as u8,
                    })
                } else {
                    Err(invalid())
                }
            }
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for MySqlDataType {
    type Error = ExportError;

    fn try_from(value: String) -> ExportResult<Self> {
        value.parse()
    }
}

impl From<MySqlDataType> for String {
    fn from(value: MySqlDataType) -> Self {
        value.to_string()
    }
}
