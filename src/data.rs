use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::DataType;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S%.f";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A typed row. `None` cells are nulls.
pub type Row = Vec<Option<Value>>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Guid(Uuid),
    Array(Vec<Option<Value>>),
    Row(Vec<Option<Value>>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Timestamp(_) => "timestamp",
            Value::Guid(_) => "guid",
            Value::Array(_) => "array",
            Value::Row(_) => "row",
        }
    }

    /// Canonical text form. Composite values render their elements in brackets
    /// and are only meant for diagnostics; cells are built by the write converter.
    pub fn as_display(&self) -> String {
        match self {
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::String(s) => s.clone(),
            Value::Date(d) => d.format(DATE_FORMAT).to_string(),
            Value::Time(t) => t.format(TIME_FORMAT).to_string(),
            Value::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
            Value::Guid(g) => g.to_string(),
            Value::Array(items) | Value::Row(items) => format!(
                "[{}]",
                items
                    .iter()
                    .map(|item| item.as_ref().map_or("null".to_string(), Value::as_display))
                    .join(", ")
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate, String> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err("not a recognised date".to_string())
}

pub fn parse_naive_time(value: &str) -> Result<NaiveTime, String> {
    const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];
    for fmt in TIME_FORMATS {
        if let Ok(parsed) = NaiveTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err("not a recognised time".to_string())
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime, String> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err("not a recognised timestamp".to_string())
}

pub fn parse_boolean(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Ok(true),
        "false" | "f" | "no" | "n" | "0" => Ok(false),
        _ => Err("not a boolean".to_string()),
    }
}

/// Parses a non-null scalar token. Strings are taken verbatim; every other
/// type is trimmed first. Composite types are rejected here and handled by the
/// read converter, which splits the cell before calling back in.
pub fn parse_scalar(value: &str, ty: &DataType) -> Result<Value, String> {
    let trimmed = value.trim();
    let parsed = match ty {
        DataType::String => Value::String(value.to_string()),
        DataType::Boolean => Value::Boolean(parse_boolean(trimmed)?),
        DataType::Integer => Value::Integer(trimmed.parse().map_err(|e| format!("{e}"))?),
        DataType::Float => Value::Float(trimmed.parse().map_err(|e| format!("{e}"))?),
        DataType::Decimal => Value::Decimal(trimmed.parse().map_err(|e| format!("{e}"))?),
        DataType::Date => Value::Date(parse_naive_date(trimmed)?),
        DataType::Time => Value::Time(parse_naive_time(trimmed)?),
        DataType::Timestamp => Value::Timestamp(parse_naive_datetime(trimmed)?),
        DataType::Guid => {
            let unbraced = trimmed.trim_matches(|c| matches!(c, '{' | '}'));
            Value::Guid(Uuid::parse_str(unbraced).map_err(|e| format!("{e}"))?)
        }
        DataType::Array(_) | DataType::Row(_) => {
            return Err(format!("{} is not a scalar type", ty.describe()));
        }
    };
    Ok(parsed)
}

/// Returns true when `value` is an instance of `ty`. Composite values are
/// checked element by element; array elements may be null, nested row fields
/// follow their declared nullability.
pub fn value_matches(value: &Value, ty: &DataType) -> bool {
    match (value, ty) {
        (Value::Boolean(_), DataType::Boolean)
        | (Value::Integer(_), DataType::Integer)
        | (Value::Float(_), DataType::Float)
        | (Value::Decimal(_), DataType::Decimal)
        | (Value::String(_), DataType::String)
        | (Value::Date(_), DataType::Date)
        | (Value::Time(_), DataType::Time)
        | (Value::Timestamp(_), DataType::Timestamp)
        | (Value::Guid(_), DataType::Guid) => true,
        (Value::Array(items), DataType::Array(element)) => items
            .iter()
            .flatten()
            .all(|item| value_matches(item, element)),
        (Value::Row(items), DataType::Row(row)) => {
            items.len() == row.len()
                && items.iter().zip(row.fields()).all(|(item, field)| match item {
                    Some(v) => value_matches(v, &field.data_type),
                    None => field.nullable,
                })
        }
        _ => false,
    }
}
