//! Bind values and SQLite storage types.

use crate::error::{QbError, QbResult};
use rusqlite::types::{Value as SqliteValue, ValueRef};
use serde::{Serialize, Serializer};
use std::fmt;

/// The engine-level type a parameter is bound with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    Null,
    Integer,
    Real,
    Text,
    Blob,
}

impl StorageType {
    /// Parse an explicit type name (`INT`, `INTEGER`, `FLOAT`, `REAL`, `TEXT`,
    /// `RAW`, `BLOB`, `NULL`), case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "INT" | "INTEGER" => Some(Self::Integer),
            "FLOAT" | "REAL" => Some(Self::Real),
            "TEXT" => Some(Self::Text),
            "RAW" | "BLOB" => Some(Self::Blob),
            "NULL" => Some(Self::Null),
            _ => None,
        }
    }

    /// Parse an explicit type name, failing with [`QbError::InvalidTypeName`].
    pub fn parse(name: &str) -> QbResult<Self> {
        Self::from_name(name).ok_or_else(|| QbError::InvalidTypeName(name.trim().to_ascii_uppercase()))
    }

    /// Map a schema-declared column type.
    ///
    /// Empty declarations yield `None`; declarations outside the known names
    /// (`VARCHAR(20)`, `DATETIME`, ...) are bound as text.
    pub fn from_declared(declared: &str) -> Option<Self> {
        if declared.trim().is_empty() {
            return None;
        }
        Some(Self::from_name(declared).unwrap_or(Self::Text))
    }

    /// Storage type implied by the runtime variant of `value`.
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Integer(_) => Self::Integer,
            Value::Real(_) => Self::Real,
            Value::Text(_) => Self::Text,
            Value::Blob(_) => Self::Blob,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
            Self::Blob => "BLOB",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value bound to a placeholder or read back from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Real(r) => Some(*r as i64),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            Value::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Convert to the engine value bound for `ty`.
    ///
    /// NULL always binds as NULL. Text that does not parse as the requested
    /// numeric type is passed through unchanged so column affinity applies.
    pub fn to_sqlite(&self, ty: StorageType) -> SqliteValue {
        match (ty, self) {
            (_, Value::Null) | (StorageType::Null, _) => SqliteValue::Null,

            (StorageType::Integer, Value::Integer(i)) => SqliteValue::Integer(*i),
            (StorageType::Integer, Value::Real(r)) => SqliteValue::Integer(*r as i64),
            (StorageType::Integer, Value::Text(s)) => match s.trim().parse::<i64>() {
                Ok(i) => SqliteValue::Integer(i),
                Err(_) => SqliteValue::Text(s.clone()),
            },
            (StorageType::Integer, Value::Blob(b)) => SqliteValue::Blob(b.clone()),

            (StorageType::Real, Value::Integer(i)) => SqliteValue::Real(*i as f64),
            (StorageType::Real, Value::Real(r)) => SqliteValue::Real(*r),
            (StorageType::Real, Value::Text(s)) => match s.trim().parse::<f64>() {
                Ok(r) => SqliteValue::Real(r),
                Err(_) => SqliteValue::Text(s.clone()),
            },
            (StorageType::Real, Value::Blob(b)) => SqliteValue::Blob(b.clone()),

            (StorageType::Text, Value::Integer(i)) => SqliteValue::Text(i.to_string()),
            (StorageType::Text, Value::Real(r)) => SqliteValue::Text(r.to_string()),
            (StorageType::Text, Value::Text(s)) => SqliteValue::Text(s.clone()),
            (StorageType::Text, Value::Blob(b)) => {
                SqliteValue::Text(String::from_utf8_lossy(b).into_owned())
            }

            (StorageType::Blob, Value::Integer(i)) => SqliteValue::Blob(i.to_string().into_bytes()),
            (StorageType::Blob, Value::Real(r)) => SqliteValue::Blob(r.to_string().into_bytes()),
            (StorageType::Blob, Value::Text(s)) => SqliteValue::Blob(s.clone().into_bytes()),
            (StorageType::Blob, Value::Blob(b)) => SqliteValue::Blob(b.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => write!(f, "'{s}'"),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(r) => serializer.serialize_f64(*r),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Blob(b) => serializer.serialize_bytes(b),
        }
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Integer(i64::from(v))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Real(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Blob(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<chrono::NaiveDateTime> for Value {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Value::Text(v.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

impl From<chrono::NaiveDate> for Value {
    fn from(v: chrono::NaiveDate) -> Self {
        Value::Text(v.format("%Y-%m-%d").to_string())
    }
}

impl<Tz: chrono::TimeZone> From<chrono::DateTime<Tz>> for Value {
    fn from(v: chrono::DateTime<Tz>) -> Self {
        Value::Text(v.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

/// Conversion out of a [`Value`] read from a result row.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64().and_then(|i| i32::try_from(i).ok())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64().map(|i| i != 0)
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null | Value::Blob(_) => None,
            Value::Text(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(r) => Some(r.to_string()),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bytes().map(<[u8]>::to_vec)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}
