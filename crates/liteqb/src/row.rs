//! Result rows and row mapping.

use crate::error::{QbError, QbResult};
use crate::value::{FromValue, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::rc::Rc;

/// One result row: column name → value, in the column order returned by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Rc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(columns: Rc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column names in engine order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Value of the named column. With duplicate names the last one wins.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .rposition(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Value at a column position.
    pub fn get_index(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Typed access to a named column.
    pub fn try_get<T: FromValue>(&self, column: &str) -> QbResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| QbError::ColumnNotFound(column.to_string()))?;
        T::from_value(value).ok_or_else(|| {
            QbError::validation(format!(
                "column '{column}' holds {value}, which does not convert to {}",
                std::any::type_name::<T>()
            ))
        })
    }

    /// `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }

    /// The values alone, in column order.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Map a [`Row`] into a caller type.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> QbResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> QbResult<Self> {
        Ok(row.clone())
    }
}
