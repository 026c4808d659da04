//! Named placeholder generation and the bound parameter list.

use crate::value::Value;
use std::collections::{HashMap, HashSet};

/// One recorded binding: placeholder, value, and the column it was declared for.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    pub placeholder: String,
    pub value: Value,
    pub column: String,
}

/// Generates collision-free placeholder names and records the values bound to them.
///
/// Placeholders look like `:<column><n>`, where `<column>` keeps only the
/// identifier characters of the column expression (so `a.id` becomes `aid`)
/// and `<n>` counts from 0 per sanitized name. Entries are append-only.
#[derive(Debug, Clone, Default)]
pub struct ParameterBinder {
    counters: HashMap<String, usize>,
    issued: HashSet<String>,
    params: Vec<BoundParam>,
}

impl ParameterBinder {
    /// An empty binder with every counter at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next placeholder name for `column`.
    pub fn next_placeholder(&mut self, column: &str) -> String {
        let base = sanitize(column);
        let counter = self.counters.entry(base.clone()).or_insert(0);
        // `a` + 10 and `a1` + 0 render the same; skip names already handed out.
        loop {
            let placeholder = format!(":{base}{counter}");
            *counter += 1;
            if self.issued.insert(placeholder.clone()) {
                return placeholder;
            }
        }
    }

    /// Append a binding.
    pub fn record(&mut self, placeholder: String, value: Value, column: &str) {
        self.params.push(BoundParam {
            placeholder,
            value,
            column: column.to_string(),
        });
    }

    /// Reserve a placeholder for `column` and bind `value` to it.
    pub fn bind(&mut self, column: &str, value: Value) -> String {
        let placeholder = self.next_placeholder(column);
        self.record(placeholder.clone(), value, column);
        placeholder
    }

    /// Recorded bindings in the order they were added.
    pub fn params(&self) -> &[BoundParam] {
        &self.params
    }

    /// Number of recorded bindings.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether nothing has been bound yet.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

fn sanitize(column: &str) -> String {
    let cleaned: String = column
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if cleaned.is_empty() {
        "p".to_string()
    } else {
        cleaned
    }
}
