//! Storage type resolution for bound values.
//!
//! The type a value is bound with is decided per parameter, in order:
//!
//! 1. an explicit override set with [`Table::set_column_type`];
//! 2. the column's declared type from the table schema (unknown declarations
//!    bind as `TEXT`, empty ones fall through);
//! 3. the runtime variant of the value.
//!
//! A qualified column (`o.total`) is resolved against the table the qualifier
//! names: a join alias, the statement's short alias, or a literal table name.

use crate::error::{QbError, QbResult};
use crate::table::Table;
use crate::value::{StorageType, Value};
use std::collections::HashMap;

/// Alias → table name, as registered by joins and `short`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    map: HashMap<String, String>,
}

impl AliasMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `alias` for `table`, replacing an earlier registration.
    pub fn insert(&mut self, alias: impl Into<String>, table: impl Into<String>) {
        self.map.insert(alias.into(), table.into());
    }

    /// Table registered for `alias`.
    pub fn get(&self, alias: &str) -> Option<&str> {
        self.map.get(alias).map(String::as_str)
    }

    /// Number of registered aliases.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no alias is registered.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Pick the storage type from the three tiers.
pub fn resolve_storage_type(
    override_ty: Option<StorageType>,
    declared: Option<&str>,
    value: &Value,
) -> StorageType {
    override_ty
        .or_else(|| declared.and_then(StorageType::from_declared))
        .unwrap_or_else(|| StorageType::of_value(value))
}

/// Split `q.col` when both halves are plain identifiers.
pub(crate) fn split_qualified(column: &str) -> Option<(&str, &str)> {
    let (qualifier, name) = column.split_once('.')?;
    (is_ident(qualifier) && is_ident(name)).then_some((qualifier, name))
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Resolves parameter types for one statement.
pub struct TypeResolver<'a, 'db> {
    table: &'a Table<'db>,
    aliases: &'a AliasMap,
    short: &'a str,
}

impl<'a, 'db> TypeResolver<'a, 'db> {
    /// Resolver for a statement on `table`, whose own alias is `short`.
    pub fn new(table: &'a Table<'db>, aliases: &'a AliasMap, short: &'a str) -> Self {
        Self {
            table,
            aliases,
            short,
        }
    }

    /// Storage type for `value` bound against `column`.
    ///
    /// Column expressions that are not plain or qualified names (`COUNT(id)`,
    /// `lower(name)`) resolve by the value alone unless overridden.
    pub fn resolve(&self, column: &str, value: &Value) -> QbResult<StorageType> {
        match split_qualified(column) {
            Some((qualifier, name)) => self.owner(qualifier)?.column_type(name, value),
            None => self.table.column_type(column, value),
        }
    }

    fn owner(&self, qualifier: &str) -> QbResult<Table<'db>> {
        let name = match self.aliases.get(qualifier) {
            Some(table) => table,
            None if qualifier == self.short => self.table.name(),
            None => qualifier,
        };
        if name == self.table.name() {
            return Ok(self.table.clone());
        }
        let owner = self.table.database().table(name);
        if owner.columns()?.is_empty() {
            return Err(QbError::UnknownTable(qualifier.to_string()));
        }
        Ok(owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::database::Database;

    #[test]
    fn tiers_apply_in_order() {
        let v = Value::Text("7".into());
        assert_eq!(
            resolve_storage_type(Some(StorageType::Real), Some("INTEGER"), &v),
            StorageType::Real
        );
        assert_eq!(resolve_storage_type(None, Some("INTEGER"), &v), StorageType::Integer);
        assert_eq!(resolve_storage_type(None, Some("VARCHAR(20)"), &Value::Integer(1)), StorageType::Text);
        assert_eq!(resolve_storage_type(None, Some(""), &Value::Real(1.5)), StorageType::Real);
        assert_eq!(resolve_storage_type(None, None, &Value::Null), StorageType::Null);
        assert_eq!(resolve_storage_type(None, None, &Value::Blob(vec![1])), StorageType::Blob);
    }

    #[test]
    fn qualified_names_need_identifier_halves() {
        assert_eq!(split_qualified("o.total"), Some(("o", "total")));
        assert_eq!(split_qualified("total"), None);
        assert_eq!(split_qualified("COUNT(o.id)"), None);
        assert_eq!(split_qualified("1.5"), None);
    }

    fn db() -> Database {
        let db = Database::open_in_memory(DatabaseConfig::default()).unwrap();
        db.exec(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, zip TEXT, score);
             CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER, total REAL);",
        )
        .unwrap();
        db
    }

    #[test]
    fn resolves_through_aliases() {
        let db = db();
        let users = db.table("users");
        let mut aliases = AliasMap::new();
        aliases.insert("o", "orders");
        let resolver = TypeResolver::new(&users, &aliases, "u");

        let text_int = Value::Text("12".into());
        assert_eq!(resolver.resolve("zip", &Value::Integer(1)).unwrap(), StorageType::Text);
        assert_eq!(resolver.resolve("u.id", &text_int).unwrap(), StorageType::Integer);
        assert_eq!(resolver.resolve("o.total", &text_int).unwrap(), StorageType::Real);
        assert_eq!(resolver.resolve("orders.user_id", &text_int).unwrap(), StorageType::Integer);
        // No declared type, no override: runtime variant.
        assert_eq!(resolver.resolve("score", &text_int).unwrap(), StorageType::Text);
        assert_eq!(resolver.resolve("COUNT(id)", &Value::Integer(1)).unwrap(), StorageType::Integer);
    }

    #[test]
    fn unknown_qualifier_fails() {
        let db = db();
        let users = db.table("users");
        let aliases = AliasMap::new();
        let resolver = TypeResolver::new(&users, &aliases, "u");
        assert!(matches!(
            resolver.resolve("x.id", &Value::Integer(1)),
            Err(QbError::UnknownTable(q)) if q == "x"
        ));
    }

    #[test]
    fn override_beats_schema() {
        let db = db();
        let users = db.table("users");
        users.set_column_type("id", "text").unwrap();
        let aliases = AliasMap::new();
        let resolver = TypeResolver::new(&users, &aliases, "u");
        assert_eq!(resolver.resolve("id", &Value::Integer(5)).unwrap(), StorageType::Text);
        assert_eq!(resolver.resolve("u.id", &Value::Integer(5)).unwrap(), StorageType::Text);
    }
}
