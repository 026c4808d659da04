//! Table handles, schema cache, and per-column type overrides.

use crate::database::Database;
use crate::error::{QbError, QbResult};
use crate::monitor::QueryRecord;
use crate::qb::{
    DeleteQb, FilterQb, InsertOutcome, InsertQb, IntoColumns, SelectQb, UpdateQb,
    resolve_storage_type,
};
use crate::row::Row;
use crate::value::{StorageType, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// One column as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    /// Declared type text, possibly empty.
    pub declared_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    /// 1-based position in the primary key, 0 when not part of it.
    pub primary_key: i64,
}

impl ColumnInfo {
    fn from_row(row: &Row) -> QbResult<Self> {
        Ok(Self {
            cid: row.try_get("cid")?,
            name: row.try_get("name")?,
            declared_type: row.try_get::<Option<String>>("type")?.unwrap_or_default(),
            not_null: row.try_get::<i64>("notnull")? != 0,
            default_value: row
                .get("dflt_value")
                .filter(|v| !v.is_null())
                .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string)),
            primary_key: row.try_get("pk")?,
        })
    }

    /// Storage type implied by the declaration, if any.
    pub fn storage_type(&self) -> Option<StorageType> {
        StorageType::from_declared(&self.declared_type)
    }
}

/// Shared state behind every [`Table`] handle with the same name.
#[derive(Debug)]
pub(crate) struct TableState {
    name: String,
    schema: RefCell<Option<Rc<[ColumnInfo]>>>,
    column_types: RefCell<HashMap<String, StorageType>>,
}

impl TableState {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            schema: RefCell::new(None),
            column_types: RefCell::new(HashMap::new()),
        }
    }

    fn invalidate(&self) {
        self.schema.borrow_mut().take();
    }
}

/// The database's table handles, one state per table name.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: RefCell<HashMap<String, Rc<TableState>>>,
}

impl TableRegistry {
    pub(crate) fn get_or_insert(&self, name: &str) -> Rc<TableState> {
        let mut tables = self.tables.borrow_mut();
        Rc::clone(
            tables
                .entry(name.to_string())
                .or_insert_with(|| Rc::new(TableState::new(name))),
        )
    }

    /// Number of distinct tables handed out so far.
    pub fn len(&self) -> usize {
        self.tables.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.borrow().is_empty()
    }

    /// Names of the handles handed out so far, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

/// A named table in a [`Database`].
///
/// Handles are cheap to clone and share their schema cache and type
/// overrides with every other handle for the same name.
///
/// ```rust,ignore
/// let users = db.table("users");
/// users.set_column_type("zip", "TEXT")?;
///
/// let rows = users
///     .select("*")
///     .and_where("age", ">", 18)?
///     .order_by_asc("id")
///     .rows()?;
/// ```
#[derive(Clone)]
pub struct Table<'db> {
    db: &'db Database,
    state: Rc<TableState>,
}

impl fmt::Debug for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.state.name)
            .field("database", &self.db.name())
            .finish()
    }
}

impl<'db> Table<'db> {
    pub(crate) fn new(db: &'db Database, state: Rc<TableState>) -> Self {
        Self { db, state }
    }

    /// The table name as given to [`Database::table`].
    pub fn name(&self) -> &str {
        &self.state.name
    }

    /// The database this handle belongs to.
    pub fn database(&self) -> &'db Database {
        self.db
    }

    /// Column metadata, fetched on first use and cached.
    ///
    /// A table that does not exist reports no columns; that answer is not
    /// cached, so a later `CREATE TABLE` is picked up.
    pub fn columns(&self) -> QbResult<Rc<[ColumnInfo]>> {
        if let Some(schema) = self.state.schema.borrow().as_ref() {
            return Ok(Rc::clone(schema));
        }

        let sql = format!("PRAGMA table_info({})", quote_ident(self.name()));
        let mut cursor = self.db.query(&sql)?;
        let columns = cursor
            .get_rows()?
            .iter()
            .map(ColumnInfo::from_row)
            .collect::<QbResult<Vec<_>>>()?;
        cursor.finalize();

        let schema: Rc<[ColumnInfo]> = Rc::from(columns);
        if !schema.is_empty() {
            tracing::trace!(table = self.name(), columns = schema.len(), "cached table schema");
            *self.state.schema.borrow_mut() = Some(Rc::clone(&schema));
        }
        Ok(schema)
    }

    /// Metadata for one column, or `None` when the table has no such column.
    pub fn column(&self, name: &str) -> QbResult<Option<ColumnInfo>> {
        Ok(self.columns()?.iter().find(|c| c.name == name).cloned())
    }

    /// Force the storage type used when binding values for `column`.
    ///
    /// Accepts `INT`, `INTEGER`, `FLOAT`, `REAL`, `TEXT`, `RAW`, `BLOB` and
    /// `NULL` in any case.
    pub fn set_column_type(&self, column: &str, type_name: &str) -> QbResult<&Self> {
        let ty = StorageType::parse(type_name)?;
        self.state
            .column_types
            .borrow_mut()
            .insert(column.to_string(), ty);
        Ok(self)
    }

    /// Drop a previously set override.
    pub fn clear_column_type(&self, column: &str) -> &Self {
        self.state.column_types.borrow_mut().remove(column);
        self
    }

    /// Storage type `value` is bound with when targeting `column`.
    pub fn column_type(&self, column: &str, value: &Value) -> QbResult<StorageType> {
        let override_ty = self.state.column_types.borrow().get(column).copied();
        if let Some(ty) = override_ty {
            return Ok(ty);
        }
        let declared = self.column(column)?.map(|c| c.declared_type);
        Ok(resolve_storage_type(None, declared.as_deref(), value))
    }

    /// The `sqlite_master` row describing this table.
    pub fn info(&self) -> QbResult<Option<Row>> {
        self.db
            .table("sqlite_master")
            .select("*")
            .where_eq("type", "table")?
            .where_eq("name", self.name())?
            .row()
    }

    /// Whether `sqlite_master` lists the table.
    pub fn exists(&self) -> QbResult<bool> {
        Ok(self.info()?.is_some())
    }

    /// `CREATE TABLE IF NOT EXISTS` with the given column definitions,
    /// e.g. `["id INTEGER PRIMARY KEY", "name TEXT NOT NULL"]`.
    pub fn create<I, S>(&self, definitions: I) -> QbResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let definitions: Vec<String> = definitions
            .into_iter()
            .map(|d| d.as_ref().trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
        if definitions.is_empty() {
            return Err(QbError::EmptyColumnSet(self.name().to_string()));
        }

        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name(),
            definitions.join(", ")
        );
        self.db.exec(&sql)?;
        self.state.invalidate();
        Ok(())
    }

    /// `DROP TABLE IF EXISTS`. Overrides survive; the schema cache does not.
    pub fn drop_table(&self) -> QbResult<()> {
        self.db
            .exec(&format!("DROP TABLE IF EXISTS {}", self.name()))?;
        self.state.invalidate();
        Ok(())
    }

    /// Start a SELECT. An empty column list selects `*`.
    pub fn select(&self, columns: impl IntoColumns) -> SelectQb<'db> {
        SelectQb::new(self.clone(), columns.into_columns())
    }

    /// Start an INSERT over `columns`.
    pub fn insert(&self, columns: impl IntoColumns) -> QbResult<InsertQb<'db>> {
        let columns = columns.into_columns();
        if columns.is_empty() {
            return Err(QbError::EmptyColumnSet(self.name().to_string()));
        }
        Ok(InsertQb::new(self.clone(), columns))
    }

    /// Insert one row given as column/value pairs.
    pub fn insert_row<I, C, V>(&self, pairs: I) -> QbResult<InsertOutcome>
    where
        I: IntoIterator<Item = (C, V)>,
        C: AsRef<str>,
        V: Into<Value>,
    {
        let (columns, values): (Vec<String>, Vec<Value>) = pairs
            .into_iter()
            .map(|(c, v)| (c.as_ref().to_string(), v.into()))
            .unzip();
        self.insert(columns)?.row(values)
    }

    /// Start an UPDATE of `columns`; values are supplied with `set`.
    pub fn update(&self, columns: impl IntoColumns) -> QbResult<UpdateQb<'db>> {
        let columns = columns.into_columns();
        if columns.is_empty() {
            return Err(QbError::EmptyColumnSet(self.name().to_string()));
        }
        Ok(UpdateQb::new(self.clone(), columns))
    }

    /// Start a DELETE. Without conditions it removes every row.
    pub fn delete(&self) -> DeleteQb<'db> {
        DeleteQb::new(self.clone())
    }

    /// Recorded statements issued through this table.
    pub fn queries(&self) -> Vec<QueryRecord> {
        self.db.queries().for_table(self.name())
    }
}

/// Double-quote an identifier for use in a pragma argument.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    fn db() -> Database {
        Database::open_in_memory(DatabaseConfig::default()).unwrap()
    }

    #[test]
    fn quoting_doubles_embedded_quotes() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn handles_share_state() {
        let db = db();
        let a = db.table("users");
        let b = db.table("users");
        a.set_column_type("zip", "text").unwrap();
        assert_eq!(
            b.column_type("zip", &Value::Integer(1)).unwrap(),
            StorageType::Text
        );
        assert_eq!(db.registry().len(), 1);
    }

    #[test]
    fn missing_table_is_not_cached() {
        let db = db();
        let t = db.table("later");
        assert!(t.columns().unwrap().is_empty());
        assert!(!t.exists().unwrap());

        t.create(["id INTEGER PRIMARY KEY", "label"]).unwrap();
        let columns = t.columns().unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].primary_key, 1);
        assert_eq!(columns[1].declared_type, "");
        assert!(t.exists().unwrap());
    }

    #[test]
    fn create_requires_columns() {
        let db = db();
        let empty: [&str; 0] = [];
        assert!(matches!(
            db.table("t").create(empty),
            Err(QbError::EmptyColumnSet(t)) if t == "t"
        ));
        assert!(matches!(
            db.table("t").insert(Vec::<String>::new()),
            Err(QbError::EmptyColumnSet(_))
        ));
    }

    #[test]
    fn bad_override_is_rejected() {
        let db = db();
        assert!(matches!(
            db.table("t").set_column_type("a", "varchar"),
            Err(QbError::InvalidTypeName(name)) if name == "VARCHAR"
        ));
    }

    #[test]
    fn drop_invalidates_schema() {
        let db = db();
        let t = db.table("gone");
        t.create(["a INTEGER"]).unwrap();
        assert_eq!(t.columns().unwrap().len(), 1);
        t.drop_table().unwrap();
        assert!(t.columns().unwrap().is_empty());
    }
}
