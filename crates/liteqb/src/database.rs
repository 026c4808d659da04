//! The database handle: one SQLite connection plus its tables and transcript.

use crate::config::{DatabaseConfig, TransactionKind};
use crate::cursor::ResultCursor;
use crate::error::{QbError, QbResult};
use crate::execute::{Mode, execute};
use crate::monitor::QueryLog;
use crate::qb::FilterQb;
use crate::row::Row;
use crate::table::{Table, TableRegistry};
use crate::value::Value;
use rusqlite::Connection;
use std::fmt;
use std::path::Path;

/// Name reported for in-memory databases.
pub const MEMORY: &str = ":memory:";

/// An open SQLite database.
///
/// All statements issued through a `Database` (and the [`Table`] handles it
/// hands out) run on its single connection.
pub struct Database {
    name: String,
    conn: Connection,
    config: DatabaseConfig,
    tables: TableRegistry,
    queries: QueryLog,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("tables", &self.tables)
            .field("queries", &self.queries)
            .finish()
    }
}

impl Database {
    /// Open (and by default create) a database file.
    pub fn open(path: impl AsRef<Path>, config: DatabaseConfig) -> QbResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(path, config.open_flags())?;
        Self::setup(path.display().to_string(), conn, config)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory(config: DatabaseConfig) -> QbResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::setup(MEMORY.to_string(), conn, config)
    }

    fn setup(name: String, conn: Connection, config: DatabaseConfig) -> QbResult<Self> {
        conn.busy_timeout(config.busy_timeout)?;
        if !config.read_only {
            let mode: String = conn.pragma_update_and_check(
                None,
                "journal_mode",
                config.journal_mode.as_str(),
                |row| row.get(0),
            )?;
            conn.pragma_update(None, "synchronous", config.synchronous.as_str())?;
            tracing::info!(
                database = %name,
                journal_mode = %mode,
                synchronous = config.synchronous.as_str(),
                "opened database"
            );
        } else {
            tracing::info!(database = %name, "opened database read-only");
        }

        let queries = QueryLog::new();
        queries.listen(config.record_queries);
        Ok(Self {
            name,
            conn,
            config,
            tables: TableRegistry::default(),
            queries,
        })
    }

    /// Whether `path` exists and holds a database this process can open.
    pub fn exists(path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if !Self::file_exists(path) {
            return false;
        }
        Connection::open_with_flags(path, DatabaseConfig::new().read_only().open_flags())
            .and_then(|conn| {
                conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
                    row.get::<_, i64>(0)
                })
            })
            .is_ok()
    }

    /// Whether a file exists at `path`.
    pub fn file_exists(path: impl AsRef<Path>) -> bool {
        path.as_ref().is_file()
    }

    /// Create an empty database file, along with missing parent directories.
    ///
    /// Fails when a file already exists at `path`.
    pub fn create(path: impl AsRef<Path>) -> QbResult<()> {
        let path = path.as_ref();
        if Self::file_exists(path) {
            return Err(QbError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("database already exists: {}", path.display()),
            )));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        // Touching the schema forces SQLite to write the header.
        conn.execute_batch("PRAGMA user_version = 0;")?;
        conn.close().map_err(|(_, e)| QbError::from(e))
    }

    /// The SQLite library version.
    pub fn version() -> &'static str {
        rusqlite::version()
    }

    /// File path, or `:memory:`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// The underlying connection, for anything the builders do not cover.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn queries(&self) -> &QueryLog {
        &self.queries
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.tables
    }

    /// Handle for the named table. Repeated calls share state.
    pub fn table(&self, name: &str) -> Table<'_> {
        Table::new(self, self.tables.get_or_insert(name))
    }

    /// User tables as their `sqlite_master` rows, by name.
    pub fn tables(&self) -> QbResult<Vec<Row>> {
        self.table("sqlite_master")
            .select("*")
            .where_eq("type", "table")?
            .and_where("name", "NOT LIKE", "sqlite_%")?
            .order_by_asc("name")
            .rows()
    }

    /// Run one or more statements that return no rows.
    pub fn exec(&self, sql: &str) -> QbResult<()> {
        let started = std::time::Instant::now();
        let result = self.conn.execute_batch(sql).map_err(QbError::from);
        let duration = started.elapsed();
        crate::monitor::trace_execution(
            None,
            sql,
            0,
            duration,
            self.config.slow_query_threshold,
            result.as_ref().err(),
        );
        self.queries.push(None, sql, duration);
        result
    }

    /// Run a single statement and return its result set.
    pub fn query(&self, sql: &str) -> QbResult<ResultCursor> {
        execute(self, None, sql, &[], Mode::Query)?.into_cursor()
    }

    /// First column of the first row `sql` returns, `None` when it returns
    /// no rows.
    ///
    /// ```rust,ignore
    /// let total: Option<Value> = db.single("SELECT SUM(age) FROM users")?;
    /// ```
    pub fn single(&self, sql: &str) -> QbResult<Option<Value>> {
        Ok(self
            .single_row(sql)?
            .and_then(|row| row.into_values().into_iter().next()))
    }

    /// First row `sql` returns, with every column.
    pub fn single_row(&self, sql: &str) -> QbResult<Option<Row>> {
        let mut cursor = self.query(sql)?;
        let row = cursor.next_row()?;
        cursor.finalize();
        Ok(row)
    }

    /// `PRAGMA key = value`. Any rows the pragma reports are discarded.
    pub fn pragma(&self, key: &str, value: impl fmt::Display) -> QbResult<()> {
        let mut cursor = self.query(&format!("PRAGMA {key} = {value}"))?;
        cursor.finalize();
        Ok(())
    }

    /// `BEGIN <kind> TRANSACTION [name]`.
    pub fn transaction_begin(&self, kind: TransactionKind, name: Option<&str>) -> QbResult<()> {
        self.exec(&transaction_sql(&format!("BEGIN {kind} TRANSACTION"), name))
    }

    pub fn transaction_commit(&self, name: Option<&str>) -> QbResult<()> {
        self.exec(&transaction_sql("COMMIT TRANSACTION", name))
    }

    /// Same as [`transaction_commit`](Self::transaction_commit), spelled `END`.
    pub fn transaction_end(&self, name: Option<&str>) -> QbResult<()> {
        self.exec(&transaction_sql("END TRANSACTION", name))
    }

    pub fn transaction_rollback(&self, name: Option<&str>) -> QbResult<()> {
        self.exec(&transaction_sql("ROLLBACK TRANSACTION", name))
    }

    /// Whether the connection is outside any transaction.
    pub fn is_autocommit(&self) -> bool {
        self.conn.is_autocommit()
    }

    /// Close the connection, reporting any error SQLite raises doing so.
    pub fn close(self) -> QbResult<()> {
        self.conn.close().map_err(|(_, e)| QbError::from(e))
    }
}

fn transaction_sql(head: &str, name: Option<&str>) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => format!("{head} {}", name.trim()),
        _ => head.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_names_are_optional() {
        assert_eq!(transaction_sql("COMMIT TRANSACTION", None), "COMMIT TRANSACTION");
        assert_eq!(transaction_sql("COMMIT TRANSACTION", Some(" ")), "COMMIT TRANSACTION");
        assert_eq!(
            transaction_sql("BEGIN IMMEDIATE TRANSACTION", Some("batch")),
            "BEGIN IMMEDIATE TRANSACTION batch"
        );
    }

    #[test]
    fn in_memory_reports_its_name() {
        let db = Database::open_in_memory(DatabaseConfig::default()).unwrap();
        assert_eq!(db.name(), MEMORY);
        assert!(db.is_autocommit());
        assert!(!Database::version().is_empty());
    }
}
