//! Query transcript and SQL tracing.
//!
//! Every statement that reaches the engine is reported twice:
//!
//! - as a `tracing` event on target `liteqb::sql` (`debug`, or `warn` once it
//!   crosses [`DatabaseConfig::slow_query_threshold`](crate::DatabaseConfig::slow_query_threshold));
//! - as a [`QueryRecord`] in the database's [`QueryLog`], while the log is listening.
//!
//! ```rust,ignore
//! let db = Database::open_in_memory(DatabaseConfig::default())?;
//! db.queries().listen(true);
//! db.exec("CREATE TABLE t (id INTEGER)")?;
//! assert_eq!(db.queries().len(), 1);
//! ```

use chrono::{DateTime, Utc};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Longest SQL text written into a tracing event, in bytes.
const MAX_TRACED_SQL: usize = 500;

/// The kind of statement being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    Pragma,
    Transaction,
    /// DDL and anything else.
    Other,
}

impl QueryType {
    /// Detect the statement kind from its leading keyword.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = strip_sql_prefix(sql);
        let keyword = |kw: &str| starts_with_keyword(trimmed, kw);
        if keyword("SELECT") || keyword("WITH") || keyword("VALUES") {
            QueryType::Select
        } else if keyword("INSERT") || keyword("REPLACE") {
            QueryType::Insert
        } else if keyword("UPDATE") {
            QueryType::Update
        } else if keyword("DELETE") {
            QueryType::Delete
        } else if keyword("PRAGMA") {
            QueryType::Pragma
        } else if keyword("BEGIN")
            || keyword("COMMIT")
            || keyword("END")
            || keyword("ROLLBACK")
            || keyword("SAVEPOINT")
            || keyword("RELEASE")
        {
            QueryType::Transaction
        } else {
            QueryType::Other
        }
    }
}

/// Skip leading whitespace and comments.
fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        s = s.trim_start();
        if let Some(rest) = s.strip_prefix("--") {
            match rest.find('\n') {
                Some(pos) => s = &rest[pos + 1..],
                None => return "",
            }
        } else if let Some(rest) = s.strip_prefix("/*") {
            match rest.find("*/") {
                Some(pos) => s = &rest[pos + 2..],
                None => return "",
            }
        } else {
            return s;
        }
    }
}

fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    match s.get(0..keyword.len()) {
        Some(prefix) => {
            prefix.eq_ignore_ascii_case(keyword)
                && !s[keyword.len()..]
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Emit the tracing event for one finished execution.
pub(crate) fn trace_execution(
    table: Option<&str>,
    sql: &str,
    param_count: usize,
    duration: Duration,
    slow_threshold: Option<Duration>,
    error: Option<&crate::QbError>,
) {
    let query_type = QueryType::from_sql(sql);
    let table = table.unwrap_or("-");
    let sql = if sql.len() > MAX_TRACED_SQL {
        format!("{}...", truncate_sql_bytes(sql, MAX_TRACED_SQL))
    } else {
        sql.to_string()
    };
    let elapsed_us = duration.as_micros() as u64;

    if let Some(error) = error {
        tracing::debug!(
            target: "liteqb::sql",
            query_type = ?query_type,
            table,
            param_count,
            elapsed_us,
            error = %error,
            sql = %sql,
            "statement failed"
        );
        return;
    }

    match slow_threshold {
        Some(threshold) if duration >= threshold => tracing::warn!(
            target: "liteqb::sql",
            query_type = ?query_type,
            table,
            param_count,
            elapsed_us,
            threshold_us = threshold.as_micros() as u64,
            sql = %sql,
            "slow query"
        ),
        _ => tracing::debug!(
            target: "liteqb::sql",
            query_type = ?query_type,
            table,
            param_count,
            elapsed_us,
            sql = %sql,
        ),
    }
}

/// One executed statement.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRecord {
    /// Owning table, or `None` for raw database-level statements.
    pub table: Option<String>,
    pub sql: String,
    pub duration: Duration,
    pub executed_at: DateTime<Utc>,
}

impl QueryRecord {
    pub fn query_type(&self) -> QueryType {
        QueryType::from_sql(&self.sql)
    }
}

impl fmt::Display for QueryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {:?} {}",
            self.executed_at.format("%H:%M:%S%.3f"),
            self.duration,
            self.sql
        )
    }
}

type Listener = Rc<dyn Fn(&QueryRecord)>;

/// In-memory transcript of executed statements.
///
/// Nothing is kept until [`listen`](Self::listen) turns recording on.
#[derive(Default)]
pub struct QueryLog {
    listening: Cell<bool>,
    listener: RefCell<Option<Listener>>,
    records: RefCell<Vec<QueryRecord>>,
}

impl fmt::Debug for QueryLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryLog")
            .field("listening", &self.listening.get())
            .field("has_listener", &self.listener.borrow().is_some())
            .field("records", &self.records.borrow().len())
            .finish()
    }
}

impl QueryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn recording on or off. Existing records are kept.
    pub fn listen(&self, enabled: bool) {
        self.listening.set(enabled);
    }

    /// Turn recording on and call `listener` for every new record.
    pub fn listen_with(&self, listener: impl Fn(&QueryRecord) + 'static) {
        *self.listener.borrow_mut() = Some(Rc::new(listener));
        self.listening.set(true);
    }

    pub fn is_listening(&self) -> bool {
        self.listening.get()
    }

    pub(crate) fn push(&self, table: Option<&str>, sql: &str, duration: Duration) {
        if !self.listening.get() {
            return;
        }
        let record = QueryRecord {
            table: table.map(str::to_string),
            sql: sql.to_string(),
            duration,
            executed_at: Utc::now(),
        };
        // Clone the callback out so it may use the log itself.
        let listener = self.listener.borrow().clone();
        if let Some(listener) = listener {
            listener(&record);
        }
        self.records.borrow_mut().push(record);
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Snapshot of all records, oldest first.
    pub fn records(&self) -> Vec<QueryRecord> {
        self.records.borrow().clone()
    }

    /// Records issued through the named table.
    pub fn for_table(&self, table: &str) -> Vec<QueryRecord> {
        self.records
            .borrow()
            .iter()
            .filter(|r| r.table.as_deref() == Some(table))
            .cloned()
            .collect()
    }

    pub fn last(&self) -> Option<QueryRecord> {
        self.records.borrow().last().cloned()
    }

    pub fn total_duration(&self) -> Duration {
        self.records.borrow().iter().map(|r| r.duration).sum()
    }

    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }
}
