//! INSERT query builder.

use crate::error::{QbError, QbResult};
use crate::execute::Mode;
use crate::qb::stmt::StmtState;
use crate::qb::traits::{SqlQb, impl_stmt_accessors};
use crate::table::Table;
use crate::value::Value;

/// `INSERT OR <policy>` conflict resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    Rollback,
    Abort,
    Fail,
    Ignore,
    Replace,
}

impl ConflictPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictPolicy::Rollback => "ROLLBACK",
            ConflictPolicy::Abort => "ABORT",
            ConflictPolicy::Fail => "FAIL",
            ConflictPolicy::Ignore => "IGNORE",
            ConflictPolicy::Replace => "REPLACE",
        }
    }
}

/// Result of a single-row insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was inserted and received this rowid.
    RowId(i64),
    /// No rowid was reported; whether exactly one row was affected.
    Done(bool),
}

impl InsertOutcome {
    /// Whether a row was inserted.
    pub fn is_success(self) -> bool {
        matches!(self, InsertOutcome::RowId(_) | InsertOutcome::Done(true))
    }

    /// Rowid of the inserted row, when the engine reported one.
    pub fn row_id(self) -> Option<i64> {
        match self {
            InsertOutcome::RowId(id) => Some(id),
            InsertOutcome::Done(_) => None,
        }
    }
}

/// INSERT query builder.
///
/// Rows are staged with [`add_row`](Self::add_row) and sent as one
/// multi-row `INSERT`:
///
/// ```rust,ignore
/// let ok = db
///     .table("users")
///     .insert("name, age")?
///     .or_ignore()
///     .rows([vec![Value::from("Ann"), Value::from(31)], vec![Value::from("Bob"), Value::from(27)]])?;
/// ```
#[derive(Debug, Clone)]
pub struct InsertQb<'db> {
    state: StmtState<'db>,
    conflict: Option<ConflictPolicy>,
    rows: Vec<Vec<String>>,
}

impl<'db> InsertQb<'db> {
    pub(crate) fn new(table: Table<'db>, columns: Vec<String>) -> Self {
        Self {
            state: StmtState::new(table, columns),
            conflict: None,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.state.columns
    }

    // ==================== Conflict policy ====================

    /// Set the conflict policy. The last call wins.
    pub fn on_conflict(mut self, policy: ConflictPolicy) -> Self {
        self.conflict = Some(policy);
        self
    }

    pub fn or_rollback(self) -> Self {
        self.on_conflict(ConflictPolicy::Rollback)
    }

    pub fn or_abort(self) -> Self {
        self.on_conflict(ConflictPolicy::Abort)
    }

    pub fn or_fail(self) -> Self {
        self.on_conflict(ConflictPolicy::Fail)
    }

    pub fn or_ignore(self) -> Self {
        self.on_conflict(ConflictPolicy::Ignore)
    }

    pub fn or_replace(self) -> Self {
        self.on_conflict(ConflictPolicy::Replace)
    }

    // ==================== Rows ====================

    /// Collect one row, checking it against the insert columns.
    fn checked_row<V: Into<Value>>(&self, values: impl IntoIterator<Item = V>) -> QbResult<Vec<Value>> {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let expected = self.state.columns.len();
        if values.len() != expected {
            return Err(QbError::ColumnCountMismatch {
                expected,
                got: values.len(),
            });
        }
        Ok(values)
    }

    fn stage(&mut self, values: Vec<Value>) {
        let binder = &mut self.state.clauses.binder;
        let placeholders = self
            .state
            .columns
            .iter()
            .zip(values)
            .map(|(column, value)| binder.bind(column, value))
            .collect();
        self.rows.push(placeholders);
    }

    /// Stage one row. Values line up with the insert columns.
    pub fn add_row<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> QbResult<Self> {
        let values = self.checked_row(values)?;
        self.stage(values);
        Ok(self)
    }

    /// Number of staged rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    // ==================== Execution ====================

    /// Execute the staged rows. `true` only when every row was inserted.
    ///
    /// Rows the engine skipped (`OR IGNORE`) are not rolled back or retried;
    /// the partial insert is reported as `false`.
    pub fn execute(&mut self) -> QbResult<bool> {
        self.validate()?;
        let expected = self.rows.len();
        let sql = self.build_sql();
        let outcome = self.state.run(sql, Mode::Execute)?;
        if outcome.affected != expected {
            tracing::debug!(
                table = self.state.table.name(),
                expected,
                affected = outcome.affected,
                "partial insert"
            );
        }
        Ok(outcome.affected == expected)
    }

    /// Stage `rows` and execute.
    ///
    /// Every row is checked before any is staged, so a mismatched row leaves
    /// the builder as it was.
    pub fn rows<R, V>(&mut self, rows: impl IntoIterator<Item = R>) -> QbResult<bool>
    where
        R: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let rows = rows
            .into_iter()
            .map(|row| self.checked_row(row))
            .collect::<QbResult<Vec<_>>>()?;
        for row in rows {
            self.stage(row);
        }
        self.execute()
    }

    /// Stage one row and execute, reporting the new rowid when there is one.
    pub fn row<V: Into<Value>>(&mut self, values: impl IntoIterator<Item = V>) -> QbResult<InsertOutcome> {
        let values = self.checked_row(values)?;
        self.stage(values);
        self.validate()?;
        let sql = self.build_sql();
        let outcome = self.state.run(sql, Mode::Execute)?;
        if outcome.affected == 1 && outcome.last_insert_rowid != 0 {
            Ok(InsertOutcome::RowId(outcome.last_insert_rowid))
        } else {
            Ok(InsertOutcome::Done(outcome.affected == 1))
        }
    }
}

impl SqlQb for InsertQb<'_> {
    fn build_sql(&self) -> String {
        let mut sql = String::from("INSERT");
        if let Some(policy) = self.conflict {
            sql.push_str(" OR ");
            sql.push_str(policy.as_str());
        }
        sql.push_str(" INTO ");
        sql.push_str(self.state.table.name());
        sql.push_str(" (");
        sql.push_str(&self.state.columns.join(", "));
        sql.push_str(") VALUES ");
        let tuples: Vec<String> = self
            .rows
            .iter()
            .map(|placeholders| format!("({})", placeholders.join(", ")))
            .collect();
        sql.push_str(&tuples.join(", "));
        sql
    }

    fn validate(&self) -> QbResult<()> {
        if self.rows.is_empty() {
            return Err(QbError::EmptyRowSet(self.state.table.name().to_string()));
        }
        Ok(())
    }

    impl_stmt_accessors!();
}
