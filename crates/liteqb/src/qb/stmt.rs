//! State shared by every statement builder.

use crate::condition::{Arg, BoolOp, ClauseKind, ClauseSet, ConditionBuilder, Operator, Predicate};
use crate::error::{QbError, QbResult};
use crate::execute::{self, Mode, Outcome};
use crate::qb::param::ParameterBinder;
use crate::qb::resolve::{AliasMap, TypeResolver};
use crate::table::Table;
use crate::value::Value;
use rusqlite::types::Value as SqliteValue;
use std::fmt::Write as _;
use std::time::Duration;

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// Anything usable as a column list.
///
/// A single string is split on commas, so pass a slice when a column
/// expression itself contains one (`substr(name, 1, 2)`).
pub trait IntoColumns {
    fn into_columns(self) -> Vec<String>;
}

impl IntoColumns for &str {
    fn into_columns(self) -> Vec<String> {
        self.split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl IntoColumns for String {
    fn into_columns(self) -> Vec<String> {
        self.as_str().into_columns()
    }
}

impl IntoColumns for &[&str] {
    fn into_columns(self) -> Vec<String> {
        self.iter().map(|c| c.trim().to_string()).collect()
    }
}

impl<const N: usize> IntoColumns for [&str; N] {
    fn into_columns(self) -> Vec<String> {
        self.as_slice().into_columns()
    }
}

impl IntoColumns for Vec<&str> {
    fn into_columns(self) -> Vec<String> {
        self.as_slice().into_columns()
    }
}

impl IntoColumns for Vec<String> {
    fn into_columns(self) -> Vec<String> {
        self.into_iter().map(|c| c.trim().to_string()).collect()
    }
}

/// Parameters, WHERE conditions, ordering and paging.
#[derive(Debug, Clone, Default)]
pub struct ClauseState {
    pub(crate) binder: ParameterBinder,
    pub(crate) where_clauses: ClauseSet,
    pub(crate) order: Vec<(String, SortDir)>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
}

impl ClauseState {
    fn add_where(&mut self, column: &str, arg: Arg, op: &str, prefix: BoolOp) -> QbResult<()> {
        ConditionBuilder::new(&mut self.where_clauses, &mut self.binder, ClauseKind::Where)
            .add_condition(column, arg, op, prefix)
    }

    fn add_where_op(&mut self, column: &str, arg: Arg, op: Operator, prefix: BoolOp) -> QbResult<()> {
        ConditionBuilder::new(&mut self.where_clauses, &mut self.binder, ClauseKind::Where)
            .add(column, arg, op, prefix)
    }

    /// Set the direction for `column`, keeping its original position when
    /// it is already ordered on.
    fn order_by(&mut self, column: &str, dir: SortDir) {
        match self.order.iter_mut().find(|(c, _)| c == column) {
            Some(entry) => entry.1 = dir,
            None => self.order.push((column.to_string(), dir)),
        }
    }

    pub(crate) fn push_where(&self, sql: &mut String) {
        if !self.where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clauses.render());
        }
    }

    /// WHERE for UPDATE and DELETE on `table`.
    ///
    /// SQLite only accepts ORDER BY and LIMIT there when compiled with
    /// `SQLITE_ENABLE_UPDATE_DELETE_LIMIT`, so once either is set the rows are
    /// picked by a rowid subquery instead. Tables created `WITHOUT ROWID`
    /// cannot be limited this way.
    pub(crate) fn push_targeted_where(&self, sql: &mut String, table: &str) {
        if self.order.is_empty() && self.limit.is_none() && self.offset.is_none() {
            self.push_where(sql);
            return;
        }
        let _ = write!(sql, " WHERE rowid IN (SELECT rowid FROM {table}");
        self.push_where(sql);
        self.push_tail(sql);
        sql.push(')');
    }

    /// Append ORDER BY, LIMIT and OFFSET.
    pub(crate) fn push_tail(&self, sql: &mut String) {
        if !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            let items: Vec<String> = self
                .order
                .iter()
                .map(|(c, d)| format!("{c} {}", d.as_str()))
                .collect();
            sql.push_str(&items.join(", "));
        }
        match (self.limit, self.offset) {
            (Some(limit), _) => {
                let _ = write!(sql, " LIMIT {limit}");
            }
            // SQLite only accepts OFFSET after a LIMIT.
            (None, Some(_)) => sql.push_str(" LIMIT -1"),
            (None, None) => {}
        }
        if let Some(offset) = self.offset {
            let _ = write!(sql, " OFFSET {offset}");
        }
    }
}

/// Everything a builder carries besides its statement-specific parts.
#[derive(Debug, Clone)]
pub(crate) struct StmtState<'db> {
    pub(crate) table: Table<'db>,
    pub(crate) short: String,
    pub(crate) columns: Vec<String>,
    pub(crate) aliases: AliasMap,
    pub(crate) clauses: ClauseState,
    pub(crate) sql: Option<String>,
    pub(crate) execution_time: Option<Duration>,
}

impl<'db> StmtState<'db> {
    pub(crate) fn new(table: Table<'db>, columns: Vec<String>) -> Self {
        let short = table
            .name()
            .chars()
            .next()
            .map(String::from)
            .unwrap_or_default();
        Self {
            table,
            short,
            columns,
            aliases: AliasMap::new(),
            clauses: ClauseState::default(),
            sql: None,
            execution_time: None,
        }
    }

    /// The same statement, not yet executed.
    pub(crate) fn fresh_copy(&self) -> Self {
        let mut copy = self.clone();
        copy.sql = None;
        copy.execution_time = None;
        copy
    }

    /// Resolve each bound value to the engine value it is bound as.
    fn bindings(&self) -> QbResult<Vec<(String, SqliteValue)>> {
        let resolver = TypeResolver::new(&self.table, &self.aliases, &self.short);
        self.clauses
            .binder
            .params()
            .iter()
            .map(|p| {
                let ty = resolver.resolve(&p.column, &p.value)?;
                tracing::trace!(
                    placeholder = %p.placeholder,
                    column = %p.column,
                    storage_type = %ty,
                    "resolved bind type"
                );
                Ok((p.placeholder.clone(), p.value.to_sqlite(ty)))
            })
            .collect()
    }

    /// Run `sql` once. A second call fails with
    /// [`QbError::StatementAlreadyExecuted`].
    pub(crate) fn run(&mut self, sql: String, mode: Mode) -> QbResult<Outcome> {
        if let Some(previous) = &self.sql {
            return Err(QbError::StatementAlreadyExecuted(previous.clone()));
        }
        let bindings = self.bindings()?;
        self.sql = Some(sql.clone());
        let outcome = execute::execute(
            self.table.database(),
            Some(self.table.name()),
            &sql,
            &bindings,
            mode,
        )?;
        self.execution_time = Some(outcome.duration);
        Ok(outcome)
    }
}

/// WHERE conditions, ordering and paging, shared by SELECT, UPDATE and DELETE.
///
/// The first condition of a statement never renders its boolean prefix, so
/// starting with `or_where` is the same as starting with `and_where`.
pub trait FilterQb: Sized {
    #[doc(hidden)]
    fn clause_state(&mut self) -> &mut ClauseState;

    // ==================== WHERE ====================

    /// `AND column op value`. `op` is one of `=`, `!=`, `>`, `>=`, `<`, `<=`,
    /// `[NOT] LIKE`, `[NOT] GLOB`, `[NOT] BETWEEN`, `[NOT] IN`, `IS [NOT]`.
    fn and_where(mut self, column: &str, op: &str, value: impl Into<Arg>) -> QbResult<Self> {
        self.clause_state()
            .add_where(column, value.into(), op, BoolOp::And)?;
        Ok(self)
    }

    /// `OR column op value`.
    fn or_where(mut self, column: &str, op: &str, value: impl Into<Arg>) -> QbResult<Self> {
        self.clause_state()
            .add_where(column, value.into(), op, BoolOp::Or)?;
        Ok(self)
    }

    /// `AND column <op> value` with a parsed operator.
    fn where_op(mut self, column: &str, op: Operator, value: impl Into<Arg>) -> QbResult<Self> {
        self.clause_state()
            .add_where_op(column, value.into(), op, BoolOp::And)?;
        Ok(self)
    }

    fn where_eq(self, column: &str, value: impl Into<Arg>) -> QbResult<Self> {
        self.where_op(column, Operator::Eq, value)
    }

    fn or_where_eq(mut self, column: &str, value: impl Into<Arg>) -> QbResult<Self> {
        self.clause_state()
            .add_where_op(column, value.into(), Operator::Eq, BoolOp::Or)?;
        Ok(self)
    }

    fn where_ne(self, column: &str, value: impl Into<Arg>) -> QbResult<Self> {
        self.where_op(column, Operator::Ne, value)
    }

    fn where_in<T: Into<Value>>(
        self,
        column: &str,
        values: impl IntoIterator<Item = T>,
    ) -> QbResult<Self> {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.where_op(column, Operator::In, Arg::List(values))
    }

    fn where_not_in<T: Into<Value>>(
        self,
        column: &str,
        values: impl IntoIterator<Item = T>,
    ) -> QbResult<Self> {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.where_op(column, Operator::NotIn, Arg::List(values))
    }

    fn where_between(
        self,
        column: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> QbResult<Self> {
        self.where_op(
            column,
            Operator::Between,
            Arg::List(vec![low.into(), high.into()]),
        )
    }

    fn where_like(self, column: &str, pattern: impl Into<Value>) -> QbResult<Self> {
        self.where_op(column, Operator::Like, Arg::Value(pattern.into()))
    }

    fn where_null(self, column: &str) -> QbResult<Self> {
        self.where_op(column, Operator::Is, Arg::Value(Value::Null))
    }

    fn where_not_null(self, column: &str) -> QbResult<Self> {
        self.where_op(column, Operator::IsNot, Arg::Value(Value::Null))
    }

    /// `AND <expression>`, rendered verbatim with nothing bound.
    fn where_raw(mut self, expression: &str) -> Self {
        self.clause_state().where_clauses.push(
            BoolOp::And,
            Predicate::Raw(expression.to_string()),
        );
        self
    }

    /// `OR <expression>`, rendered verbatim with nothing bound.
    fn or_where_raw(mut self, expression: &str) -> Self {
        self.clause_state().where_clauses.push(
            BoolOp::Or,
            Predicate::Raw(expression.to_string()),
        );
        self
    }

    // ==================== ORDER / LIMIT ====================

    /// Order by `column`. Ordering on the same column again changes its
    /// direction in place.
    fn order_by(mut self, column: &str, dir: SortDir) -> Self {
        self.clause_state().order_by(column, dir);
        self
    }

    fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, SortDir::Asc)
    }

    fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, SortDir::Desc)
    }

    fn limit(mut self, limit: u64) -> Self {
        self.clause_state().limit = Some(limit);
        self
    }

    fn offset(mut self, offset: u64) -> Self {
        self.clause_state().offset = Some(offset);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_lists() {
        assert_eq!("id, name ,".into_columns(), vec!["id", "name"]);
        assert_eq!(["a", "b"].into_columns(), vec!["a", "b"]);
        assert_eq!(
            (&["substr(name, 1, 2)"][..]).into_columns(),
            vec!["substr(name, 1, 2)"]
        );
    }

    #[test]
    fn tail_rendering() {
        let mut state = ClauseState::default();
        state.order_by("id", SortDir::Asc);
        state.order_by("name", SortDir::Desc);
        state.order_by("id", SortDir::Desc);
        state.offset = Some(5);

        let mut sql = String::new();
        state.push_tail(&mut sql);
        assert_eq!(sql, " ORDER BY id DESC, name DESC LIMIT -1 OFFSET 5");

        state.limit = Some(10);
        let mut sql = String::new();
        state.push_tail(&mut sql);
        assert_eq!(sql, " ORDER BY id DESC, name DESC LIMIT 10 OFFSET 5");
    }
}
