//! SELECT query builder.

use crate::condition::{Arg, BoolOp, ClauseKind, ClauseSet, ConditionBuilder, Predicate};
use crate::cursor::ResultCursor;
use crate::error::{QbError, QbResult};
use crate::execute::Mode;
use crate::qb::stmt::{ClauseState, FilterQb, StmtState};
use crate::qb::traits::{SqlQb, impl_stmt_accessors};
use crate::row::{FromRow, Row};
use crate::table::Table;
use crate::value::Value;

/// JOIN flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    /// Bare `JOIN`.
    #[default]
    Plain,
    Inner,
    Left,
    Cross,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Plain => "JOIN",
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

#[derive(Debug, Clone)]
struct Join {
    kind: JoinKind,
    table: String,
    on: String,
}

/// SELECT query builder.
///
/// ```rust,ignore
/// let adults = db
///     .table("users")
///     .select("*")
///     .and_where("age", ">", 18)?
///     .or_where_eq("status", "active")?
///     .order_by("id", SortDir::Asc)
///     .limit(10);
/// assert_eq!(
///     adults.to_sql(),
///     "SELECT * FROM users WHERE age > :age0 OR status = :status0 ORDER BY id ASC LIMIT 10"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct SelectQb<'db> {
    state: StmtState<'db>,
    distinct: bool,
    joins: Vec<Join>,
    group_by: Vec<String>,
    having: ClauseSet,
}

impl<'db> SelectQb<'db> {
    pub(crate) fn new(table: Table<'db>, columns: Vec<String>) -> Self {
        let columns = if columns.is_empty() {
            vec!["*".to_string()]
        } else {
            columns
        };
        Self {
            state: StmtState::new(table, columns),
            distinct: false,
            joins: Vec::new(),
            group_by: Vec::new(),
            having: ClauseSet::new(),
        }
    }

    pub fn table(&self) -> &Table<'db> {
        &self.state.table
    }

    // ==================== SELECT columns ====================

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Replace the selected columns.
    pub fn columns(mut self, columns: impl crate::qb::IntoColumns) -> Self {
        let columns = columns.into_columns();
        self.state.columns = if columns.is_empty() {
            vec!["*".to_string()]
        } else {
            columns
        };
        self
    }

    // ==================== FROM / JOIN ====================

    /// Alias the base table. The alias is rendered only when the statement
    /// has joins, but qualified conditions can always use it.
    pub fn short(mut self, alias: &str) -> Self {
        let alias = alias.trim().to_string();
        let table = self.state.table.name().to_string();
        self.state.aliases.insert(alias.clone(), table);
        self.state.short = alias;
        self
    }

    /// Add a join. `table` may carry an alias (`"orders o"`), which then
    /// qualifies bound columns (`o.total`).
    pub fn join(mut self, table: &str, on: &str, kind: JoinKind) -> Self {
        let table = table.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut parts = table.split(' ');
        if let (Some(name), Some(alias)) = (parts.next(), parts.next_back()) {
            self.state.aliases.insert(alias, name);
        }
        self.joins.push(Join {
            kind,
            table,
            on: on.trim().to_string(),
        });
        self
    }

    pub fn inner_join(self, table: &str, on: &str) -> Self {
        self.join(table, on, JoinKind::Inner)
    }

    pub fn left_join(self, table: &str, on: &str) -> Self {
        self.join(table, on, JoinKind::Left)
    }

    // ==================== GROUP BY / HAVING ====================

    pub fn group_by(mut self, columns: impl crate::qb::IntoColumns) -> Self {
        self.group_by.extend(columns.into_columns());
        self
    }

    fn add_having(mut self, column: &str, op: &str, value: Arg, prefix: BoolOp) -> QbResult<Self> {
        ConditionBuilder::new(
            &mut self.having,
            &mut self.state.clauses.binder,
            ClauseKind::Having,
        )
        .add_condition(column, value, op, prefix)?;
        Ok(self)
    }

    /// `AND column op value` in HAVING. Same operators as WHERE.
    pub fn having(self, column: &str, op: &str, value: impl Into<Arg>) -> QbResult<Self> {
        self.add_having(column, op, value.into(), BoolOp::And)
    }

    pub fn or_having(self, column: &str, op: &str, value: impl Into<Arg>) -> QbResult<Self> {
        self.add_having(column, op, value.into(), BoolOp::Or)
    }

    /// `AND <expression>` in HAVING, verbatim.
    pub fn having_raw(mut self, expression: &str) -> Self {
        self.having
            .push(BoolOp::And, Predicate::Raw(expression.to_string()));
        self
    }

    // ==================== Execution ====================

    /// Execute and return the cursor over the result set.
    pub fn cursor(&mut self) -> QbResult<ResultCursor> {
        self.validate()?;
        let sql = self.build_sql();
        self.state.run(sql, Mode::Query)?.into_cursor()
    }

    /// Execute and return every row.
    pub fn rows(&mut self) -> QbResult<Vec<Row>> {
        let mut cursor = self.cursor()?;
        let rows = cursor.get_rows()?;
        cursor.finalize();
        Ok(rows)
    }

    /// Execute with `LIMIT 1` and return the row, if any.
    pub fn row(&mut self) -> QbResult<Option<Row>> {
        self.state.clauses.limit = Some(1);
        Ok(self.rows()?.into_iter().next())
    }

    /// Execute with `LIMIT 1` and return one column of the row.
    ///
    /// `Ok(None)` means no row matched; a row without the column is
    /// [`QbError::ColumnNotFound`].
    pub fn row_value(&mut self, column: &str) -> QbResult<Option<Value>> {
        match self.row()? {
            Some(row) => row
                .get(column)
                .cloned()
                .map(Some)
                .ok_or_else(|| QbError::ColumnNotFound(column.to_string())),
            None => Ok(None),
        }
    }

    /// Number of rows the statement matches.
    ///
    /// Runs on a copy with the columns replaced by `COUNT(*)` and paging
    /// removed, so this builder is left untouched and can still execute.
    ///
    /// Joins, WHERE, GROUP BY and HAVING carry over unchanged, and DISTINCT is
    /// dropped. With a GROUP BY the statement yields one count per group and
    /// this returns the first group's count, not the number of groups
    /// [`rows`](Self::rows) would return.
    pub fn count(&self) -> QbResult<i64> {
        let mut counter = Self {
            state: self.state.fresh_copy(),
            distinct: false,
            joins: self.joins.clone(),
            group_by: self.group_by.clone(),
            having: self.having.clone(),
        };
        counter.state.columns = vec!["COUNT(*) AS rows_count".to_string()];
        counter.state.clauses.limit = None;
        counter.state.clauses.offset = None;
        counter.state.clauses.order.clear();

        let value = counter.row_value("rows_count")?;
        Ok(value.and_then(|v| v.as_i64()).unwrap_or(0))
    }

    /// Execute and map every row.
    pub fn fetch_all<T: FromRow>(&mut self) -> QbResult<Vec<T>> {
        self.rows()?.iter().map(T::from_row).collect()
    }

    /// Execute with `LIMIT 1` and map the row, if any.
    pub fn fetch_optional<T: FromRow>(&mut self) -> QbResult<Option<T>> {
        self.row()?.as_ref().map(T::from_row).transpose()
    }
}

impl FilterQb for SelectQb<'_> {
    fn clause_state(&mut self) -> &mut ClauseState {
        &mut self.state.clauses
    }
}

impl SqlQb for SelectQb<'_> {
    fn build_sql(&self) -> String {
        let state = &self.state;
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&state.columns.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(state.table.name());

        if !self.joins.is_empty() {
            if !state.short.is_empty() {
                sql.push_str(" AS ");
                sql.push_str(&state.short);
            }
            for join in &self.joins {
                sql.push(' ');
                sql.push_str(join.kind.as_str());
                sql.push(' ');
                sql.push_str(&join.table);
                if !join.on.is_empty() {
                    sql.push_str(" ON ");
                    sql.push_str(&join.on);
                }
            }
        }

        state.clauses.push_where(&mut sql);

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }
        if !self.having.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&self.having.render());
        }

        state.clauses.push_tail(&mut sql);
        sql
    }

    impl_stmt_accessors!();
}
