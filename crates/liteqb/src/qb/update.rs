//! UPDATE query builder.

use crate::error::{QbError, QbResult};
use crate::execute::Mode;
use crate::qb::stmt::{ClauseState, FilterQb, StmtState};
use crate::qb::traits::{SqlQb, impl_stmt_accessors};
use crate::table::Table;
use crate::value::Value;

/// UPDATE query builder.
///
/// The target columns are fixed when the builder is created; each
/// [`set`](Self::set) call binds values to them positionally.
///
/// ```rust,ignore
/// let qb = db.table("users").update(["name"])?.set(["Bob"])?.where_eq("id", 5)?;
/// assert_eq!(qb.to_sql(), "UPDATE users SET name = :name0 WHERE id = :id0");
/// ```
#[derive(Debug, Clone)]
pub struct UpdateQb<'db> {
    state: StmtState<'db>,
    assignments: Vec<(String, String)>,
}

impl<'db> UpdateQb<'db> {
    pub(crate) fn new(table: Table<'db>, columns: Vec<String>) -> Self {
        Self {
            state: StmtState::new(table, columns),
            assignments: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.state.columns
    }

    /// Bind `values` to the leading target columns, in order.
    ///
    /// Fewer values than columns leaves the rest unassigned; more is
    /// [`QbError::ColumnCountMismatch`].
    pub fn set<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> QbResult<Self> {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let expected = self.state.columns.len();
        if values.len() > expected {
            return Err(QbError::ColumnCountMismatch {
                expected,
                got: values.len(),
            });
        }
        for (column, value) in self.state.columns.iter().zip(values) {
            let placeholder = self.state.clauses.binder.bind(column, value);
            self.assignments.push((column.clone(), placeholder));
        }
        Ok(self)
    }

    /// `column = <expression>`, rendered verbatim with nothing bound.
    pub fn set_raw(mut self, column: &str, expression: &str) -> Self {
        self.assignments
            .push((column.to_string(), expression.to_string()));
        self
    }

    /// Execute and return the number of changed rows.
    pub fn rows(&mut self) -> QbResult<usize> {
        self.validate()?;
        let sql = self.build_sql();
        Ok(self.state.run(sql, Mode::Execute)?.affected)
    }

    /// Execute against at most one matching row; whether a row changed.
    pub fn row(&mut self) -> QbResult<bool> {
        self.state.clauses.limit = Some(1);
        Ok(self.rows()? > 0)
    }
}

impl FilterQb for UpdateQb<'_> {
    fn clause_state(&mut self) -> &mut ClauseState {
        &mut self.state.clauses
    }
}

impl SqlQb for UpdateQb<'_> {
    fn build_sql(&self) -> String {
        let mut sql = format!("UPDATE {} SET ", self.state.table.name());
        let assignments: Vec<String> = self
            .assignments
            .iter()
            .map(|(column, expr)| format!("{column} = {expr}"))
            .collect();
        sql.push_str(&assignments.join(", "));
        self.state
            .clauses
            .push_targeted_where(&mut sql, self.state.table.name());
        sql
    }

    fn validate(&self) -> QbResult<()> {
        if self.assignments.is_empty() {
            return Err(QbError::validation(format!(
                "UPDATE {} has no values to set",
                self.state.table.name()
            )));
        }
        Ok(())
    }

    impl_stmt_accessors!();
}
