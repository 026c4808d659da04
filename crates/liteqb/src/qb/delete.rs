//! DELETE query builder.

use crate::error::QbResult;
use crate::execute::Mode;
use crate::qb::stmt::{ClauseState, FilterQb, StmtState};
use crate::qb::traits::{SqlQb, impl_stmt_accessors};
use crate::table::Table;

/// DELETE query builder.
///
/// Without conditions every row of the table is deleted.
#[derive(Debug, Clone)]
pub struct DeleteQb<'db> {
    state: StmtState<'db>,
}

impl<'db> DeleteQb<'db> {
    pub(crate) fn new(table: Table<'db>) -> Self {
        Self {
            state: StmtState::new(table, Vec::new()),
        }
    }

    /// Execute and return the number of deleted rows.
    pub fn rows(&mut self) -> QbResult<usize> {
        let sql = self.build_sql();
        Ok(self.state.run(sql, Mode::Execute)?.affected)
    }

    /// Execute against at most one matching row; whether a row was deleted.
    pub fn row(&mut self) -> QbResult<bool> {
        self.state.clauses.limit = Some(1);
        Ok(self.rows()? > 0)
    }
}

impl FilterQb for DeleteQb<'_> {
    fn clause_state(&mut self) -> &mut ClauseState {
        &mut self.state.clauses
    }
}

impl SqlQb for DeleteQb<'_> {
    fn build_sql(&self) -> String {
        let mut sql = format!("DELETE FROM {}", self.state.table.name());
        self.state
            .clauses
            .push_targeted_where(&mut sql, self.state.table.name());
        sql
    }

    impl_stmt_accessors!();
}
