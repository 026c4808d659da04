//! Trait definitions for query builders.

use crate::error::QbResult;
use crate::qb::param::BoundParam;
use std::time::Duration;

/// Base trait for all query builders.
///
/// Rendering never touches the database: [`to_sql`](Self::to_sql) can be
/// called at any time, while [`sql`](Self::sql) only reports text after a
/// terminal method has run the statement.
pub trait SqlQb {
    /// Build the SQL string.
    fn build_sql(&self) -> String;

    /// Bound parameters in the order they were added.
    fn params(&self) -> &[BoundParam];

    /// Debug helper to get the SQL string.
    fn to_sql(&self) -> String {
        self.build_sql()
    }

    /// Validate builder state before execution.
    fn validate(&self) -> QbResult<()> {
        Ok(())
    }

    /// The SQL that was executed, once it has been.
    fn sql(&self) -> Option<&str>;

    /// Wall-clock time of the execution, once it has run.
    fn execution_time(&self) -> Option<Duration>;

    /// Whether a terminal method has already run this statement.
    fn is_executed(&self) -> bool {
        self.sql().is_some()
    }
}

/// Implements [`SqlQb`]'s state accessors for a builder with a `state` field.
macro_rules! impl_stmt_accessors {
    () => {
        fn params(&self) -> &[$crate::qb::BoundParam] {
            self.state.clauses.binder.params()
        }

        fn sql(&self) -> Option<&str> {
            self.state.sql.as_deref()
        }

        fn execution_time(&self) -> Option<std::time::Duration> {
            self.state.execution_time
        }
    };
}

pub(crate) use impl_stmt_accessors;
