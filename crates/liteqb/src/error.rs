//! Error types for liteqb

use thiserror::Error;

/// Result type alias for liteqb operations
pub type QbResult<T> = Result<T, QbError>;

/// Error types for statement construction and execution
#[derive(Debug, Error)]
pub enum QbError {
    /// Unsupported WHERE/HAVING operator
    #[error("Invalid {clause} operator: {operator} for column: {column}")]
    InvalidOperator {
        clause: &'static str,
        operator: String,
        column: String,
    },

    /// Unknown explicit column type override
    #[error("Invalid column type: \"{0}\"")]
    InvalidTypeName(String),

    /// A join alias or qualified column references a table that does not exist
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// INSERT/UPDATE (or CREATE TABLE) invoked without target columns
    #[error("Table \"{0}\": empty columns")]
    EmptyColumnSet(String),

    /// Non-zero result code reported by SQLite, carried verbatim
    #[error("Sqlite error {code}: {message}")]
    Engine { code: i32, message: String },

    /// Result cursor accessed after its rows were released
    #[error("Result already finalized")]
    ResultAlreadyFinalized,

    /// Terminal operation called twice on one builder
    #[error("Statement already executed: {0}")]
    StatementAlreadyExecuted(String),

    /// Row or SET values do not line up with the target columns
    #[error("Column count mismatch: expected {expected} values, got {got}")]
    ColumnCountMismatch { expected: usize, got: usize },

    /// INSERT executed without any staged rows
    #[error("Table \"{0}\": no rows to insert")]
    EmptyRowSet(String),

    /// A requested column is absent from a result row
    #[error("Column not found in row: {0}")]
    ColumnNotFound(String),

    /// Builder state that cannot be rendered
    #[error("Validation error: {0}")]
    Validation(String),

    /// Filesystem error while creating a database file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl QbError {
    /// Create an invalid operator error
    pub fn invalid_operator(
        clause: &'static str,
        operator: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self::InvalidOperator {
            clause,
            operator: operator.into(),
            column: column.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this error was reported by the storage engine
    pub fn is_engine_error(&self) -> bool {
        matches!(self, Self::Engine { .. })
    }

    /// Check if this error was raised while building a statement, before execution
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidOperator { .. }
                | Self::InvalidTypeName(_)
                | Self::UnknownTable(_)
                | Self::EmptyColumnSet(_)
                | Self::EmptyRowSet(_)
                | Self::ColumnCountMismatch { .. }
                | Self::Validation(_)
        )
    }

    /// SQLite extended result code, if this is an engine error
    pub fn engine_code(&self) -> Option<i32> {
        match self {
            Self::Engine { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for QbError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, message) => Self::Engine {
                code: e.extended_code,
                message: message.unwrap_or_else(|| e.to_string()),
            },
            // Prepare-time failures carry the engine's code and message here.
            rusqlite::Error::SqlInputError { error, msg, .. } => Self::Engine {
                code: error.extended_code,
                message: msg,
            },
            other => Self::Engine {
                code: -1,
                message: other.to_string(),
            },
        }
    }
}
