//! Prepare, bind, run, and time one statement.

use crate::cursor::ResultCursor;
use crate::database::Database;
use crate::error::{QbError, QbResult};
use crate::monitor::trace_execution;
use crate::value::Value;
use rusqlite::types::Value as SqliteValue;
use std::time::{Duration, Instant};

/// What the statement is expected to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Read the full result set into a cursor.
    Query,
    /// Run to completion and report the change count.
    Execute,
}

/// A finished execution.
#[derive(Debug)]
pub(crate) struct Outcome {
    pub cursor: Option<ResultCursor>,
    pub affected: usize,
    pub last_insert_rowid: i64,
    pub duration: Duration,
}

impl Outcome {
    pub(crate) fn into_cursor(self) -> QbResult<ResultCursor> {
        self.cursor
            .ok_or_else(|| QbError::Other("statement produced no result set".to_string()))
    }
}

/// Run `sql` on the database connection with the given named bindings.
///
/// The execution is timed, traced, and recorded in the query log whether or
/// not the engine accepts it.
pub(crate) fn execute(
    db: &Database,
    table: Option<&str>,
    sql: &str,
    bindings: &[(String, SqliteValue)],
    mode: Mode,
) -> QbResult<Outcome> {
    let started = Instant::now();
    let result = run(db, sql, bindings, mode);
    let duration = started.elapsed();

    trace_execution(
        table,
        sql,
        bindings.len(),
        duration,
        db.config().slow_query_threshold,
        result.as_ref().err(),
    );
    db.queries().push(table, sql, duration);

    let (cursor, affected, last_insert_rowid) = result?;
    Ok(Outcome {
        cursor,
        affected,
        last_insert_rowid,
        duration,
    })
}

type RawOutcome = (Option<ResultCursor>, usize, i64);

fn run(
    db: &Database,
    sql: &str,
    bindings: &[(String, SqliteValue)],
    mode: Mode,
) -> QbResult<RawOutcome> {
    let conn = db.connection();
    let mut stmt = conn.prepare(sql)?;

    for (placeholder, value) in bindings {
        let idx = stmt.parameter_index(placeholder)?.ok_or_else(|| {
            QbError::validation(format!("placeholder {placeholder} does not appear in: {sql}"))
        })?;
        stmt.raw_bind_parameter(idx, value)?;
    }

    match mode {
        Mode::Query => {
            let columns: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(str::to_string)
                .collect();
            let width = columns.len();
            let mut rows = stmt.raw_query();
            let mut buffered = Vec::new();
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(width);
                for i in 0..width {
                    values.push(Value::from(row.get_ref(i)?));
                }
                buffered.push(values);
            }
            Ok((Some(ResultCursor::new(columns, buffered)), 0, 0))
        }
        Mode::Execute => {
            let affected = stmt.raw_execute()?;
            Ok((None, affected, conn.last_insert_rowid()))
        }
    }
}
