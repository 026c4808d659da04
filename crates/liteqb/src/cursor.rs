//! Forward-only access to an executed statement's result set.

use crate::error::{QbError, QbResult};
use crate::row::Row;
use crate::value::Value;
use std::rc::Rc;

/// A single-use, forward-only cursor over one executed result set.
///
/// Rows are read out of the engine when the statement runs, so the prepared
/// statement does not outlive execution. The cursor keeps the forward-only
/// contract on top of that buffer: [`get_rows`](Self::get_rows) drains from the
/// current position, [`count`](Self::count) scans and rewinds, and
/// [`finalize`](Self::finalize) releases the rows for good.
#[derive(Debug)]
pub struct ResultCursor {
    columns: Rc<[String]>,
    rows: Option<Vec<Vec<Value>>>,
    position: usize,
}

impl ResultCursor {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: Rc::from(columns),
            rows: Some(rows),
            position: 0,
        }
    }

    /// Column names in engine order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns in the result set.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Whether [`finalize`](Self::finalize) has released the rows.
    pub fn is_finalized(&self) -> bool {
        self.rows.is_none()
    }

    fn buffer(&self) -> QbResult<&Vec<Vec<Value>>> {
        self.rows.as_ref().ok_or(QbError::ResultAlreadyFinalized)
    }

    /// Cardinality of the whole result set. Rewinds the cursor to the start.
    pub fn count(&mut self) -> QbResult<usize> {
        let total = self.buffer()?.len();
        self.position = 0;
        Ok(total)
    }

    /// Next row, or `None` once exhausted.
    pub fn next_row(&mut self) -> QbResult<Option<Row>> {
        let columns = Rc::clone(&self.columns);
        let position = self.position;
        let row = self
            .buffer()?
            .get(position)
            .map(|values| Row::new(columns, values.clone()));
        if row.is_some() {
            self.position += 1;
        }
        Ok(row)
    }

    /// Drain the remaining rows, leaving the cursor exhausted.
    pub fn get_rows(&mut self) -> QbResult<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Release the result set. Any later access fails with
    /// [`QbError::ResultAlreadyFinalized`].
    pub fn finalize(&mut self) {
        self.rows = None;
        self.position = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor() -> ResultCursor {
        ResultCursor::new(
            vec!["n".to_string()],
            vec![vec![Value::Integer(1)], vec![Value::Integer(2)], vec![Value::Integer(3)]],
        )
    }

    #[test]
    fn count_rewinds_to_start() {
        let mut cur = cursor();
        assert!(cur.next_row().unwrap().is_some());
        assert_eq!(cur.count().unwrap(), 3);
        assert_eq!(cur.get_rows().unwrap().len(), 3);
    }

    #[test]
    fn get_rows_exhausts() {
        let mut cur = cursor();
        let rows = cur.get_rows().unwrap();
        assert_eq!(rows[2].get("n"), Some(&Value::Integer(3)));
        assert!(cur.get_rows().unwrap().is_empty());
    }

    #[test]
    fn access_after_finalize_fails() {
        let mut cur = cursor();
        cur.finalize();
        assert!(matches!(cur.count(), Err(QbError::ResultAlreadyFinalized)));
        assert!(matches!(cur.get_rows(), Err(QbError::ResultAlreadyFinalized)));
    }
}
