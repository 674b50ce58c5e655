//! Filtering reader.

use kvsql_error::{KvSqlError, Result};
use kvsql_types::{ColumnDescriptors, Row, TypedValue};

use crate::expr::Expr;
use crate::row_reader::{Params, RowReader};

/// Passes through the rows of `inner` for which `condition` is true.
/// `NULL` counts as not matching.
pub struct ConditionalRowReader<R> {
    inner: R,
    condition: Expr,
    params: Params,
}

impl<R: RowReader> ConditionalRowReader<R> {
    pub fn new(inner: R, condition: Expr, params: Params) -> Self {
        Self {
            inner,
            condition,
            params,
        }
    }
}

impl<R: RowReader> RowReader for ConditionalRowReader<R> {
    fn implicit_db(&self) -> &str {
        self.inner.implicit_db()
    }

    fn implicit_table(&self) -> &str {
        self.inner.implicit_table()
    }

    fn columns(&self) -> Result<ColumnDescriptors> {
        self.inner.columns()
    }

    fn read(&mut self) -> Result<Option<Row>> {
        while let Some(row) = self.inner.read()? {
            let verdict = self.condition.reduce(
                &row,
                self.inner.implicit_db(),
                self.inner.implicit_table(),
                &self.params,
            )?;
            match verdict {
                TypedValue::Boolean(true) => return Ok(Some(row)),
                TypedValue::Boolean(false) | TypedValue::Null => {}
                _ => return Err(KvSqlError::InvalidCondition),
            }
        }
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}
