//! Reader over literal rows.

use std::collections::VecDeque;

use kvsql_error::{KvSqlError, Result};
use kvsql_types::{ColumnDescriptors, Row, SqlType, TypedValue, encode_selector};

use crate::row_reader::RowReader;

/// Yields a fixed list of rows, validated against the declared columns up
/// front.
#[derive(Debug)]
pub struct ValuesRowReader {
    db: String,
    alias: String,
    columns: Vec<(String, SqlType)>,
    rows: VecDeque<Vec<TypedValue>>,
    closed: bool,
}

impl ValuesRowReader {
    /// # Errors
    ///
    /// Returns [`KvSqlError::IllegalArguments`] for an empty or duplicated
    /// column list or a row of the wrong width, and
    /// [`KvSqlError::InvalidValue`] for a value of the wrong type.
    pub fn new(
        db: String,
        alias: String,
        columns: Vec<(String, SqlType)>,
        rows: Vec<Vec<TypedValue>>,
    ) -> Result<Self> {
        if columns.is_empty() {
            return Err(KvSqlError::IllegalArguments);
        }
        for (i, (name, _)) in columns.iter().enumerate() {
            if columns[..i].iter().any(|(n, _)| n.eq_ignore_ascii_case(name)) {
                return Err(KvSqlError::IllegalArguments);
            }
        }
        for row in &rows {
            if row.len() != columns.len() {
                return Err(KvSqlError::IllegalArguments);
            }
            for (value, (_, ty)) in row.iter().zip(&columns) {
                value.check_type(*ty)?;
            }
        }

        Ok(Self {
            db,
            alias,
            columns,
            rows: rows.into(),
            closed: false,
        })
    }
}

impl RowReader for ValuesRowReader {
    fn implicit_db(&self) -> &str {
        &self.db
    }

    fn implicit_table(&self) -> &str {
        &self.alias
    }

    fn columns(&self) -> Result<ColumnDescriptors> {
        Ok(self
            .columns
            .iter()
            .map(|(name, ty)| (encode_selector("", &self.db, &self.alias, name), *ty))
            .collect())
    }

    fn read(&mut self) -> Result<Option<Row>> {
        if self.closed {
            return Err(KvSqlError::AlreadyClosed);
        }
        let Some(values) = self.rows.pop_front() else {
            return Ok(None);
        };
        Ok(Some(
            self.columns
                .iter()
                .zip(values)
                .map(|((name, _), v)| (encode_selector("", &self.db, &self.alias, name), v))
                .collect(),
        ))
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(KvSqlError::AlreadyClosed);
        }
        self.closed = true;
        Ok(())
    }
}
