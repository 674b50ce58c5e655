//! Table scan ordered by primary key.

use std::sync::Arc;

use kvsql_catalog::Table;
use kvsql_error::{KvSqlError, Result};
use kvsql_store::{KeyReader, ReaderSpec, Snapshot};
use kvsql_types::{ColumnDescriptors, Row, encode_selector};
use tracing::trace;

use crate::data_source::SeekSpec;
use crate::engine::Engine;
use crate::row_codec;
use crate::row_reader::RowReader;

/// Reads the rows of one table from a snapshot in primary-key order.
///
/// Rows are keyed by `(db, alias, column)` selectors. Columns without a stored
/// value are reported as `NULL`.
#[derive(Debug)]
pub struct RawRowReader {
    db: String,
    alias: String,
    table: Arc<Table>,
    reader: KeyReader,
    /// Full storage key a point seek is restricted to.
    point_key: Option<Vec<u8>>,
    finished: bool,
}

impl RawRowReader {
    /// Open a scan over `table`, optionally positioned by `seek`.
    ///
    /// # Errors
    ///
    /// Returns [`KvSqlError::LimitedOrderBy`] when the seek column is not the
    /// table's primary key, and [`KvSqlError::IllegalArguments`] for a point
    /// seek without a key.
    pub fn new(
        engine: &Engine,
        snapshot: &Snapshot,
        table: Arc<Table>,
        alias: &str,
        seek: Option<&SeekSpec>,
    ) -> Result<Self> {
        let prefix = engine.row_prefix(&table);
        let mut spec = ReaderSpec::prefix(prefix.clone());
        let mut point_key = None;

        if let Some(seek) = seek {
            let pk = table.primary_key();
            let on_pk = seek.column.col.eq_ignore_ascii_case(pk.name())
                && seek
                    .column
                    .table
                    .as_deref()
                    .is_none_or(|t| t.eq_ignore_ascii_case(alias));
            if !on_pk {
                return Err(KvSqlError::LimitedOrderBy);
            }

            match (&seek.init_key, seek.point) {
                (None, true) => return Err(KvSqlError::IllegalArguments),
                (None, false) => {}
                (Some(init), point) => {
                    let mut start = prefix;
                    start.extend_from_slice(init);
                    if point {
                        point_key = Some(start.clone());
                    }
                    spec = spec.with_seek(start, true);
                }
            }
        }

        trace!(
            table = %table.name(),
            alias,
            snapshot_tx = snapshot.tx(),
            point = point_key.is_some(),
            "table scan opened"
        );

        Ok(Self {
            db: table.db_name().to_owned(),
            alias: alias.to_owned(),
            reader: snapshot.reader(spec),
            table,
            point_key,
            finished: false,
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }
}

impl RowReader for RawRowReader {
    fn implicit_db(&self) -> &str {
        &self.db
    }

    fn implicit_table(&self) -> &str {
        &self.alias
    }

    fn columns(&self) -> Result<ColumnDescriptors> {
        Ok(self
            .table
            .columns()
            .map(|c| {
                (
                    encode_selector("", &self.db, &self.alias, c.name()),
                    c.col_type(),
                )
            })
            .collect())
    }

    fn read(&mut self) -> Result<Option<Row>> {
        if self.reader.is_closed() {
            return Err(KvSqlError::AlreadyClosed);
        }
        if self.finished {
            return Ok(None);
        }

        let Some((key, value)) = self.reader.read()? else {
            self.finished = true;
            return Ok(None);
        };
        if let Some(point) = &self.point_key {
            // One lookup per point reader.
            self.finished = true;
            if key != *point {
                return Ok(None);
            }
        }

        let decoded = row_codec::decode_row(&self.table, &value)?;
        let mut row = Row::new();
        for (col_id, v) in decoded {
            let col = self.table.column_by_id(col_id).ok_or_else(|| {
                KvSqlError::internal(format!("decoded unknown column id {col_id}"))
            })?;
            row.insert(encode_selector("", &self.db, &self.alias, col.name()), v);
        }
        Ok(Some(row))
    }

    fn close(&mut self) -> Result<()> {
        self.reader.close()
    }
}
