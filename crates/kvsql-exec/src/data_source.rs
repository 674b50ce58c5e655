//! Sources a plan can read rows from.

use std::fmt;
use std::sync::Arc;

use kvsql_catalog::Table;
use kvsql_error::{KvSqlError, Result};
use kvsql_store::Snapshot;
use kvsql_types::{ColSelector, SqlType, TypedValue};

use crate::engine::Engine;
use crate::raw_reader::RawRowReader;
use crate::row_reader::{Params, RowReader};
use crate::values_reader::ValuesRowReader;

/// Where a reader should start, and whether it should stop after one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeekSpec {
    /// Ordering column. Only a table's primary key is supported.
    pub column: ColSelector,
    /// Key-encoded value to start at. `None` starts at the first row.
    pub init_key: Option<Vec<u8>>,
    /// Yield only the row whose key equals `init_key`.
    pub point: bool,
}

impl SeekSpec {
    /// Rows at or after `init_key` (or all rows), ordered by `column`.
    pub fn range(column: ColSelector, init_key: Option<Vec<u8>>) -> Self {
        Self {
            column,
            init_key,
            point: false,
        }
    }

    /// At most the single row whose `column` encodes to `key`.
    pub fn point(column: ColSelector, key: Vec<u8>) -> Self {
        Self {
            column,
            init_key: Some(key),
            point: true,
        }
    }
}

/// Anything a reader can be opened on.
pub trait DataSource: fmt::Debug + Send + Sync {
    /// Name that qualifies the columns this source produces.
    fn alias(&self) -> &str;

    /// The underlying table reference, if this source is one. Joins are
    /// limited to sources that return `Some`.
    fn as_table_ref(&self) -> Option<&TableRef> {
        None
    }

    /// Open a reader over the source.
    ///
    /// # Errors
    /// Catalog errors for unresolvable tables and
    /// [`KvSqlError::LimitedOrderBy`] for unsupported seeks.
    fn resolve(
        &self,
        engine: &Engine,
        snapshot: &Snapshot,
        params: &Params,
        seek: Option<&SeekSpec>,
    ) -> Result<Box<dyn RowReader>>;
}

// ---------------------------------------------------------------------------
// TableRef
// ---------------------------------------------------------------------------

/// A reference to a stored table, optionally aliased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    db: Option<String>,
    table: String,
    alias: Option<String>,
}

impl TableRef {
    /// Reference into the engine's default database.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            db: None,
            table: table.into(),
            alias: None,
        }
    }

    #[must_use]
    pub fn in_db(mut self, db: impl Into<String>) -> Self {
        self.db = Some(db.into());
        self
    }

    #[must_use]
    pub fn aliased(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn db(&self) -> Option<&str> {
        self.db.as_deref()
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Look the table up in the catalog.
    ///
    /// # Errors
    /// [`KvSqlError::NoDatabaseSelected`], [`KvSqlError::DatabaseDoesNotExist`]
    /// or [`KvSqlError::TableDoesNotExist`].
    pub fn referenced_table(&self, engine: &Engine) -> Result<Arc<Table>> {
        engine.resolve_table(self.db.as_deref(), &self.table)
    }
}

impl DataSource for TableRef {
    fn alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    fn as_table_ref(&self) -> Option<&TableRef> {
        Some(self)
    }

    fn resolve(
        &self,
        engine: &Engine,
        snapshot: &Snapshot,
        _params: &Params,
        seek: Option<&SeekSpec>,
    ) -> Result<Box<dyn RowReader>> {
        let table = self.referenced_table(engine)?;
        let reader = RawRowReader::new(engine, snapshot, table, self.alias(), seek)?;
        Ok(Box::new(reader))
    }
}

// ---------------------------------------------------------------------------
// ValuesSource
// ---------------------------------------------------------------------------

/// Literal rows under an alias, the derived-table counterpart of
/// [`TableRef`]. It cannot be seeked, so it is never accepted as a join
/// target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuesSource {
    alias: String,
    columns: Vec<(String, SqlType)>,
    rows: Vec<Vec<TypedValue>>,
}

impl ValuesSource {
    pub fn new(
        alias: impl Into<String>,
        columns: Vec<(String, SqlType)>,
        rows: Vec<Vec<TypedValue>>,
    ) -> Self {
        Self {
            alias: alias.into(),
            columns,
            rows,
        }
    }
}

impl DataSource for ValuesSource {
    fn alias(&self) -> &str {
        &self.alias
    }

    fn resolve(
        &self,
        engine: &Engine,
        _snapshot: &Snapshot,
        _params: &Params,
        seek: Option<&SeekSpec>,
    ) -> Result<Box<dyn RowReader>> {
        if seek.is_some() {
            return Err(KvSqlError::LimitedOrderBy);
        }
        let db = engine.options().default_database.clone().unwrap_or_default();
        let reader =
            ValuesRowReader::new(db, self.alias.clone(), self.columns.clone(), self.rows.clone())?;
        Ok(Box::new(reader))
    }
}
