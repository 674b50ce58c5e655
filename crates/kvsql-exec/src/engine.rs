//! Engine handle tying the store, catalog, and options together.

use std::fmt;
use std::sync::Arc;

use kvsql_catalog::{CatalogView, Table};
use kvsql_error::{KvSqlError, Result};
use kvsql_store::{KvStore, Snapshot};
use kvsql_types::TypedValue;
use tracing::debug;

use crate::options::EngineOptions;
use crate::row_codec;

/// Shared execution context. Cloning is cheap; clones share the store,
/// catalog, and options.
#[derive(Clone)]
pub struct Engine {
    store: Arc<KvStore>,
    catalog: Arc<dyn CatalogView>,
    options: Arc<EngineOptions>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("last_committed_tx", &self.store.last_committed_tx())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// # Errors
    /// [`KvSqlError::InvalidOptions`] when `options` fail validation.
    pub fn new(
        store: Arc<KvStore>,
        catalog: Arc<dyn CatalogView>,
        options: EngineOptions,
    ) -> Result<Self> {
        options.validate()?;
        debug!(
            prefix_len = options.prefix.len(),
            default_db = ?options.default_database,
            max_joins = options.max_joins,
            "engine opened"
        );
        Ok(Self {
            store,
            catalog,
            options: Arc::new(options),
        })
    }

    pub fn store(&self) -> &Arc<KvStore> {
        &self.store
    }

    pub fn catalog(&self) -> &dyn CatalogView {
        self.catalog.as_ref()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Snapshot at the latest committed transaction.
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// The default database, used by unqualified table references.
    ///
    /// # Errors
    /// [`KvSqlError::NoDatabaseSelected`] when none is configured.
    pub fn current_database(&self) -> Result<&str> {
        self.options
            .default_database
            .as_deref()
            .ok_or(KvSqlError::NoDatabaseSelected)
    }

    /// Resolve `table` in `db`, falling back to the default database.
    ///
    /// # Errors
    /// [`KvSqlError::NoDatabaseSelected`] when neither is given, otherwise
    /// whatever the catalog reports.
    pub fn resolve_table(&self, db: Option<&str>, table: &str) -> Result<Arc<Table>> {
        let db = match db {
            Some(db) => db,
            None => self.current_database()?,
        };
        self.catalog.resolve_table(db, table)
    }

    /// Key prefix of every row of `table`.
    pub fn row_prefix(&self, table: &Table) -> Vec<u8> {
        row_codec::table_prefix(&self.options.prefix, table)
    }

    /// Append one row in its own transaction, returning the transaction id.
    ///
    /// # Errors
    /// See [`row_codec::encode_row`].
    pub fn insert_row(&self, table: &Table, values: &[(&str, TypedValue)]) -> Result<u64> {
        let entry = row_codec::encode_row(&self.options.prefix, table, values)?;
        self.store.commit(vec![entry])
    }

    /// Append a batch of rows atomically.
    ///
    /// # Errors
    /// [`KvSqlError::IllegalArguments`] for an empty batch; nothing is written
    /// if any row fails to encode.
    pub fn insert_rows<'a, V>(&self, table: &Table, rows: &[V]) -> Result<u64>
    where
        V: AsRef<[(&'a str, TypedValue)]>,
    {
        if rows.is_empty() {
            return Err(KvSqlError::IllegalArguments);
        }
        let entries = rows
            .iter()
            .map(|row| row_codec::encode_row(&self.options.prefix, table, row.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let count = entries.len();
        let tx = self.store.commit(entries)?;
        debug!(table = %table.name(), rows = count, tx, "rows inserted");
        Ok(tx)
    }
}
