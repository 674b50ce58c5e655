//! Catalog: the schema authority that resolves table references to physical
//! metadata (owning database, primary key, columns).
//!
//! Resolution goes through the [`CatalogView`] trait so the execution layer
//! never depends on how schemas are stored. [`Catalog`] is the in-memory
//! implementation; tables are handed out as `Arc<Table>`, so resolving the
//! same reference once per row is a map lookup and a reference-count bump.

pub mod registry;
pub mod table;

use std::sync::Arc;

use kvsql_error::Result;
use parking_lot::RwLock;
use tracing::info;

pub use registry::{Database, DatabaseRegistry};
pub use table::{Column, ColumnDef, Table};

/// Resolves table references to catalog metadata.
///
/// Implementations must be idempotent: resolving the same name twice without
/// an intervening schema change returns equal tables.
pub trait CatalogView: Send + Sync {
    fn resolve_table(&self, db: &str, table: &str) -> Result<Arc<Table>>;
}

/// In-memory catalog.
#[derive(Debug, Default)]
pub struct Catalog {
    registry: RwLock<DatabaseRegistry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty database.
    ///
    /// # Errors
    /// [`KvSqlError::DatabaseAlreadyExists`](kvsql_error::KvSqlError::DatabaseAlreadyExists)
    /// when the name is taken.
    pub fn create_database(&self, name: &str) -> Result<()> {
        self.registry.write().create(name)?;
        Ok(())
    }

    /// Create a table in `db`.
    pub fn create_table(
        &self,
        db: &str,
        name: &str,
        columns: Vec<ColumnDef>,
        primary_key: &str,
    ) -> Result<Arc<Table>> {
        let mut registry = self.registry.write();
        let database = registry.find_mut(db)?;
        let table = database.create_table(name, columns, primary_key)?;
        drop(registry);

        info!(
            db = %table.db_name(),
            table = %table.name(),
            columns = table.column_count(),
            "table created"
        );
        Ok(table)
    }

    pub fn database_exists(&self, name: &str) -> bool {
        self.registry.read().find(name).is_ok()
    }

    pub fn database_names(&self) -> Vec<String> {
        self.registry.read().names()
    }
}

impl CatalogView for Catalog {
    fn resolve_table(&self, db: &str, table: &str) -> Result<Arc<Table>> {
        self.registry.read().find(db)?.table(table)
    }
}

#[cfg(test)]
mod tests {
    use kvsql_error::KvSqlError;
    use kvsql_types::SqlType;

    use super::*;

    fn customers(catalog: &Catalog) -> Arc<Table> {
        catalog
            .create_table(
                "shop",
                "customers",
                vec![
                    ColumnDef::new("id", SqlType::Integer),
                    ColumnDef::new("name", SqlType::Varchar).nullable(),
                ],
                "id",
            )
            .unwrap()
    }

    #[test]
    fn test_resolve_table_is_idempotent() {
        let catalog = Catalog::new();
        catalog.create_database("shop").unwrap();
        let created = customers(&catalog);

        let first = catalog.resolve_table("shop", "customers").unwrap();
        let second = catalog.resolve_table("SHOP", "Customers").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &created));
    }

    #[test]
    fn test_resolve_unknown_database_and_table() {
        let catalog = Catalog::new();
        assert!(matches!(
            catalog.resolve_table("nope", "t"),
            Err(KvSqlError::DatabaseDoesNotExist(_))
        ));

        catalog.create_database("shop").unwrap();
        assert!(matches!(
            catalog.resolve_table("shop", "t"),
            Err(KvSqlError::TableDoesNotExist(_))
        ));
    }

    #[test]
    fn test_create_table_in_missing_database() {
        let catalog = Catalog::new();
        let err = catalog
            .create_table("shop", "t", vec![ColumnDef::new("id", SqlType::Integer)], "id")
            .unwrap_err();
        assert!(matches!(err, KvSqlError::DatabaseDoesNotExist(_)));
    }

    #[test]
    fn test_database_listing() {
        let catalog = Catalog::new();
        catalog.create_database("a").unwrap();
        catalog.create_database("b").unwrap();
        assert!(catalog.database_exists("A"));
        assert_eq!(catalog.database_names(), vec!["a".to_owned(), "b".to_owned()]);
    }
}
