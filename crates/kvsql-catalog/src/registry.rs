//! Database registry.
//!
//! Each database is a namespace of tables and carries a numeric id that
//! prefixes the storage keys of its rows. Names are matched
//! case-insensitively.

use std::sync::Arc;

use hashbrown::HashMap;
use kvsql_error::{KvSqlError, Result};
use tracing::debug;

use crate::table::{ColumnDef, Table};

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

/// A database and the tables it owns.
#[derive(Debug)]
pub struct Database {
    id: u32,
    name: String,
    /// Tables keyed by lower-cased name.
    tables: HashMap<String, Arc<Table>>,
    next_table_id: u32,
}

impl Database {
    fn new(id: u32, name: String) -> Self {
        Self {
            id,
            name,
            tables: HashMap::new(),
            next_table_id: 1,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a table by name.
    ///
    /// # Errors
    /// [`KvSqlError::TableDoesNotExist`] for unknown names.
    pub fn table(&self, name: &str) -> Result<Arc<Table>> {
        self.tables
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| KvSqlError::TableDoesNotExist(name.to_owned()))
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Create a table, assigning it the next table id.
    ///
    /// # Errors
    /// Returns error if the name is taken or the column list is invalid
    /// (see [`Table::try_new`]).
    pub fn create_table(
        &mut self,
        name: &str,
        columns: Vec<ColumnDef>,
        primary_key: &str,
    ) -> Result<Arc<Table>> {
        let key = name.to_ascii_lowercase();
        if self.tables.contains_key(&key) {
            return Err(KvSqlError::TableAlreadyExists(name.to_owned()));
        }

        let table = Arc::new(Table::try_new(
            self.next_table_id,
            name,
            self.id,
            &self.name,
            columns,
            primary_key,
        )?);
        self.next_table_id += 1;
        self.tables.insert(key, Arc::clone(&table));
        Ok(table)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Registry of databases, in creation order.
#[derive(Debug, Default)]
pub struct DatabaseRegistry {
    databases: Vec<Database>,
}

impl DatabaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a database with the given name.
    ///
    /// # Errors
    /// Returns error if the name is empty or already in use.
    pub fn create(&mut self, name: &str) -> Result<&mut Database> {
        if name.is_empty() {
            return Err(KvSqlError::IllegalArguments);
        }
        if self.find(name).is_ok() {
            return Err(KvSqlError::DatabaseAlreadyExists(name.to_owned()));
        }

        let id = u32::try_from(self.databases.len() + 1)
            .map_err(|_| KvSqlError::internal("database id space exhausted"))?;
        debug!(db = %name, id, "database created");

        self.databases.push(Database::new(id, name.to_owned()));
        let last = self.databases.len() - 1;
        Ok(&mut self.databases[last])
    }

    /// Look up a database by name.
    ///
    /// # Errors
    /// [`KvSqlError::DatabaseDoesNotExist`] for unknown names.
    pub fn find(&self, name: &str) -> Result<&Database> {
        self.databases
            .iter()
            .find(|db| db.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| KvSqlError::DatabaseDoesNotExist(name.to_owned()))
    }

    /// Mutable lookup, used when creating tables.
    pub fn find_mut(&mut self, name: &str) -> Result<&mut Database> {
        self.databases
            .iter_mut()
            .find(|db| db.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| KvSqlError::DatabaseDoesNotExist(name.to_owned()))
    }

    pub fn count(&self) -> usize {
        self.databases.len()
    }

    /// Database names in creation order.
    pub fn names(&self) -> Vec<String> {
        self.databases.iter().map(|db| db.name.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
