//! Tables and columns.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use kvsql_error::{KvSqlError, Result};
use kvsql_types::SqlType;

/// Column definition supplied when creating a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub col_type: SqlType,
    pub nullable: bool,
}

impl ColumnDef {
    /// A `NOT NULL` column.
    pub fn new(name: impl Into<String>, col_type: SqlType) -> Self {
        Self {
            name: name.into(),
            col_type,
            nullable: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// A column of a created table, with its stable id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    id: u32,
    name: String,
    col_type: SqlType,
    nullable: bool,
}

impl Column {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn col_type(&self) -> SqlType {
        self.col_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

/// Physical table metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    id: u32,
    name: String,
    db_id: u32,
    db_name: String,
    pk_id: u32,
    cols_by_id: BTreeMap<u32, Column>,
    /// Lower-cased column name → column id.
    cols_by_name: HashMap<String, u32>,
}

impl Table {
    /// Validate `columns` and build the table. Column ids are assigned from 1
    /// in declaration order.
    ///
    /// # Errors
    /// - [`KvSqlError::IllegalArguments`] for an empty or duplicated column list.
    /// - [`KvSqlError::InvalidPrimaryKey`] when the key column is missing,
    ///   nullable, or of a type that cannot be a key.
    pub fn try_new(
        id: u32,
        name: &str,
        db_id: u32,
        db_name: &str,
        columns: Vec<ColumnDef>,
        primary_key: &str,
    ) -> Result<Self> {
        if name.is_empty() || columns.is_empty() {
            return Err(KvSqlError::IllegalArguments);
        }

        let mut cols_by_id = BTreeMap::new();
        let mut cols_by_name = HashMap::with_capacity(columns.len());
        for (def, col_id) in columns.into_iter().zip(1u32..) {
            if def.name.is_empty()
                || cols_by_name
                    .insert(def.name.to_ascii_lowercase(), col_id)
                    .is_some()
            {
                return Err(KvSqlError::IllegalArguments);
            }
            cols_by_id.insert(
                col_id,
                Column {
                    id: col_id,
                    name: def.name,
                    col_type: def.col_type,
                    nullable: def.nullable,
                },
            );
        }

        let pk_id = *cols_by_name
            .get(&primary_key.to_ascii_lowercase())
            .ok_or_else(|| KvSqlError::InvalidPrimaryKey(primary_key.to_owned()))?;
        let pk = &cols_by_id[&pk_id];
        if pk.nullable || !pk.col_type.is_key_type() {
            return Err(KvSqlError::InvalidPrimaryKey(format!(
                "{} {}{}",
                pk.name,
                pk.col_type,
                if pk.nullable { " NULL" } else { "" }
            )));
        }

        Ok(Self {
            id,
            name: name.to_owned(),
            db_id,
            db_name: db_name.to_owned(),
            pk_id,
            cols_by_id,
            cols_by_name,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn db_id(&self) -> u32 {
        self.db_id
    }

    /// Name of the owning database.
    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    pub fn primary_key(&self) -> &Column {
        &self.cols_by_id[&self.pk_id]
    }

    /// Columns ascending by id.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.cols_by_id.values()
    }

    pub fn column_count(&self) -> usize {
        self.cols_by_id.len()
    }

    /// # Errors
    /// [`KvSqlError::ColumnDoesNotExist`] for unknown names.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.cols_by_name
            .get(&name.to_ascii_lowercase())
            .and_then(|id| self.cols_by_id.get(id))
            .ok_or_else(|| KvSqlError::ColumnDoesNotExist(format!("{}.{name}", self.name)))
    }

    pub fn column_by_id(&self, id: u32) -> Option<&Column> {
        self.cols_by_id.get(&id)
    }
}
