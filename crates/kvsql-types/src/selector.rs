//! Canonical column selectors.
//!
//! Rows address their values by a string key of the form
//! `agg_fn(db.table.col)`, where `table` is the alias under which the table was
//! referenced and `agg_fn` is empty for plain columns. Using the alias keeps two
//! references to the same physical table apart, which is what makes self-joins
//! addressable.

use std::fmt;

use kvsql_error::{KvSqlError, Result};

/// Encode a selector into its canonical row key.
pub fn encode_selector(agg_fn: &str, db: &str, table: &str, col: &str) -> String {
    format!("{agg_fn}({db}.{table}.{col})")
}

/// Split a canonical row key back into `(agg_fn, db, table, col)`.
///
/// # Errors
/// Returns [`KvSqlError::InvalidValue`] when `selector` is not in canonical form.
pub fn decode_selector(selector: &str) -> Result<(&str, &str, &str, &str)> {
    let malformed = || KvSqlError::InvalidValue(format!("malformed selector: {selector}"));

    let open = selector.find('(').ok_or_else(malformed)?;
    let inner = selector[open + 1..]
        .strip_suffix(')')
        .ok_or_else(malformed)?;
    let agg_fn = &selector[..open];

    let mut parts = inner.splitn(3, '.');
    let db = parts.next().ok_or_else(malformed)?;
    let table = parts.next().ok_or_else(malformed)?;
    let col = parts.next().ok_or_else(malformed)?;
    Ok((agg_fn, db, table, col))
}

/// A possibly partially qualified column reference.
///
/// Missing qualifiers are filled in from the reader's implicit database and
/// table when the selector is resolved against a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColSelector {
    pub db: Option<String>,
    pub table: Option<String>,
    pub col: String,
}

impl ColSelector {
    /// Unqualified column reference.
    pub fn new(col: impl Into<String>) -> Self {
        Self {
            db: None,
            table: None,
            col: col.into(),
        }
    }

    /// Column qualified by table (or alias).
    pub fn qualified(table: impl Into<String>, col: impl Into<String>) -> Self {
        Self {
            db: None,
            table: Some(table.into()),
            col: col.into(),
        }
    }

    pub fn with_db(mut self, db: impl Into<String>) -> Self {
        self.db = Some(db.into());
        self
    }

    /// Fill in missing qualifiers, returning `(db, table, col)`.
    pub fn resolve<'a>(
        &'a self,
        implicit_db: &'a str,
        implicit_table: &'a str,
    ) -> (&'a str, &'a str, &'a str) {
        let db = self.db.as_deref().unwrap_or(implicit_db);
        let table = self.table.as_deref().unwrap_or(implicit_table);
        (db, table, &self.col)
    }

    /// Canonical row key after resolving missing qualifiers.
    pub fn encode(&self, implicit_db: &str, implicit_table: &str) -> String {
        let (db, table, col) = self.resolve(implicit_db, implicit_table);
        encode_selector("", db, table, col)
    }
}

impl fmt::Display for ColSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(db) = &self.db {
            write!(f, "{db}.")?;
        }
        if let Some(table) = &self.table {
            write!(f, "{table}.")?;
        }
        f.write_str(&self.col)
    }
}
