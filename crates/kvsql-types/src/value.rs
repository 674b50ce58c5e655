//! SQL types and typed values.

use std::cmp::Ordering;
use std::fmt;

use kvsql_error::{KvSqlError, Result};

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SqlType {
    Integer,
    Boolean,
    Varchar,
    Blob,
    /// Microseconds since the Unix epoch.
    Timestamp,
}

impl SqlType {
    /// SQL spelling of the type.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Boolean => "BOOLEAN",
            Self::Varchar => "VARCHAR",
            Self::Blob => "BLOB",
            Self::Timestamp => "TIMESTAMP",
        }
    }

    /// Whether values of this type may form a primary key.
    pub const fn is_key_type(self) -> bool {
        !matches!(self, Self::Boolean)
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value tagged by its SQL type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypedValue {
    Null,
    Integer(i64),
    Boolean(bool),
    Varchar(String),
    Blob(Vec<u8>),
    Timestamp(i64),
}

impl TypedValue {
    /// The SQL type of the value; `None` for `NULL`, which fits any column.
    pub const fn sql_type(&self) -> Option<SqlType> {
        match self {
            Self::Null => None,
            Self::Integer(_) => Some(SqlType::Integer),
            Self::Boolean(_) => Some(SqlType::Boolean),
            Self::Varchar(_) => Some(SqlType::Varchar),
            Self::Blob(_) => Some(SqlType::Blob),
            Self::Timestamp(_) => Some(SqlType::Timestamp),
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check that the value can be stored in a column of type `ty`.
    pub fn check_type(&self, ty: SqlType) -> Result<()> {
        match self.sql_type() {
            None => Ok(()),
            Some(actual) if actual == ty => Ok(()),
            Some(actual) => Err(KvSqlError::InvalidValue(format!(
                "expected {ty}, got {actual}"
            ))),
        }
    }

    /// Compare two non-null values of the same type.
    ///
    /// # Errors
    /// Returns [`KvSqlError::NotComparableValues`] when the types differ or
    /// either side is `NULL`.
    pub fn compare(&self, other: &Self) -> Result<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) | (Self::Timestamp(a), Self::Timestamp(b)) => {
                Ok(a.cmp(b))
            }
            (Self::Boolean(a), Self::Boolean(b)) => Ok(a.cmp(b)),
            (Self::Varchar(a), Self::Varchar(b)) => Ok(a.cmp(b)),
            (Self::Blob(a), Self::Blob(b)) => Ok(a.cmp(b)),
            _ => Err(KvSqlError::NotComparableValues),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(v) | Self::Timestamp(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Varchar(v) => write!(f, "'{v}'"),
            Self::Blob(v) => {
                f.write_str("x'")?;
                for b in v {
                    write!(f, "{b:02x}")?;
                }
                f.write_str("'")
            }
        }
    }
}

impl From<i64> for TypedValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<bool> for TypedValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for TypedValue {
    fn from(v: &str) -> Self {
        Self::Varchar(v.to_owned())
    }
}

impl From<String> for TypedValue {
    fn from(v: String) -> Self {
        Self::Varchar(v)
    }
}

impl From<Vec<u8>> for TypedValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}
