//! Engine configuration.

use kvsql_error::{KvSqlError, Result};
use serde::{Deserialize, Serialize};

/// Default cap on the number of joins a single reader may chain.
pub const DEFAULT_MAX_JOINS: usize = 16;

/// Longest accepted key prefix.
pub const MAX_PREFIX_LEN: usize = 64;

/// Engine-wide settings.
///
/// Every field has a default, so a partial JSON document (or `{}`) is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    /// Bytes prepended to every row key, letting several engines share one
    /// store.
    pub prefix: Vec<u8>,

    /// Database used for table references that do not name one.
    pub default_database: Option<String>,

    /// Upper bound on joins per joint reader.
    pub max_joins: usize,
}

impl EngineOptions {
    /// Parse options from JSON and validate them.
    ///
    /// # Errors
    /// [`KvSqlError::Config`] for malformed JSON, [`KvSqlError::InvalidOptions`]
    /// when validation fails.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn with_prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_default_database(mut self, db: impl Into<String>) -> Self {
        self.default_database = Some(db.into());
        self
    }

    pub fn with_max_joins(mut self, max_joins: usize) -> Self {
        self.max_joins = max_joins;
        self
    }

    /// # Errors
    /// [`KvSqlError::InvalidOptions`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.max_joins == 0 {
            return Err(KvSqlError::InvalidOptions(
                "max_joins must be at least 1".to_owned(),
            ));
        }
        if self.prefix.len() > MAX_PREFIX_LEN {
            return Err(KvSqlError::InvalidOptions(format!(
                "prefix is {} bytes, at most {MAX_PREFIX_LEN} allowed",
                self.prefix.len()
            )));
        }
        if self.default_database.as_deref() == Some("") {
            return Err(KvSqlError::InvalidOptions(
                "default_database must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            prefix: Vec::new(),
            default_database: None,
            max_joins: DEFAULT_MAX_JOINS,
        }
    }
}
