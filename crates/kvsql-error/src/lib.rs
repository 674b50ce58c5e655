//! Error type shared across the kvsql workspace.
//!
//! Every crate returns [`Result<T>`]. Variants are grouped by the layer that
//! raises them; callers that need to distinguish join-layer failures from
//! propagated catalog or storage failures match on the variant directly.

use thiserror::Error;

/// Workspace-wide error.
#[derive(Debug, Error)]
pub enum KvSqlError {
    // ── Arguments ──────────────────────────────────────────────────────────
    /// Malformed construction input (missing snapshot, empty join list, ...).
    #[error("illegal arguments")]
    IllegalArguments,

    // ── Joins ──────────────────────────────────────────────────────────────
    /// A join kind other than `INNER` was requested.
    #[error("unsupported join type")]
    UnsupportedJoinType,
    /// A join data source is not a directly resolvable table.
    #[error("joins are limited to tables")]
    LimitedJoins,
    /// The join condition does not equate a row column with the joined
    /// table's primary key, or the referenced column is not in the row.
    #[error("invalid join column")]
    InvalidJoinColumn,

    // ── Catalog ────────────────────────────────────────────────────────────
    #[error("no database selected")]
    NoDatabaseSelected,
    #[error("database does not exist: {0}")]
    DatabaseDoesNotExist(String),
    #[error("database already exists: {0}")]
    DatabaseAlreadyExists(String),
    #[error("table does not exist: {0}")]
    TableDoesNotExist(String),
    #[error("table already exists: {0}")]
    TableAlreadyExists(String),
    #[error("column does not exist: {0}")]
    ColumnDoesNotExist(String),
    #[error("invalid primary key: {0}")]
    InvalidPrimaryKey(String),

    // ── Values and expressions ─────────────────────────────────────────────
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("values are not comparable")]
    NotComparableValues,
    #[error("invalid condition")]
    InvalidCondition,
    #[error("missing parameter: {0}")]
    MissingParameter(String),
    /// Ordering (or seeking) is only supported on the primary key.
    #[error("ordering is limited to the primary key")]
    LimitedOrderBy,

    // ── Storage ────────────────────────────────────────────────────────────
    #[error("corrupted data: {0}")]
    CorruptedData(String),

    // ── Lifecycle ──────────────────────────────────────────────────────────
    #[error("already closed")]
    AlreadyClosed,

    // ── Configuration ──────────────────────────────────────────────────────
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl KvSqlError {
    /// Build an [`KvSqlError::Internal`] from anything printable.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the error was raised while validating a join specification,
    /// as opposed to being propagated from a collaborator.
    pub const fn is_join_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedJoinType | Self::LimitedJoins | Self::InvalidJoinColumn
        )
    }
}

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, KvSqlError>;
