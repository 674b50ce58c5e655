//! Join specifications.

use std::fmt;
use std::sync::Arc;

use crate::data_source::DataSource;
use crate::expr::Expr;

// ── Join Type ──────────────────────────────────────────────────────────────

/// Join variants a plan can request.
///
/// Only [`JoinType::Inner`] can be executed; the outer variants exist so a
/// planner can express them and receive a precise rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    /// Emit only rows with a match.
    Inner,
    /// Emit every left row; NULL-pad the right side on miss.
    Left,
    /// Emit every right row; NULL-pad the left side on miss.
    Right,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        })
    }
}

// ── Join Spec ──────────────────────────────────────────────────────────────

/// One join step: kind, what to join against, and the `ON` condition.
#[derive(Debug, Clone)]
pub struct JoinSpec {
    pub join_type: JoinType,
    pub ds: Arc<dyn DataSource>,
    pub cond: Expr,
}

impl JoinSpec {
    pub fn new(join_type: JoinType, ds: Arc<dyn DataSource>, cond: Expr) -> Self {
        Self {
            join_type,
            ds,
            cond,
        }
    }

    /// `INNER JOIN ds ON cond`
    pub fn inner(ds: impl DataSource + 'static, cond: Expr) -> Self {
        Self::new(JoinType::Inner, Arc::new(ds), cond)
    }
}
