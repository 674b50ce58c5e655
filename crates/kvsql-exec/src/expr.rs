//! Boolean and scalar expressions evaluated against rows.
//!
//! Evaluation uses SQL's three-valued logic: comparing against `NULL` yields
//! `NULL`, and `AND`/`OR`/`NOT` propagate it per the usual truth tables.
//! Consumers that filter rows keep a row only when the result is
//! `Boolean(true)`.

use std::cmp::Ordering;
use std::fmt;

use kvsql_catalog::Column;
use kvsql_error::{KvSqlError, Result};
use kvsql_types::{ColSelector, Row, TypedValue};

use crate::row_reader::Params;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    const fn holds(self, ord: Ordering) -> bool {
        match self {
            Self::Eq => matches!(ord, Ordering::Equal),
            Self::Ne => !matches!(ord, Ordering::Equal),
            Self::Lt => matches!(ord, Ordering::Less),
            Self::Le => !matches!(ord, Ordering::Greater),
            Self::Gt => matches!(ord, Ordering::Greater),
            Self::Ge => !matches!(ord, Ordering::Less),
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// An expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Column(ColSelector),
    Value(TypedValue),
    /// Named parameter, bound at evaluation time.
    Param(String),
    Cmp {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn col(selector: ColSelector) -> Self {
        Self::Column(selector)
    }

    pub fn value(value: impl Into<TypedValue>) -> Self {
        Self::Value(value.into())
    }

    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    pub fn cmp(op: CmpOp, left: Self, right: Self) -> Self {
        Self::Cmp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// `left = right`
    pub fn equal(left: Self, right: Self) -> Self {
        Self::cmp(CmpOp::Eq, left, right)
    }

    /// Equality between two columns, the shape of a join condition.
    pub fn cols_eq(left: ColSelector, right: ColSelector) -> Self {
        Self::equal(Self::Column(left), Self::Column(right))
    }

    pub fn and(left: Self, right: Self) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Self, right: Self) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    pub fn negate(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Evaluate against `row`. Unqualified selectors resolve against
    /// `implicit_db` and `implicit_table`.
    ///
    /// # Errors
    /// - [`KvSqlError::ColumnDoesNotExist`] when a selector is not in `row`.
    /// - [`KvSqlError::MissingParameter`] for unbound parameters.
    /// - [`KvSqlError::NotComparableValues`] when comparing mismatched types.
    /// - [`KvSqlError::InvalidCondition`] when a logical operand is not boolean.
    pub fn reduce(
        &self,
        row: &Row,
        implicit_db: &str,
        implicit_table: &str,
        params: &Params,
    ) -> Result<TypedValue> {
        match self {
            Self::Column(sel) => {
                let key = sel.encode(implicit_db, implicit_table);
                row.get(&key)
                    .cloned()
                    .ok_or_else(|| KvSqlError::ColumnDoesNotExist(key))
            }
            Self::Value(v) => Ok(v.clone()),
            Self::Param(name) => params
                .get(name)
                .cloned()
                .ok_or_else(|| KvSqlError::MissingParameter(name.clone())),
            Self::Cmp { op, left, right } => {
                let l = left.reduce(row, implicit_db, implicit_table, params)?;
                let r = right.reduce(row, implicit_db, implicit_table, params)?;
                if l.is_null() || r.is_null() {
                    return Ok(TypedValue::Null);
                }
                Ok(TypedValue::Boolean(op.holds(l.compare(&r)?)))
            }
            Self::And(left, right) => {
                let l = truth(&left.reduce(row, implicit_db, implicit_table, params)?)?;
                if l == Some(false) {
                    return Ok(TypedValue::Boolean(false));
                }
                let r = truth(&right.reduce(row, implicit_db, implicit_table, params)?)?;
                Ok(match (l, r) {
                    (_, Some(false)) => TypedValue::Boolean(false),
                    (Some(true), Some(true)) => TypedValue::Boolean(true),
                    _ => TypedValue::Null,
                })
            }
            Self::Or(left, right) => {
                let l = truth(&left.reduce(row, implicit_db, implicit_table, params)?)?;
                if l == Some(true) {
                    return Ok(TypedValue::Boolean(true));
                }
                let r = truth(&right.reduce(row, implicit_db, implicit_table, params)?)?;
                Ok(match (l, r) {
                    (_, Some(true)) => TypedValue::Boolean(true),
                    (Some(false), Some(false)) => TypedValue::Boolean(false),
                    _ => TypedValue::Null,
                })
            }
            Self::Not(inner) => {
                let v = truth(&inner.reduce(row, implicit_db, implicit_table, params)?)?;
                Ok(v.map_or(TypedValue::Null, |b| TypedValue::Boolean(!b)))
            }
        }
    }

    /// For a join condition `a = b`, return the side that is *not* the
    /// primary key `pk` of the table referenced as `alias`.
    ///
    /// # Errors
    /// [`KvSqlError::InvalidJoinColumn`] unless the expression is an equality
    /// between two column selectors, one of which names `alias.pk`.
    pub fn joint_column_to(&self, pk: &Column, alias: &str) -> Result<&ColSelector> {
        let Self::Cmp {
            op: CmpOp::Eq,
            left,
            right,
        } = self
        else {
            return Err(KvSqlError::InvalidJoinColumn);
        };
        let (Self::Column(l), Self::Column(r)) = (left.as_ref(), right.as_ref()) else {
            return Err(KvSqlError::InvalidJoinColumn);
        };

        // Exact match: row selectors are looked up verbatim.
        let names_pk =
            |sel: &ColSelector| sel.col == pk.name() && sel.table.as_deref() == Some(alias);
        if names_pk(l) {
            Ok(r)
        } else if names_pk(r) {
            Ok(l)
        } else {
            Err(KvSqlError::InvalidJoinColumn)
        }
    }
}

/// `Some(bool)` for booleans, `None` for `NULL`.
fn truth(value: &TypedValue) -> Result<Option<bool>> {
    match value {
        TypedValue::Boolean(b) => Ok(Some(*b)),
        TypedValue::Null => Ok(None),
        _ => Err(KvSqlError::InvalidCondition),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(sel) => write!(f, "{sel}"),
            Self::Value(v) => write!(f, "{v}"),
            Self::Param(name) => write!(f, "@{name}"),
            Self::Cmp { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Self::And(l, r) => write!(f, "({l} AND {r})"),
            Self::Or(l, r) => write!(f, "({l} OR {r})"),
            Self::Not(inner) => write!(f, "(NOT {inner})"),
        }
    }
}
