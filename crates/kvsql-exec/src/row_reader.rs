//! The row reader contract shared by every plan node.

use std::collections::BTreeMap;

use kvsql_error::Result;
use kvsql_types::{ColumnDescriptors, Row, TypedValue};

/// A lazily evaluated stream of rows.
///
/// `read` returns `Ok(None)` once the stream is exhausted; any `Err` is fatal
/// for the stream. Every reader must be closed exactly once. A second `close`,
/// or a `read` after `close`, fails with
/// [`KvSqlError::AlreadyClosed`](kvsql_error::KvSqlError::AlreadyClosed).
pub trait RowReader: Send {
    /// Database that unqualified selectors resolve against.
    fn implicit_db(&self) -> &str;

    /// Table (or alias) that unqualified selectors resolve against.
    fn implicit_table(&self) -> &str;

    /// Selector → declared type for every column the reader produces.
    /// Callable before the first `read`.
    fn columns(&self) -> Result<ColumnDescriptors>;

    fn read(&mut self) -> Result<Option<Row>>;

    fn close(&mut self) -> Result<()>;
}

impl<R: RowReader + ?Sized> RowReader for Box<R> {
    fn implicit_db(&self) -> &str {
        (**self).implicit_db()
    }

    fn implicit_table(&self) -> &str {
        (**self).implicit_table()
    }

    fn columns(&self) -> Result<ColumnDescriptors> {
        (**self).columns()
    }

    fn read(&mut self) -> Result<Option<Row>> {
        (**self).read()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Named query parameters. Names are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, TypedValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: TypedValue) -> Option<TypedValue> {
        self.0.insert(name.to_ascii_lowercase(), value)
    }

    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.0.get(&name.to_ascii_lowercase())
    }

    pub fn with(mut self, name: &str, value: impl Into<TypedValue>) -> Self {
        self.insert(name, value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<(S, TypedValue)> for Params {
    fn from_iter<I: IntoIterator<Item = (S, TypedValue)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name.as_ref(), value);
        }
        params
    }
}
