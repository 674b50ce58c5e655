//! Rows and column descriptor sets.

use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::value::{SqlType, TypedValue};

/// Shape of the rows a reader produces: canonical selector → declared type.
pub type ColumnDescriptors = BTreeMap<String, SqlType>;

/// One row, keyed by canonical selector.
///
/// Selectors are unique by construction; inserting an existing selector
/// replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: BTreeMap<String, TypedValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `selector` to `value`, returning the previous value if any.
    pub fn insert(&mut self, selector: impl Into<String>, value: TypedValue) -> Option<TypedValue> {
        self.values.insert(selector.into(), value)
    }

    pub fn get(&self, selector: &str) -> Option<&TypedValue> {
        self.values.get(selector)
    }

    pub fn contains(&self, selector: &str) -> bool {
        self.values.contains_key(selector)
    }

    /// Move every value of `other` into `self`; `other` wins on collision.
    pub fn merge(&mut self, other: Self) {
        self.values.extend(other.values);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, TypedValue> {
        self.values.iter()
    }

    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl FromIterator<(String, TypedValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, TypedValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Row {
    type Item = (String, TypedValue);
    type IntoIter = btree_map::IntoIter<String, TypedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = (&'a String, &'a TypedValue);
    type IntoIter = btree_map::Iter<'a, String, TypedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
