//! Core data model shared by the storage, catalog, and execution crates.
//!
//! - [`value`]: SQL types and the typed value variant stored in rows.
//! - [`selector`]: canonical column addressing inside a row.
//! - [`codec`]: order-preserving key encoding and length-prefixed value encoding.
//! - [`row`]: rows and column descriptor sets.

pub mod codec;
pub mod row;
pub mod selector;
pub mod value;

pub use codec::{EncodingMode, decode_value, encode_value};
pub use row::{ColumnDescriptors, Row};
pub use selector::{ColSelector, decode_selector, encode_selector};
pub use value::{SqlType, TypedValue};
