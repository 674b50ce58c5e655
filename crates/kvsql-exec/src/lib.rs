//! Query execution over snapshots: row readers and join resolution.
//!
//! A query plan is a chain of [`RowReader`]s. Leaves scan a table
//! ([`RawRowReader`]) or literal rows ([`ValuesRowReader`]); inner nodes filter
//! ([`ConditionalRowReader`]) or join ([`JointRowReader`]). Joins are resolved
//! by primary-key point lookups against the joined table, one sub-reader per
//! lookup, since the store has no secondary indexes to hash or merge against.

pub mod cond_reader;
pub mod data_source;
pub mod engine;
pub mod expr;
pub mod join;
pub mod joint_reader;
pub mod options;
pub mod raw_reader;
pub mod row_codec;
pub mod row_reader;
pub mod values_reader;

pub use cond_reader::ConditionalRowReader;
pub use data_source::{DataSource, SeekSpec, TableRef, ValuesSource};
pub use engine::Engine;
pub use expr::{CmpOp, Expr};
pub use join::{JoinSpec, JoinType};
pub use joint_reader::{JoinStats, JointRowReader, JointRowReaderBuilder};
pub use options::EngineOptions;
pub use raw_reader::RawRowReader;
pub use row_reader::{Params, RowReader};
pub use values_reader::ValuesRowReader;
