//! Append-only key-value store with point-in-time snapshots.
//!
//! Every commit appends a new version for each written key under a fresh
//! transaction id. Nothing is ever overwritten in place, so a [`Snapshot`]
//! pinned at transaction `n` keeps seeing exactly the versions committed at or
//! before `n`, however many commits follow.

pub mod reader;
pub mod store;

pub use reader::{KeyReader, ReaderSpec};
pub use store::{KvStore, Snapshot, StoreStats};
