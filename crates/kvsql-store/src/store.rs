//! Versioned store and snapshots.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use kvsql_error::{KvSqlError, Result};
use parking_lot::RwLock;
use tracing::debug;

use crate::reader::{KeyReader, ReaderSpec};

/// One committed version of a key.
#[derive(Debug, Clone)]
pub(crate) struct Version {
    pub(crate) tx: u64,
    pub(crate) value: Arc<[u8]>,
}

#[derive(Debug, Default)]
pub(crate) struct StoreInner {
    /// Versions per key, ascending by transaction id.
    pub(crate) entries: BTreeMap<Vec<u8>, Vec<Version>>,
    pub(crate) last_tx: u64,
}

impl StoreInner {
    /// Latest version of `versions` visible at `tx`.
    pub(crate) fn visible(versions: &[Version], tx: u64) -> Option<&Version> {
        versions.iter().rev().find(|v| v.tx <= tx)
    }
}

/// Counters for key readers opened against the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub readers_opened: u64,
    pub readers_closed: u64,
}

/// In-memory append-only store.
///
/// Internally synchronized; share it behind an [`Arc`].
#[derive(Debug, Default)]
pub struct KvStore {
    pub(crate) inner: RwLock<StoreInner>,
    pub(crate) readers_opened: AtomicU64,
    pub(crate) readers_closed: AtomicU64,
}

impl KvStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Append `entries` atomically as one transaction.
    ///
    /// # Errors
    /// [`KvSqlError::IllegalArguments`] when `entries` is empty or contains an
    /// empty key.
    pub fn commit(&self, entries: Vec<(Vec<u8>, Vec<u8>)>) -> Result<u64> {
        if entries.is_empty() || entries.iter().any(|(k, _)| k.is_empty()) {
            return Err(KvSqlError::IllegalArguments);
        }

        let mut inner = self.inner.write();
        let tx = inner.last_tx + 1;
        let count = entries.len();
        for (key, value) in entries {
            inner.entries.entry(key).or_default().push(Version {
                tx,
                value: value.into(),
            });
        }
        inner.last_tx = tx;
        drop(inner);

        debug!(tx, entries = count, "transaction committed");
        Ok(tx)
    }

    /// Id of the most recently committed transaction (0 when empty).
    pub fn last_committed_tx(&self) -> u64 {
        self.inner.read().last_tx
    }

    /// Snapshot pinned at the latest committed transaction.
    pub fn snapshot(self: &Arc<Self>) -> Snapshot {
        let tx = self.last_committed_tx();
        Snapshot {
            store: Arc::clone(self),
            tx,
        }
    }

    /// Snapshot pinned at an earlier transaction.
    ///
    /// # Errors
    /// [`KvSqlError::IllegalArguments`] when `tx` has not been committed yet.
    pub fn snapshot_at(self: &Arc<Self>, tx: u64) -> Result<Snapshot> {
        if tx > self.last_committed_tx() {
            return Err(KvSqlError::IllegalArguments);
        }
        Ok(Snapshot {
            store: Arc::clone(self),
            tx,
        })
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            readers_opened: self.readers_opened.load(Ordering::Relaxed),
            readers_closed: self.readers_closed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of the store as of one transaction.
///
/// Cheap to clone; clones share the same pinned transaction.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub(crate) store: Arc<KvStore>,
    tx: u64,
}

impl Snapshot {
    /// Transaction id the snapshot is pinned at.
    pub fn tx(&self) -> u64 {
        self.tx
    }

    /// Value of `key` as of this snapshot.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let inner = self.store.inner.read();
        inner
            .entries
            .get(key)
            .and_then(|versions| StoreInner::visible(versions, self.tx))
            .map(|v| v.value.to_vec())
    }

    /// Open an ordered reader over the keys selected by `spec`.
    pub fn reader(&self, spec: ReaderSpec) -> KeyReader {
        self.store.readers_opened.fetch_add(1, Ordering::Relaxed);
        KeyReader::new(self.clone(), spec)
    }
}
