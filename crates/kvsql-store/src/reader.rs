//! Ordered key readers over a snapshot.

use std::ops::Bound;
use std::sync::atomic::Ordering;

use kvsql_error::{KvSqlError, Result};
use tracing::warn;

use crate::store::{Snapshot, StoreInner};

/// Which keys a [`KeyReader`] visits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaderSpec {
    /// Only keys starting with this prefix are returned.
    pub prefix: Vec<u8>,
    /// Start at (or after) this key instead of the first key of the prefix.
    pub seek_key: Option<Vec<u8>>,
    /// Whether `seek_key` itself is included.
    pub inclusive_seek: bool,
}

impl ReaderSpec {
    pub fn prefix(prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            prefix: prefix.into(),
            seek_key: None,
            inclusive_seek: true,
        }
    }

    pub fn with_seek(mut self, seek_key: impl Into<Vec<u8>>, inclusive: bool) -> Self {
        self.seek_key = Some(seek_key.into());
        self.inclusive_seek = inclusive;
        self
    }
}

/// Iterates `(key, value)` pairs visible in a snapshot, ascending by key.
///
/// `read` returns `Ok(None)` once no entries remain. Readers must be closed;
/// one dropped while still open is reported but not counted as closed.
#[derive(Debug)]
pub struct KeyReader {
    snapshot: Snapshot,
    prefix: Vec<u8>,
    lower: Bound<Vec<u8>>,
    exhausted: bool,
    closed: bool,
}

impl KeyReader {
    pub(crate) fn new(snapshot: Snapshot, spec: ReaderSpec) -> Self {
        let lower = match spec.seek_key {
            Some(seek) if seek > spec.prefix => {
                if spec.inclusive_seek {
                    Bound::Included(seek)
                } else {
                    Bound::Excluded(seek)
                }
            }
            _ => Bound::Included(spec.prefix.clone()),
        };
        Self {
            snapshot,
            prefix: spec.prefix,
            lower,
            exhausted: false,
            closed: false,
        }
    }

    /// Next visible entry, or `None` when the prefix is exhausted.
    ///
    /// # Errors
    /// [`KvSqlError::AlreadyClosed`] after [`close`](Self::close).
    pub fn read(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        if self.closed {
            return Err(KvSqlError::AlreadyClosed);
        }
        if self.exhausted {
            return Ok(None);
        }

        let tx = self.snapshot.tx();
        let inner = self.snapshot.store.inner.read();
        let range = inner
            .entries
            .range::<Vec<u8>, _>((self.lower.as_ref(), Bound::Unbounded));

        for (key, versions) in range {
            if !key.starts_with(&self.prefix) {
                break;
            }
            if let Some(version) = StoreInner::visible(versions, tx) {
                let found = (key.clone(), version.value.to_vec());
                self.lower = Bound::Excluded(key.clone());
                return Ok(Some(found));
            }
        }
        drop(inner);

        self.exhausted = true;
        Ok(None)
    }

    /// Release the reader.
    ///
    /// # Errors
    /// [`KvSqlError::AlreadyClosed`] when called twice.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(KvSqlError::AlreadyClosed);
        }
        self.closed = true;
        self.snapshot
            .store
            .readers_closed
            .fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for KeyReader {
    fn drop(&mut self) {
        if !self.closed {
            warn!(
                prefix_len = self.prefix.len(),
                snapshot_tx = self.snapshot.tx(),
                "key reader dropped without close"
            );
        }
    }
}
