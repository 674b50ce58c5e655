//! Inner equi-joins resolved by primary-key point lookups.
//!
//! A [`JointRowReader`] wraps a base reader and an ordered list of joins. For
//! every base row it walks the joins left to right: the join condition names
//! the foreign-key column in the row accumulated so far, that value is encoded
//! as the joined table's primary key, and a point reader fetches the single
//! matching row. A miss drops the base row entirely; a hit is merged into the
//! row with later joins overwriting colliding selectors.
//!
//! The store has no secondary indexes, so this nested loop over point seeks
//! is the only join strategy. Each sub-reader lives for exactly one lookup.

use std::fmt;

use kvsql_error::{KvSqlError, Result};
use kvsql_store::Snapshot;
use kvsql_types::{
    ColSelector, ColumnDescriptors, EncodingMode, Row, encode_selector, encode_value,
};
use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::data_source::{SeekSpec, TableRef};
use crate::engine::Engine;
use crate::join::{JoinSpec, JoinType};
use crate::row_reader::{Params, RowReader};

/// Most plans join a handful of tables.
type Joins = SmallVec<[JoinSpec; 4]>;

/// Counters describing the work a [`JointRowReader`] has done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JoinStats {
    /// Rows pulled from the base reader.
    pub base_rows: u64,
    /// Point lookups issued against joined tables.
    pub lookups: u64,
    /// Base rows dropped because a foreign key had no match.
    pub dangling_skipped: u64,
    /// Rows returned to the caller.
    pub rows_emitted: u64,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects the inputs of a [`JointRowReader`] and validates them.
pub struct JointRowReaderBuilder {
    engine: Engine,
    snapshot: Option<Snapshot>,
    params: Params,
    base: Option<Box<dyn RowReader>>,
    joins: Joins,
}

impl JointRowReaderBuilder {
    #[must_use]
    pub fn snapshot(mut self, snapshot: Snapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    #[must_use]
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn base(mut self, base: impl RowReader + 'static) -> Self {
        self.base = Some(Box::new(base));
        self
    }

    #[must_use]
    pub fn join(mut self, join: JoinSpec) -> Self {
        self.joins.push(join);
        self
    }

    #[must_use]
    pub fn joins(mut self, joins: impl IntoIterator<Item = JoinSpec>) -> Self {
        self.joins.extend(joins);
        self
    }

    /// Validate the joins and build the reader.
    ///
    /// The builder owns the base reader, so it is closed when validation
    /// fails.
    ///
    /// # Errors
    ///
    /// Checked in this order, failing on the first violation:
    /// - [`KvSqlError::IllegalArguments`] without a snapshot, base reader, or
    ///   joins, or with more joins than the engine allows.
    /// - [`KvSqlError::UnsupportedJoinType`] if any join is not `INNER`. No
    ///   table is resolved before this check.
    /// - [`KvSqlError::LimitedJoins`] if any join source is not a table.
    /// - Catalog errors for join tables that do not resolve.
    pub fn build(self) -> Result<JointRowReader> {
        let Self {
            engine,
            snapshot,
            params,
            base,
            joins,
        } = self;
        let Some(mut base) = base else {
            return Err(KvSqlError::IllegalArguments);
        };

        let snapshot = match validate(&engine, snapshot, &joins) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                if let Err(close_err) = base.close() {
                    warn!(error = %close_err, "closing base reader after failed join setup");
                }
                return Err(err);
            }
        };

        debug!(
            joins = joins.len(),
            base_db = %base.implicit_db(),
            base_table = %base.implicit_table(),
            snapshot_tx = snapshot.tx(),
            "joint row reader opened"
        );

        Ok(JointRowReader {
            base,
            joins,
            lookup: Lookup {
                engine,
                snapshot,
                params,
            },
            stats: JoinStats::default(),
            closed: false,
        })
    }
}

fn validate(engine: &Engine, snapshot: Option<Snapshot>, joins: &[JoinSpec]) -> Result<Snapshot> {
    let Some(snapshot) = snapshot else {
        return Err(KvSqlError::IllegalArguments);
    };
    if joins.is_empty() || joins.len() > engine.options().max_joins {
        return Err(KvSqlError::IllegalArguments);
    }
    if joins.iter().any(|j| j.join_type != JoinType::Inner) {
        return Err(KvSqlError::UnsupportedJoinType);
    }
    let table_refs = joins
        .iter()
        .map(|j| j.ds.as_table_ref().ok_or(KvSqlError::LimitedJoins))
        .collect::<Result<SmallVec<[&TableRef; 4]>>>()?;
    for table_ref in table_refs {
        table_ref.referenced_table(engine)?;
    }
    Ok(snapshot)
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Everything a single join lookup needs besides the join and the row.
struct Lookup {
    engine: Engine,
    snapshot: Snapshot,
    params: Params,
}

impl Lookup {
    /// Fetch the row of `join`'s table whose primary key equals the foreign
    /// key found in `row`. `Ok(None)` means the key dangles.
    fn fetch(
        &self,
        join: &JoinSpec,
        implicit_db: &str,
        implicit_table: &str,
        row: &Row,
    ) -> Result<Option<Row>> {
        let table_ref = join.ds.as_table_ref().ok_or(KvSqlError::LimitedJoins)?;
        let table = table_ref.referenced_table(&self.engine)?;
        let pk = table.primary_key();
        let alias = join.ds.alias();

        let fk_sel = join.cond.joint_column_to(pk, alias)?;
        let fk = fk_sel.encode(implicit_db, implicit_table);
        let fk_value = row.get(&fk).ok_or(KvSqlError::InvalidJoinColumn)?;
        if fk_value.is_null() {
            return Ok(None);
        }
        let key = encode_value(fk_value, pk.col_type(), EncodingMode::AsKey)?;

        let seek = SeekSpec::point(ColSelector::qualified(alias, pk.name()), key);
        let mut sub = join
            .ds
            .resolve(&self.engine, &self.snapshot, &self.params, Some(&seek))?;

        trace!(table = %table.name(), alias, fk = %fk_value, "join lookup");

        let read = sub.read();
        let closed = sub.close();
        match (read, closed) {
            (Ok(found), Ok(())) => Ok(found),
            (Err(err), Ok(())) | (Ok(_), Err(err)) => Err(err),
            (Err(err), Err(close_err)) => {
                warn!(error = %close_err, "closing join sub-reader after failed read");
                Err(err)
            }
        }
    }
}

/// Rows of a base reader joined with the rows their foreign keys point to.
///
/// Built with [`JointRowReader::builder`].
pub struct JointRowReader {
    base: Box<dyn RowReader>,
    joins: Joins,
    lookup: Lookup,
    stats: JoinStats,
    closed: bool,
}

impl fmt::Debug for JointRowReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JointRowReader")
            .field("base_table", &self.base.implicit_table())
            .field("joins", &self.joins.len())
            .field("snapshot_tx", &self.lookup.snapshot.tx())
            .field("stats", &self.stats)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl JointRowReader {
    pub fn builder(engine: &Engine) -> JointRowReaderBuilder {
        JointRowReaderBuilder {
            engine: engine.clone(),
            snapshot: None,
            params: Params::new(),
            base: None,
            joins: Joins::new(),
        }
    }

    pub fn stats(&self) -> JoinStats {
        self.stats
    }

    pub fn joins(&self) -> &[JoinSpec] {
        &self.joins
    }
}

impl RowReader for JointRowReader {
    fn implicit_db(&self) -> &str {
        self.base.implicit_db()
    }

    fn implicit_table(&self) -> &str {
        self.base.implicit_table()
    }

    fn columns(&self) -> Result<ColumnDescriptors> {
        let mut columns = self.base.columns()?;
        for join in &self.joins {
            let table_ref = join.ds.as_table_ref().ok_or(KvSqlError::LimitedJoins)?;
            let table = table_ref.referenced_table(&self.lookup.engine)?;
            let alias = join.ds.alias();
            for col in table.columns() {
                columns.insert(
                    encode_selector("", table.db_name(), alias, col.name()),
                    col.col_type(),
                );
            }
        }
        Ok(columns)
    }

    fn read(&mut self) -> Result<Option<Row>> {
        if self.closed {
            return Err(KvSqlError::AlreadyClosed);
        }

        'rows: loop {
            let Some(mut row) = self.base.read()? else {
                return Ok(None);
            };
            self.stats.base_rows += 1;

            for join in &self.joins {
                self.stats.lookups += 1;
                let found = self.lookup.fetch(
                    join,
                    self.base.implicit_db(),
                    self.base.implicit_table(),
                    &row,
                )?;
                match found {
                    Some(joined) => row.merge(joined),
                    None => {
                        self.stats.dangling_skipped += 1;
                        trace!(alias = %join.ds.alias(), "dangling foreign key, row skipped");
                        continue 'rows;
                    }
                }
            }

            self.stats.rows_emitted += 1;
            return Ok(Some(row));
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(KvSqlError::AlreadyClosed);
        }
        self.closed = true;
        debug!(
            base_rows = self.stats.base_rows,
            lookups = self.stats.lookups,
            dangling_skipped = self.stats.dangling_skipped,
            rows_emitted = self.stats.rows_emitted,
            "joint row reader closed"
        );
        self.base.close()
    }
}
