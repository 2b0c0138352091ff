//! The `Backend` trait and its implementations.
//!
//! - [`relational::PostgresBackend`] — PostgreSQL, one row per round trip
//! - [`ledger::ImmudbBackend`] — immudb through its PostgreSQL wire endpoint
//! - [`embedded::SqliteBackend`] — in-process SQLite, same contract as PostgreSQL
//! - [`accounting::AccountingBackend`] — batched account creation and lookup

pub mod accounting;
pub mod embedded;
pub mod ledger;
pub mod relational;
#[cfg(feature = "tigerbeetle")]
pub mod tigerbeetle;

use std::ops::Range;

use bench_core::types::Record;

use crate::config::Workload;
use crate::error::Result;

/// One persistence target driven by the runner.
///
/// The runner calls `prepare` once, then `insert_batch` for every batch of
/// offsets in `[0, workload.count)`, then `lookup_batch` for the same
/// batches, then `teardown`. Offsets are positions in the run; each backend
/// maps them to its own identifiers.
pub trait Backend {
    /// Human-readable name for reports.
    fn name(&self) -> &'static str;

    /// Largest number of offsets passed to one `insert_batch`/`lookup_batch`.
    fn batch_size(&self, workload: &Workload) -> usize;

    /// Create or clear whatever the run needs before the insert phase.
    fn prepare(&mut self, workload: &Workload) -> Result<()>;

    /// Write the records for `offsets`.
    fn insert_batch(&mut self, offsets: Range<u64>) -> Result<()>;

    /// Read back the records for `offsets`. Records a backend tolerates as
    /// missing are left out of the result.
    fn lookup_batch(&mut self, offsets: Range<u64>) -> Result<Vec<Record>>;

    /// Release resources held for the run.
    fn teardown(&mut self) -> Result<()> {
        Ok(())
    }
}
