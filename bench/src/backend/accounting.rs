//! Accounting engine backend.
//!
//! Records are created and looked up in batches of `workload.batch_size`.
//! The engine is never cleared between runs, so every run draws a fresh
//! identifier base from the clock and writes ids `base..base + count`.

use std::ops::Range;

use bench_core::clock;
use bench_core::id;
use bench_core::types::{LedgerAccount, Record};
use log::debug;

use super::Backend;
use crate::config::Workload;
use crate::error::{BenchError, Result};

const NAME: &str = "TigerBeetle";

/// Request/response surface of the accounting engine client.
pub trait AccountingClient {
    /// Create every account in one request. Any rejected account is an error.
    fn create_accounts(&mut self, accounts: &[LedgerAccount]) -> Result<()>;

    /// Look up accounts by id. Unknown ids are absent from the result.
    fn lookup_accounts(&mut self, ids: &[u128]) -> Result<Vec<LedgerAccount>>;
}

pub struct AccountingBackend<C> {
    client: C,
    fixed_base: Option<u64>,
    base: u64,
    ids: Vec<u128>,
}

impl<C: AccountingClient> AccountingBackend<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            fixed_base: None,
            base: 0,
            ids: Vec::new(),
        }
    }

    /// Use `base` instead of a clock-derived one on every run.
    pub fn with_base(client: C, base: u64) -> Self {
        Self {
            fixed_base: Some(base),
            base,
            ..Self::new(client)
        }
    }

    /// Identifier base of the current run.
    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

impl<C: AccountingClient> Backend for AccountingBackend<C> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn batch_size(&self, workload: &Workload) -> usize {
        workload.batch_size
    }

    fn prepare(&mut self, workload: &Workload) -> Result<()> {
        self.base = self
            .fixed_base
            .unwrap_or_else(|| id::namespace_base(clock::unix_nanos()));
        self.ids = (0..workload.count)
            .map(|offset| id::encode(self.base.wrapping_add(offset)))
            .collect::<std::result::Result<_, _>>()?;
        debug!(
            "{NAME}: run base {} with {} identifiers",
            self.base,
            self.ids.len()
        );
        Ok(())
    }

    fn insert_batch(&mut self, offsets: Range<u64>) -> Result<()> {
        let accounts = offsets
            .map(|offset| LedgerAccount::for_index(self.base, offset))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.client.create_accounts(&accounts)
    }

    fn lookup_batch(&mut self, offsets: Range<u64>) -> Result<Vec<Record>> {
        let ids = usize::try_from(offsets.start)
            .ok()
            .zip(usize::try_from(offsets.end).ok())
            .and_then(|(start, end)| self.ids.get(start..end))
            .ok_or_else(|| {
                BenchError::read(
                    NAME,
                    "identifier slice",
                    format!(
                        "offsets {offsets:?} outside the {} prepared identifiers",
                        self.ids.len()
                    ),
                )
            })?;
        let accounts = self.client.lookup_accounts(ids)?;
        Ok(accounts.into_iter().map(Record::Account).collect())
    }
}
