//! TigerBeetle client adapter.
//!
//! The client API is async; each request is driven to completion on a
//! current-thread runtime so the benchmark stays strictly sequential.

use bench_core::types::LedgerAccount;
use tigerbeetle_unofficial as tb;
use tokio::runtime::{Builder, Runtime};

use super::accounting::AccountingClient;
use crate::error::{BenchError, Result};

const NAME: &str = "TigerBeetle";

pub struct TigerBeetleClient {
    runtime: Runtime,
    client: tb::Client,
}

impl TigerBeetleClient {
    /// Open a client for `cluster_id` bound to `address` (`"3000"` or `"host:port"`).
    pub fn connect(cluster_id: u128, address: &str) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .build()
            .map_err(|e| BenchError::connect(NAME, e))?;
        let client = tb::Client::new(cluster_id, address)
            .map_err(|e| BenchError::connect(NAME, e.to_string()))?;
        Ok(Self { runtime, client })
    }
}

fn to_engine(account: &LedgerAccount) -> tb::Account {
    tb::Account::new(account.id, account.ledger, account.code)
}

fn from_engine(account: &tb::Account) -> LedgerAccount {
    LedgerAccount {
        id: account.id(),
        ledger: account.ledger(),
        code: account.code(),
    }
}

impl AccountingClient for TigerBeetleClient {
    fn create_accounts(&mut self, accounts: &[LedgerAccount]) -> Result<()> {
        let batch = accounts.iter().map(to_engine).collect::<Vec<_>>();
        self.runtime
            .block_on(self.client.create_accounts(batch))
            .map_err(|e| BenchError::write(NAME, "create accounts", e.to_string()))
    }

    fn lookup_accounts(&mut self, ids: &[u128]) -> Result<Vec<LedgerAccount>> {
        let accounts = self
            .runtime
            .block_on(self.client.lookup_accounts(ids.to_vec()))
            .map_err(|e| BenchError::read(NAME, "lookup accounts", e.to_string()))?;
        Ok(accounts.iter().map(from_engine).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_core::{clock, id};

    #[test]
    fn account_fields_survive_conversion() {
        for index in [0u64, 255, 65_534, 65_535, u64::MAX] {
            let account = LedgerAccount::for_index(index, 0).unwrap();
            let engine = to_engine(&account);
            assert_eq!(engine.id(), id::encode(index).unwrap());
            assert_eq!(engine.ledger(), 1);
            assert_eq!(engine.code(), (index % 65_535) as u16);
            assert_eq!(from_engine(&engine), account);
        }
    }

    #[test]
    #[ignore = "needs a running TigerBeetle"]
    fn live_round_trip() {
        let address = std::env::var("BENCH_ENGINE_ADDRESS")
            .unwrap_or_else(|_| crate::config::DEFAULT_ENGINE_ADDRESS.to_string());
        let mut client = TigerBeetleClient::connect(0, &address).expect("TigerBeetle reachable");

        let base = id::namespace_base(clock::unix_nanos());
        let accounts: Vec<LedgerAccount> = (0..61)
            .map(|i| LedgerAccount::for_index(base, i).unwrap())
            .collect();
        client.create_accounts(&accounts[..60]).unwrap();
        client.create_accounts(&accounts[60..]).unwrap();

        let ids: Vec<u128> = accounts.iter().map(|a| a.id).collect();
        let found = client.lookup_accounts(&ids).unwrap();
        assert_eq!(found.len(), 61);
        for (i, account) in found.iter().enumerate() {
            let index = base + i as u64;
            assert_eq!(account.id, id::encode(index).unwrap());
            assert_eq!(account.ledger, 1);
            assert_eq!(account.code, (index % 65_535) as u16);
        }

        // Creating the same ids again is rejected by the engine.
        assert!(matches!(
            client.create_accounts(&accounts[..1]),
            Err(BenchError::Write { .. })
        ));
    }
}
