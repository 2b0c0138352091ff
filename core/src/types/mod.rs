//! Record types written to and read back from the backends.

mod account_row;
mod ledger_account;

pub use account_row::AccountRow;
pub use ledger_account::LedgerAccount;

/// A record returned by a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    /// A row from one of the SQL backends.
    Row(AccountRow),
    /// An account from the accounting engine.
    Account(LedgerAccount),
}

impl Record {
    pub fn as_row(&self) -> Option<&AccountRow> {
        match self {
            Record::Row(row) => Some(row),
            Record::Account(_) => None,
        }
    }

    pub fn as_account(&self) -> Option<&LedgerAccount> {
        match self {
            Record::Account(account) => Some(account),
            Record::Row(_) => None,
        }
    }
}
