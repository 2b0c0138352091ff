use crate::constants::ACCOUNT_LEDGER;
use crate::id::{self, IdError};

/// The fields of an accounting-engine account the benchmark sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LedgerAccount {
    pub id: u128,
    pub ledger: u32,
    pub code: u16,
}

impl LedgerAccount {
    /// Account for `base + offset` in a run's identifier namespace.
    pub fn for_index(base: u64, offset: u64) -> Result<Self, IdError> {
        let index = base.wrapping_add(offset);
        Ok(Self {
            id: id::encode(index)?,
            ledger: ACCOUNT_LEDGER,
            code: id::category_code(index),
        })
    }
}
