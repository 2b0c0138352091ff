use crate::constants::USER_DATA_FACTOR;

/// Row shape shared by the relational, ledger and embedded backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountRow {
    pub id: i64,
    pub user_data: i64, // id * USER_DATA_FACTOR
    pub timestamp: i64, // unix seconds at insert time
}

impl AccountRow {
    /// Row for the record at `offset`, stamped with `timestamp`.
    pub fn for_offset(offset: u64, timestamp: i64) -> Self {
        let id = offset as i64;
        Self {
            id,
            user_data: id.wrapping_mul(USER_DATA_FACTOR),
            timestamp,
        }
    }

    /// True if `user_data` holds the value derived from `id`.
    pub fn is_consistent(&self) -> bool {
        self.user_data == self.id.wrapping_mul(USER_DATA_FACTOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_offset_derives_user_data() {
        let row = AccountRow::for_offset(42, 1_700_000_000);
        assert_eq!(row.id, 42);
        assert_eq!(row.user_data, 420);
        assert_eq!(row.timestamp, 1_700_000_000);
        assert!(row.is_consistent());
    }

    #[test]
    fn test_is_consistent_detects_mismatch() {
        let row = AccountRow {
            id: 3,
            user_data: 31,
            timestamp: 0,
        };
        assert!(!row.is_consistent());
    }

    #[test]
    fn test_default_row_is_consistent() {
        assert!(AccountRow::default().is_consistent());
    }
}
