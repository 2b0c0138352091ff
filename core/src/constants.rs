//! Workload and record constants shared by every backend.

/// Number of records written and then read back per backend.
pub const DEFAULT_INSERT_COUNT: u64 = 1000;

/// Largest group of records the accounting engine receives in one request.
pub const DEFAULT_BATCH_SIZE: usize = 60;

/// Row stores are driven one record per round trip.
pub const SINGLE_ROW_BATCH: usize = 1;

/// `user_data` column value is `id * USER_DATA_FACTOR`.
pub const USER_DATA_FACTOR: i64 = 10;

/// Grouping tag written into every accounting record.
pub const ACCOUNT_LEDGER: u32 = 1;

/// Category codes wrap at this value so they fit the engine's 16-bit field.
pub const CATEGORY_MODULUS: u64 = 65_535;

/// Per-run identifier bases are drawn from `[0, NAMESPACE_MODULUS)`.
pub const NAMESPACE_MODULUS: u64 = 1_000_000_000;

/// Width of the zero-padded hex rendering of a 64-bit identifier.
pub const ID_HEX_WIDTH: usize = 16;
