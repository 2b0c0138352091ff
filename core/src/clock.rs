//! Wall-clock helpers used when stamping records.

use chrono::Utc;

/// Current Unix time in whole seconds.
pub fn unix_seconds() -> i64 {
    Utc::now().timestamp()
}

/// Current Unix time in nanoseconds. Saturates outside chrono's
/// representable range (years 1677..2262).
pub fn unix_nanos() -> u64 {
    Utc::now()
        .timestamp_nanos_opt()
        .map(|n| n.max(0) as u64)
        .unwrap_or(u64::MAX)
}
