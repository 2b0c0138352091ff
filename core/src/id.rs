//! Accounting engine identifiers.
//!
//! The engine keys records by a 128-bit id. Benchmark ids are 64-bit values
//! rendered as a fixed-width hex string and parsed back into a `u128`, which
//! keeps the conversion exact for the full `u64` range.

use std::fmt;

use crate::constants::{CATEGORY_MODULUS, ID_HEX_WIDTH, NAMESPACE_MODULUS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The string is not exactly `ID_HEX_WIDTH` lower-case hex digits.
    Malformed(String),
    /// The 128-bit value does not fit in 64 bits.
    OutOfRange(u128),
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::Malformed(s) => write!(f, "malformed identifier hex {s:?}"),
            IdError::OutOfRange(v) => write!(f, "identifier {v:#x} exceeds 64 bits"),
        }
    }
}

impl std::error::Error for IdError {}

/// Zero-padded, lower-case, 16-digit hex rendering of `value`.
pub fn to_hex(value: u64) -> String {
    format!("{value:0width$x}", width = ID_HEX_WIDTH)
}

/// Parses a string produced by [`to_hex`] into the engine's 128-bit id.
pub fn parse_hex(hex: &str) -> Result<u128, IdError> {
    let well_formed = hex.len() == ID_HEX_WIDTH
        && hex
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if !well_formed {
        return Err(IdError::Malformed(hex.to_string()));
    }
    u128::from_str_radix(hex, 16).map_err(|_| IdError::Malformed(hex.to_string()))
}

/// Encodes a 64-bit benchmark id as a 128-bit engine id.
pub fn encode(value: u64) -> Result<u128, IdError> {
    parse_hex(&to_hex(value))
}

/// Inverse of [`encode`].
pub fn decode(id: u128) -> Result<u64, IdError> {
    u64::try_from(id).map_err(|_| IdError::OutOfRange(id))
}

/// Category code for the record at `index` (`base + offset`).
pub fn category_code(index: u64) -> u16 {
    (index % CATEGORY_MODULUS) as u16
}

/// Reduces a nanosecond timestamp to a per-run identifier base.
pub fn namespace_base(unix_nanos: u64) -> u64 {
    unix_nanos % NAMESPACE_MODULUS
}
