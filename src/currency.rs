//! Currency field parsing and dollar/cent conversion.
//!
//! Posting amounts are carried as floating-point dollars. Totals are
//! converted to whole cents by biasing the absolute value by half a cent
//! and truncating, separately for the debit and credit legs, which is the
//! convention existing ACH tooling uses to fill control records.

use crate::error::{NachaError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Number of implied decimal places in ACH amount fields.
pub const CENTS_SCALE: u32 = 2;

/// Parses a fixed-width currency field.
///
/// Thousands separators (`,`) are removed and surrounding spaces trimmed
/// before the remainder is parsed as a base-10 decimal numeral. The value
/// is returned as-is: callers apply their own implied-decimal convention.
///
/// # Examples
///
/// ```
/// use nacha_ach::currency::parse_currency;
///
/// assert_eq!(parse_currency(b"0000012345").unwrap(), 12345.0);
/// assert_eq!(parse_currency(b" 1,234.50 ").unwrap(), 1234.5);
/// assert!(parse_currency(b"12A45").is_err());
/// ```
pub fn parse_currency(field: &[u8]) -> Result<f64> {
    let cleaned: Vec<u8> = field.iter().copied().filter(|&b| b != b',').collect();
    let text = std::str::from_utf8(&cleaned)
        .map_err(|_| NachaError::invalid_field("amount", field))?
        .trim_matches(' ');
    let value = Decimal::from_str(text).map_err(|_| NachaError::invalid_field("amount", field))?;
    value
        .to_f64()
        .ok_or_else(|| NachaError::invalid_field("amount", field))
}

/// Converts a non-negative debit amount in dollars to whole cents.
pub fn debit_cents(amount: f64) -> u64 {
    ((amount + 0.005) * 100.0) as u64
}

/// Converts a negative credit amount in dollars to whole cents of magnitude.
pub fn credit_cents(amount: f64) -> u64 {
    ((amount - 0.005) * -100.0) as u64
}

/// Exact dollar value of a cent count, always with two decimal places.
pub fn cents_to_dollars(cents: u64) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(cents), CENTS_SCALE)
}
