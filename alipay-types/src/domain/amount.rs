//! Fixed-point amount helpers.
//!
//! Amounts are carried as [`Decimal`] end to end; the gateway exchanges
//! them as strings with two fractional digits.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits used on the wire and for comparisons.
pub const AMOUNT_PRECISION: u32 = 2;

/// Largest order amount (and fee) a transaction may carry, so that
/// `amount + fees` always fits in a [`Decimal`].
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0); // 1_000_000_000_000

/// Rounds half away from zero at [`AMOUNT_PRECISION`].
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(AMOUNT_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount with exactly two fractional digits (`"100.00"`).
pub fn format_amount(value: Decimal) -> String {
    let mut rounded = round_amount(value);
    rounded.rescale(AMOUNT_PRECISION);
    rounded.to_string()
}

/// Parses an amount received from the gateway.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim()).ok()
}

/// Compares two amounts after rounding both to two decimal places.
pub fn amounts_match(a: Decimal, b: Decimal) -> bool {
    round_amount(a) == round_amount(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_pads_to_two_places() {
        assert_eq!(format_amount(dec!(100)), "100.00");
        assert_eq!(format_amount(dec!(3.5)), "3.50");
        assert_eq!(format_amount(dec!(2.345)), "2.35");
    }

    #[test]
    fn test_parse_accepts_wire_format() {
        assert_eq!(parse_amount("99.00"), Some(dec!(99)));
        assert_eq!(parse_amount(" 12.3 "), Some(dec!(12.3)));
        assert_eq!(parse_amount("12,30"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_fixed_point_comparison() {
        assert!(amounts_match(dec!(100.001), dec!(100)));
        assert!(amounts_match(dec!(10.005), dec!(10.01)));
        assert!(!amounts_match(dec!(99.99), dec!(100)));
    }
}
