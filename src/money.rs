//! Decimal-dollar to cent conversion.
//!
//! Clients send money as decimal dollars in JSON; everything persisted or sent
//! to Stripe is integer cents. The rounding rule is pinned to half-away-from-zero
//! at two decimal places, so 24.995 becomes 2500 cents.

use rust_decimal::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};

pub fn cents_from_dollars(dollars: f64) -> i64 {
    let Some(dec) = Decimal::from_f64(dollars) else {
        return 0;
    };
    let rounded = dec.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    (rounded * Decimal::from(100)).to_i64().unwrap_or(0)
}

pub fn format_usd(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(cents_from_dollars(24.995), 2500);
        assert_eq!(cents_from_dollars(24.994), 2499);
        assert_eq!(cents_from_dollars(19.99), 1999);
        assert_eq!(cents_from_dollars(9.99), 999);
        assert_eq!(cents_from_dollars(59.96), 5996);
        assert_eq!(cents_from_dollars(0.0), 0);
    }

    #[test]
    fn non_finite_input_maps_to_zero() {
        assert_eq!(cents_from_dollars(f64::NAN), 0);
        assert_eq!(cents_from_dollars(f64::INFINITY), 0);
    }

    #[test]
    fn formats_cents_as_dollars() {
        assert_eq!(format_usd(5996), "59.96");
        assert_eq!(format_usd(699), "6.99");
        assert_eq!(format_usd(0), "0.00");
        assert_eq!(format_usd(100), "1.00");
        assert_eq!(format_usd(5), "0.05");
    }
}
