//! Price Fixtures

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::iso::{BRL, Currency, EUR, GBP, USD};

use crate::fixtures::FixtureError;

/// Parse a currency code into its ISO currency.
///
/// # Errors
///
/// Returns `FixtureError::UnknownCurrency` for codes other than EUR, GBP, USD and BRL.
pub fn parse_currency(code: &str) -> Result<&'static Currency, FixtureError> {
    match code.trim() {
        "EUR" => Ok(EUR),
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "BRL" => Ok(BRL),
        other => Err(FixtureError::UnknownCurrency(other.to_string())),
    }
}

/// Parse price string (e.g., "14.93 EUR") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed as a decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = parse_currency(code)?;

    let minor_units = amount
        .checked_mul(Decimal::new(100, 0))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_price_rejects_invalid_format() {
        let result = parse_price("14.93EUR");

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_trailing_parts() {
        let result = parse_price("14.93 EUR extra");

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("2.99 ABC");

        assert!(matches!(result, Err(FixtureError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn parse_price_accepts_eur_and_gbp() -> Result<(), FixtureError> {
        let (eur_minor, eur) = parse_price("14.93 EUR")?;
        let (gbp_minor, gbp) = parse_price("2.50 GBP")?;

        assert_eq!(eur_minor, 1493);
        assert_eq!(eur, EUR);
        assert_eq!(gbp_minor, 250);
        assert_eq!(gbp, GBP);

        Ok(())
    }

    #[test]
    fn parse_currency_trims_whitespace() -> Result<(), FixtureError> {
        assert_eq!(parse_currency(" BRL ")?, BRL);

        Ok(())
    }
}
