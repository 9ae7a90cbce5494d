//! Money helpers

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;

/// Errors raised while reading money amounts from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    /// Amount was not in `AMOUNT CURRENCY` form or could not be parsed.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Currency code is not supported.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// Resolve a supported ISO currency code.
///
/// # Errors
///
/// Returns [`AmountError::UnknownCurrency`] for codes outside GBP, USD and EUR.
pub fn currency_from_code(code: &str) -> Result<&'static Currency, AmountError> {
    match code.trim() {
        "GBP" => Ok(iso::GBP),
        "USD" => Ok(iso::USD),
        "EUR" => Ok(iso::EUR),
        other => Err(AmountError::UnknownCurrency(other.to_string())),
    }
}

/// Parse an amount string (e.g. `"2.99 GBP"`) into money.
///
/// # Errors
///
/// Returns an error if the string is not `AMOUNT CURRENCY`, if the amount is
/// not a decimal representable in minor units, or the currency is unknown.
pub fn parse_money(s: &str) -> Result<Money<'static, Currency>, AmountError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AmountError::InvalidAmount(format!(
            "expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let currency = currency_from_code(code)?;

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| AmountError::InvalidAmount(s.to_string()))?;

    let minor = from_major_units(amount, currency)
        .ok_or_else(|| AmountError::InvalidAmount(s.to_string()))?;

    Ok(Money::from_minor(minor, currency))
}

/// Zero in the given currency.
pub fn zero(currency: &Currency) -> Money<'_, Currency> {
    Money::from_minor(0, currency)
}

/// Express money in major units, e.g. 1999 pence as `19.99`.
pub fn to_major_units(money: &Money<'_, Currency>) -> Decimal {
    Decimal::new(money.to_minor_units(), money.currency().exponent)
}

/// Convert a major-unit decimal to minor units, rounding half away from zero.
pub fn from_major_units(amount: Decimal, currency: &Currency) -> Option<i64> {
    let scale = Decimal::from(10_i64.checked_pow(currency.exponent)?);

    amount
        .checked_mul(scale)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Apply a percentage (on a 0-100 scale) to a minor unit amount.
///
/// The result is rounded half away from zero. Returns `None` on overflow.
pub fn percent_of_minor(percent: Decimal, minor: i64) -> Option<i64> {
    Decimal::from(minor)
        .checked_mul(percent)?
        .checked_div(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Apply a rate (e.g. `0.2` for 20%) to a minor unit amount, rounding half away from zero.
pub fn rate_of_minor(rate: Decimal, minor: i64) -> Option<i64> {
    Decimal::from(minor)
        .checked_mul(rate)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}
