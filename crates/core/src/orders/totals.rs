//! Order Totals

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{money::rate_of_minor, orders::OrderLine};

/// Errors raised while reconciling order totals.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TotalsError {
    /// An amount was in a different currency from the order.
    #[error("currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch {
        /// Order currency
        expected: &'static str,
        /// Offending currency
        found: &'static str,
    },

    /// Tax rate, shipping or discount was negative.
    #[error("order charges cannot be negative")]
    NegativeCharge,

    /// A total did not fit in minor units.
    #[error("order total overflowed")]
    Overflow,
}

/// Charges applied on top of the order lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Charges<'a> {
    /// Tax rate applied to the subtotal, e.g. `0.2` for 20%.
    pub tax_rate: Decimal,

    /// Shipping fee.
    pub shipping: Money<'a, Currency>,

    /// Requested discount.
    pub discount: Money<'a, Currency>,
}

impl<'a> Charges<'a> {
    /// No tax, shipping or discount.
    pub fn none(currency: &'a Currency) -> Self {
        Self {
            tax_rate: Decimal::ZERO,
            shipping: Money::from_minor(0, currency),
            discount: Money::from_minor(0, currency),
        }
    }
}

/// Reconciled order totals.
///
/// `total = subtotal + tax + shipping - discount` and `total >= 0` always hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals<'a> {
    /// Sum of line totals.
    pub subtotal: Money<'a, Currency>,

    /// Tax on the subtotal.
    pub tax: Money<'a, Currency>,

    /// Shipping fee.
    pub shipping: Money<'a, Currency>,

    /// Discount actually applied, never more than subtotal + tax + shipping.
    pub discount: Money<'a, Currency>,

    /// Amount payable.
    pub total: Money<'a, Currency>,
}

impl<'a> OrderTotals<'a> {
    /// Recompute all totals from the lines and charges.
    ///
    /// Tax is charged on the subtotal before any discount. A discount larger than
    /// the gross amount is reduced so the total never goes below zero.
    ///
    /// # Errors
    ///
    /// Returns an error on currency mismatches, negative charges or overflow.
    pub fn reconcile(
        currency: &'a Currency,
        lines: &[OrderLine<'a>],
        charges: &Charges<'a>,
    ) -> Result<Self, TotalsError> {
        if charges.tax_rate.is_sign_negative() {
            return Err(TotalsError::NegativeCharge);
        }

        let subtotal = lines.iter().try_fold(0_i64, |acc, line| {
            let line_total = ensure_currency(currency, &line.total()?)?;

            acc.checked_add(line_total).ok_or(TotalsError::Overflow)
        })?;

        let shipping = ensure_non_negative(ensure_currency(currency, &charges.shipping)?)?;
        let requested = ensure_non_negative(ensure_currency(currency, &charges.discount)?)?;

        let tax = rate_of_minor(charges.tax_rate, subtotal).ok_or(TotalsError::Overflow)?;

        let gross = subtotal
            .checked_add(tax)
            .and_then(|value| value.checked_add(shipping))
            .ok_or(TotalsError::Overflow)?;

        let discount = requested.min(gross);

        Ok(Self {
            subtotal: Money::from_minor(subtotal, currency),
            tax: Money::from_minor(tax, currency),
            shipping: Money::from_minor(shipping, currency),
            discount: Money::from_minor(discount, currency),
            total: Money::from_minor(gross - discount, currency),
        })
    }

    /// Whether the stored components add up to the total.
    pub fn is_consistent(&self) -> bool {
        let expected = i128::from(self.subtotal.to_minor_units())
            + i128::from(self.tax.to_minor_units())
            + i128::from(self.shipping.to_minor_units())
            - i128::from(self.discount.to_minor_units());

        expected == i128::from(self.total.to_minor_units()) && expected >= 0
    }
}

fn ensure_currency(currency: &Currency, money: &Money<'_, Currency>) -> Result<i64, TotalsError> {
    if money.currency() == currency {
        Ok(money.to_minor_units())
    } else {
        Err(TotalsError::CurrencyMismatch {
            expected: currency.iso_alpha_code,
            found: money.currency().iso_alpha_code,
        })
    }
}

fn ensure_non_negative(minor: i64) -> Result<i64, TotalsError> {
    if minor < 0 {
        Err(TotalsError::NegativeCharge)
    } else {
        Ok(minor)
    }
}
