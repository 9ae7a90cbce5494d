//! Discounts

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    money::percent_of_minor,
    orders::{OrderLine, TotalsError},
    promotions::{Discount, Promotion},
};

/// Errors specific to discount calculations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// An amount on the promotion or policy was in a different currency from the order.
    #[error("currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch {
        /// Order currency
        expected: &'static str,
        /// Offending currency
        found: &'static str,
    },

    /// The order total was negative.
    #[error("order total cannot be negative")]
    NegativeTotal,

    /// Percentage calculation could not be represented in minor units.
    #[error("percentage calculation overflowed")]
    PercentConversion,

    /// Errors bubbled up from summing order lines.
    #[error(transparent)]
    Totals(#[from] TotalsError),
}

/// Settings the discount calculation depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscountPolicy<'a> {
    /// Amount a free-shipping promotion takes off the order.
    pub free_shipping_estimate: Money<'a, Currency>,
}

/// Result of evaluating a promotion against an order total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiscountOutcome<'a> {
    /// The promotion applies and takes this amount off.
    Applied(Money<'a, Currency>),

    /// The order total is under the promotion's minimum order value.
    BelowMinimum {
        /// Minimum order value required.
        minimum: Money<'a, Currency>,
    },
}

impl<'a> DiscountOutcome<'a> {
    /// Discount amount, zero when the minimum was not met.
    pub fn amount(&self) -> Money<'a, Currency> {
        match self {
            Self::Applied(amount) => *amount,
            Self::BelowMinimum { minimum } => Money::from_minor(0, minimum.currency()),
        }
    }
}

/// Evaluate a promotion against an order total.
///
/// Validity (active flag, window, usage limit) is not checked here; see
/// [`Promotion::check_validity`].
///
/// The discount is:
/// - percentage: `order_total x value / 100`, rounded half away from zero;
/// - fixed amount: the amount;
/// - buy one get one: half of `order_total`;
/// - free shipping: the policy's shipping estimate;
///
/// then capped at the promotion's maximum discount and at `order_total`.
///
/// # Errors
///
/// Returns an error if any amount is in another currency, the total is negative,
/// or a percentage cannot be represented in minor units.
pub fn evaluate_discount<'a>(
    promotion: &Promotion<'a>,
    order_total: &Money<'a, Currency>,
    policy: &DiscountPolicy<'a>,
) -> Result<DiscountOutcome<'a>, DiscountError> {
    let currency = order_total.currency();
    let total = order_total.to_minor_units();

    if total < 0 {
        return Err(DiscountError::NegativeTotal);
    }

    if let Some(minimum) = promotion.minimum_order_value
        && total < minor_in(currency, &minimum)?
    {
        return Ok(DiscountOutcome::BelowMinimum { minimum });
    }

    let raw = match promotion.discount {
        Discount::Percentage(percent) => percent_discount(percent, total)?,
        Discount::FixedAmount(amount) => minor_in(currency, &amount)?,
        Discount::BuyOneGetOne => percent_discount(Decimal::from(50), total)?,
        Discount::FreeShipping => minor_in(currency, &policy.free_shipping_estimate)?,
    };

    let capped = match promotion.maximum_discount {
        Some(maximum) => raw.min(minor_in(currency, &maximum)?),
        None => raw,
    };

    Ok(DiscountOutcome::Applied(Money::from_minor(
        capped.clamp(0, total),
        currency,
    )))
}

/// Calculate the discount a promotion gives on an order total.
///
/// Totals under the minimum order value silently yield zero.
///
/// # Errors
///
/// See [`evaluate_discount`].
pub fn calculate_discount<'a>(
    promotion: &Promotion<'a>,
    order_total: &Money<'a, Currency>,
    policy: &DiscountPolicy<'a>,
) -> Result<Money<'a, Currency>, DiscountError> {
    evaluate_discount(promotion, order_total, policy).map(|outcome| outcome.amount())
}

/// Sum the lines a promotion's scope covers.
///
/// # Errors
///
/// Returns an error when a line is in another currency or the sum overflows.
pub fn eligible_total<'a>(
    promotion: &Promotion<'_>,
    currency: &'a Currency,
    lines: &[OrderLine<'a>],
) -> Result<Money<'a, Currency>, DiscountError> {
    let minor = lines
        .iter()
        .filter(|line| promotion.scope.matches(line))
        .try_fold(0_i64, |acc, line| {
            let line_total = minor_in(currency, &line.total()?)?;

            acc.checked_add(line_total)
                .ok_or(DiscountError::Totals(TotalsError::Overflow))
        })?;

    Ok(Money::from_minor(minor, currency))
}

/// Evaluate a promotion against the order lines its scope covers.
///
/// Returns `None` when the scope covers none of the lines, so there is
/// nothing for the promotion to discount.
///
/// # Errors
///
/// See [`eligible_total`] and [`evaluate_discount`].
pub fn evaluate_scoped_discount<'a>(
    promotion: &Promotion<'a>,
    currency: &'a Currency,
    lines: &[OrderLine<'a>],
    policy: &DiscountPolicy<'a>,
) -> Result<Option<DiscountOutcome<'a>>, DiscountError> {
    if !lines.iter().any(|line| promotion.scope.matches(line)) {
        return Ok(None);
    }

    let total = eligible_total(promotion, currency, lines)?;

    evaluate_discount(promotion, &total, policy).map(Some)
}

fn percent_discount(percent: Decimal, total: i64) -> Result<i64, DiscountError> {
    percent_of_minor(percent, total).ok_or(DiscountError::PercentConversion)
}

fn minor_in(currency: &Currency, money: &Money<'_, Currency>) -> Result<i64, DiscountError> {
    if money.currency() == currency {
        Ok(money.to_minor_units())
    } else {
        Err(DiscountError::CurrencyMismatch {
            expected: currency.iso_alpha_code,
            found: money.currency().iso_alpha_code,
        })
    }
}
