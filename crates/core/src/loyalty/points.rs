//! Points earned on purchases

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::money::to_major_units;

/// Errors raised while working out points for a purchase.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PointsError {
    /// Purchase amount was negative.
    #[error("purchase amount cannot be negative")]
    NegativeAmount,

    /// Multiplier was zero or negative.
    #[error("points multiplier must be positive")]
    InvalidMultiplier,

    /// Result did not fit in a points value.
    #[error("points calculation overflowed")]
    Overflow,
}

/// Points for a purchase: `floor(amount in major units x multiplier)`.
///
/// # Errors
///
/// Returns an error for negative amounts, non-positive multipliers or overflow.
pub fn points_for_purchase(
    amount: &Money<'_, Currency>,
    multiplier: Decimal,
) -> Result<i64, PointsError> {
    if amount.to_minor_units() < 0 {
        return Err(PointsError::NegativeAmount);
    }

    if multiplier <= Decimal::ZERO {
        return Err(PointsError::InvalidMultiplier);
    }

    to_major_units(amount)
        .checked_mul(multiplier)
        .and_then(|points| points.floor().to_i64())
        .ok_or(PointsError::Overflow)
}
