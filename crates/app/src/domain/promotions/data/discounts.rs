//! Promotion Discounts

use hearth::promotions::{Discount, DiscountKind};
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};

/// Discount Data, amounts in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionDiscount {
    Percentage { percentage: Decimal },
    FixedAmount { amount: u64 },
    BuyOneGetOne,
    FreeShipping,
}

impl PromotionDiscount {
    #[must_use]
    pub const fn kind(&self) -> DiscountKind {
        match self {
            Self::Percentage { .. } => DiscountKind::Percentage,
            Self::FixedAmount { .. } => DiscountKind::FixedAmount,
            Self::BuyOneGetOne => DiscountKind::BuyOneGetOne,
            Self::FreeShipping => DiscountKind::FreeShipping,
        }
    }

    /// Percentage column value.
    #[must_use]
    pub const fn percentage(&self) -> Option<Decimal> {
        match self {
            Self::Percentage { percentage } => Some(*percentage),
            Self::FixedAmount { .. } | Self::BuyOneGetOne | Self::FreeShipping => None,
        }
    }

    /// Amount column value.
    #[must_use]
    pub const fn amount(&self) -> Option<u64> {
        match self {
            Self::FixedAmount { amount } => Some(*amount),
            Self::Percentage { .. } | Self::BuyOneGetOne | Self::FreeShipping => None,
        }
    }

    /// Build from the stored kind and value columns.
    ///
    /// Returns `None` when the value the kind needs is missing.
    #[must_use]
    pub fn from_columns(
        kind: DiscountKind,
        percentage: Option<Decimal>,
        amount: Option<u64>,
    ) -> Option<Self> {
        match kind {
            DiscountKind::Percentage => percentage.map(|percentage| Self::Percentage { percentage }),
            DiscountKind::FixedAmount => amount.map(|amount| Self::FixedAmount { amount }),
            DiscountKind::BuyOneGetOne => Some(Self::BuyOneGetOne),
            DiscountKind::FreeShipping => Some(Self::FreeShipping),
        }
    }

    /// Calculator discount in `currency`.
    ///
    /// # Errors
    ///
    /// Returns an error when a fixed amount does not fit in minor units.
    pub fn to_discount(
        self,
        currency: &'static Currency,
    ) -> Result<Discount<'static>, std::num::TryFromIntError> {
        Ok(match self {
            Self::Percentage { percentage } => Discount::Percentage(percentage),
            Self::FixedAmount { amount } => {
                Discount::FixedAmount(Money::from_minor(i64::try_from(amount)?, currency))
            }
            Self::BuyOneGetOne => Discount::BuyOneGetOne,
            Self::FreeShipping => Discount::FreeShipping,
        })
    }
}
