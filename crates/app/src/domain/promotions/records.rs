//! Promotions Records

use std::num::TryFromIntError;

use hearth::promotions::{Promotion, budget::UsageBudget, scope::PromotionScope};
use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};

use crate::{
    domain::{
        customers::CustomerUuid, orders::records::OrderUuid,
        promotions::data::PromotionDiscount,
    },
    uuids::TypedUuid,
};

/// Promotion UUID
pub type PromotionUuid = TypedUuid<PromotionRecord>;

/// Promotion Usage UUID
pub type PromotionUsageUuid = TypedUuid<PromotionUsageRecord>;

/// Promotion Record
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionRecord {
    pub uuid: PromotionUuid,
    pub code: Option<String>,
    pub discount: PromotionDiscount,
    pub minimum_order_value: Option<u64>,
    pub maximum_discount: Option<u64>,
    pub usage_limit: Option<u32>,
    pub usage_count: u32,
    pub starts_at: Timestamp,
    pub ends_at: Option<Timestamp>,
    pub active: bool,
    pub scope: PromotionScope,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PromotionRecord {
    /// Calculator view of the promotion, amounts in `currency`.
    ///
    /// # Errors
    ///
    /// Returns an error when a stored amount does not fit in minor units.
    pub fn to_promotion(
        &self,
        currency: &'static Currency,
    ) -> Result<Promotion<'static>, TryFromIntError> {
        let money = |minor: u64| -> Result<Money<'static, Currency>, TryFromIntError> {
            Ok(Money::from_minor(i64::try_from(minor)?, currency))
        };

        let mut promotion = Promotion::new(self.discount.to_discount(currency)?, self.starts_at)
            .with_budget(UsageBudget {
                limit: self.usage_limit,
                used: self.usage_count,
            })
            .with_active(self.active)
            .scoped_to(self.scope.clone());

        if let Some(code) = &self.code {
            promotion = promotion.with_code(code.clone());
        }

        if let Some(minimum) = self.minimum_order_value {
            promotion = promotion.with_minimum_order_value(money(minimum)?);
        }

        if let Some(maximum) = self.maximum_discount {
            promotion = promotion.with_maximum_discount(money(maximum)?);
        }

        if let Some(ends_at) = self.ends_at {
            promotion = promotion.ending_at(ends_at);
        }

        Ok(promotion)
    }
}

/// Promotion Usage Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionUsageRecord {
    pub uuid: PromotionUsageUuid,
    pub promotion: PromotionUuid,
    pub customer: CustomerUuid,
    pub order: OrderUuid,
    pub discount_amount: u64,
    pub used_at: Timestamp,
    pub released_at: Option<Timestamp>,
}
