//! Promotions Data

use hearth::promotions::scope::PromotionScope;
use jiff::Timestamp;

use crate::domain::{
    customers::CustomerUuid,
    orders::records::OrderUuid,
    promotions::records::{PromotionUsageRecord, PromotionUuid},
};

pub mod discounts;

pub use discounts::PromotionDiscount;

/// New Promotion Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewPromotion {
    pub uuid: PromotionUuid,
    pub code: Option<String>,
    pub discount: PromotionDiscount,
    pub minimum_order_value: Option<u64>,
    pub maximum_discount: Option<u64>,
    pub usage_limit: Option<u32>,
    pub starts_at: Timestamp,
    pub ends_at: Option<Timestamp>,
    pub active: bool,
    pub scope: PromotionScope,
}

impl NewPromotion {
    /// Active, unlimited, order-wide promotion with no end date.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        discount: PromotionDiscount,
        starts_at: Timestamp,
    ) -> Self {
        Self {
            uuid: PromotionUuid::new(),
            code: Some(code.into()),
            discount,
            minimum_order_value: None,
            maximum_discount: None,
            usage_limit: None,
            starts_at,
            ends_at: None,
            active: true,
            scope: PromotionScope::Order,
        }
    }
}

/// Request to use a promotion against an order total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyPromotion {
    pub code: String,
    pub customer: CustomerUuid,
    pub order: OrderUuid,
    /// Order total in minor units.
    pub order_total: u64,
}

/// Outcome of a successful promotion use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedPromotion {
    pub usage: PromotionUsageRecord,
    pub discount_amount: u64,
    pub final_amount: u64,
}
