//! Order Records

use std::num::TryFromIntError;

use hearth::orders::{OrderLine, OrderStatus};
use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};

use crate::{
    domain::{
        customers::CustomerUuid, products::records::ProductUuid,
        promotions::records::PromotionUuid,
    },
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Order Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub customer: CustomerUuid,
    pub status: OrderStatus,
    pub subtotal: u64,
    pub tax: u64,
    pub shipping: u64,
    pub discount: u64,
    pub total: u64,
    pub promotion: Option<PromotionUuid>,
    pub items: Vec<OrderItemRecord>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OrderRecord {
    /// Calculator lines for the items, amounts in `currency`.
    ///
    /// # Errors
    ///
    /// Returns an error when a stored price does not fit in minor units.
    pub fn lines(
        &self,
        currency: &'static Currency,
    ) -> Result<Vec<OrderLine<'static>>, TryFromIntError> {
        self.items.iter().map(|item| item.to_line(currency)).collect()
    }
}

/// Order Item UUID
pub type OrderItemUuid = TypedUuid<OrderItemRecord>;

/// Order Item Record
///
/// `unit_price` is the product's price when the item was added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemRecord {
    pub uuid: OrderItemUuid,
    pub order: OrderUuid,
    pub product: ProductUuid,
    pub category: Option<String>,
    pub quantity: u32,
    pub unit_price: u64,
    pub total_price: u64,
    pub created_at: Timestamp,
}

impl OrderItemRecord {
    /// Calculator line for the item.
    ///
    /// # Errors
    ///
    /// Returns an error when the unit price does not fit in minor units.
    pub fn to_line(
        &self,
        currency: &'static Currency,
    ) -> Result<OrderLine<'static>, TryFromIntError> {
        Ok(OrderLine::new(
            self.product.into_uuid(),
            self.quantity,
            Money::from_minor(i64::try_from(self.unit_price)?, currency),
        )
        .with_category(self.category.clone()))
    }
}
