//! Order Data

use crate::domain::{
    customers::CustomerUuid,
    orders::records::{OrderItemUuid, OrderUuid},
    products::records::ProductUuid,
};

/// New Order Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub customer: CustomerUuid,
    pub items: Vec<NewOrderItem>,
}

/// New Order Item Data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderItem {
    pub uuid: OrderItemUuid,
    pub product: ProductUuid,
    pub quantity: u32,
}

impl NewOrderItem {
    #[must_use]
    pub fn new(product: ProductUuid, quantity: u32) -> Self {
        Self {
            uuid: OrderItemUuid::new(),
            product,
            quantity,
        }
    }
}
