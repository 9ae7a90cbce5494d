//! Orders Repositories

pub(crate) mod items;
pub(crate) mod orders;

pub(crate) use items::{PgOrderItemsRepository, PricedItem};
pub(crate) use orders::{OrderAmounts, PgOrdersRepository};
