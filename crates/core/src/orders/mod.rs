//! Orders

use rusty_money::{Money, iso::Currency};
use uuid::Uuid;

pub mod status;
pub mod totals;

pub use status::{OrderStatus, TransitionError};
pub use totals::{Charges, OrderTotals, TotalsError};

/// A line in an order: a quantity of one product at a snapshotted unit price.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine<'a> {
    /// Product ordered.
    pub product: Uuid,

    /// Category of the product when it was added, if any.
    pub category: Option<String>,

    /// Number of units.
    pub quantity: u32,

    /// Price of one unit when the line was added.
    pub unit_price: Money<'a, Currency>,
}

impl<'a> OrderLine<'a> {
    /// Create a line without a category.
    pub fn new(product: Uuid, quantity: u32, unit_price: Money<'a, Currency>) -> Self {
        Self {
            product,
            category: None,
            quantity,
            unit_price,
        }
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    /// Line total, `quantity x unit price`.
    ///
    /// # Errors
    ///
    /// Returns [`TotalsError::Overflow`] when the product does not fit in minor units.
    pub fn total(&self) -> Result<Money<'a, Currency>, TotalsError> {
        let minor = self
            .unit_price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
            .ok_or(TotalsError::Overflow)?;

        Ok(Money::from_minor(minor, self.unit_price.currency()))
    }
}
