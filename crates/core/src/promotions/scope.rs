//! Promotion Scope

use uuid::Uuid;

use crate::orders::OrderLine;

/// Which order lines a promotion's discount is calculated over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PromotionScope {
    /// Every line in the order.
    #[default]
    Order,

    /// Lines whose product belongs to this category.
    Category(String),

    /// Lines for this product.
    Product(Uuid),
}

impl PromotionScope {
    /// Whether the line counts towards the discounted total.
    pub fn matches(&self, line: &OrderLine<'_>) -> bool {
        match self {
            Self::Order => true,
            Self::Category(category) => line.category.as_deref() == Some(category.as_str()),
            Self::Product(product) => line.product == *product,
        }
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::GBP};

    use super::*;

    fn line(product: Uuid, category: Option<&str>) -> OrderLine<'static> {
        OrderLine::new(product, 1, Money::from_minor(250, GBP))
            .with_category(category.map(str::to_string))
    }

    #[test]
    fn order_scope_matches_everything() {
        assert!(PromotionScope::Order.matches(&line(Uuid::now_v7(), None)));
    }

    #[test]
    fn category_scope_matches_only_that_category() {
        let scope = PromotionScope::Category("bread".to_string());

        assert!(scope.matches(&line(Uuid::now_v7(), Some("bread"))));
        assert!(!scope.matches(&line(Uuid::now_v7(), Some("cakes"))));
        assert!(!scope.matches(&line(Uuid::now_v7(), None)));
    }

    #[test]
    fn product_scope_matches_only_that_product() {
        let sourdough = Uuid::now_v7();
        let scope = PromotionScope::Product(sourdough);

        assert!(scope.matches(&line(sourdough, Some("bread"))));
        assert!(!scope.matches(&line(Uuid::now_v7(), Some("bread"))));
    }
}
