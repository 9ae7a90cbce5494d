//! Promotion Fixtures

use jiff::Timestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    fixtures::FixtureError,
    money::parse_money,
    promotions::{Discount, Promotion, budget::UsageBudget, scope::PromotionScope},
};

/// Wrapper for promotions in YAML
#[derive(Debug, Deserialize)]
pub struct PromotionsFixture {
    /// Map of promotion key -> promotion fixture
    pub promotions: FxHashMap<String, PromotionFixture>,
}

/// Promotion fixture from YAML
#[derive(Debug, Deserialize)]
pub struct PromotionFixture {
    /// Promo code
    #[serde(default)]
    pub code: Option<String>,

    /// Discount configuration
    pub discount: DiscountFixture,

    /// Minimum order value (e.g. "20.00 GBP")
    #[serde(default)]
    pub minimum_order_value: Option<String>,

    /// Maximum discount (e.g. "10.00 GBP")
    #[serde(default)]
    pub maximum_discount: Option<String>,

    /// Usage limit
    #[serde(default)]
    pub usage_limit: Option<u32>,

    /// Times already used
    #[serde(default)]
    pub usage_count: u32,

    /// Start of the validity window
    pub starts_at: Timestamp,

    /// End of the validity window
    #[serde(default)]
    pub ends_at: Option<Timestamp>,

    /// Whether the promotion is switched on
    #[serde(default = "default_active")]
    pub active: bool,

    /// Category the promotion is restricted to
    #[serde(default)]
    pub category: Option<String>,

    /// Product the promotion is restricted to
    #[serde(default)]
    pub product: Option<String>,
}

const fn default_active() -> bool {
    true
}

/// Discount configuration from YAML
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountFixture {
    /// Percentage off, e.g. "15%"
    Percentage {
        /// Percentage value
        value: String,
    },

    /// Fixed amount off, e.g. "5.00 GBP"
    FixedAmount {
        /// Amount value
        value: String,
    },

    /// Buy one get one
    BuyOneGetOne,

    /// Free shipping
    FreeShipping,
}

impl TryFrom<DiscountFixture> for Discount<'static> {
    type Error = FixtureError;

    fn try_from(fixture: DiscountFixture) -> Result<Self, Self::Error> {
        Ok(match fixture {
            DiscountFixture::Percentage { value } => Discount::Percentage(parse_percentage(&value)?),
            DiscountFixture::FixedAmount { value } => Discount::FixedAmount(parse_money(&value)?),
            DiscountFixture::BuyOneGetOne => Discount::BuyOneGetOne,
            DiscountFixture::FreeShipping => Discount::FreeShipping,
        })
    }
}

impl TryFrom<PromotionFixture> for Promotion<'static> {
    type Error = FixtureError;

    fn try_from(fixture: PromotionFixture) -> Result<Self, Self::Error> {
        if fixture
            .ends_at
            .is_some_and(|ends_at| ends_at <= fixture.starts_at)
        {
            return Err(FixtureError::InvalidPromotionData(
                "ends_at must be after starts_at".to_string(),
            ));
        }

        let scope = match (fixture.category, fixture.product) {
            (None, None) => PromotionScope::Order,
            (Some(category), None) => PromotionScope::Category(category),
            (None, Some(product)) => PromotionScope::Product(
                Uuid::parse_str(&product).map_err(|_err| FixtureError::InvalidProduct(product))?,
            ),
            (Some(_), Some(_)) => {
                return Err(FixtureError::InvalidPromotionData(
                    "a promotion may be scoped to a category or a product, not both".to_string(),
                ));
            }
        };

        let budget = UsageBudget {
            limit: fixture.usage_limit,
            used: fixture.usage_count,
        };

        let mut promotion = Promotion::new(Discount::try_from(fixture.discount)?, fixture.starts_at)
            .with_budget(budget)
            .with_active(fixture.active)
            .scoped_to(scope);

        if let Some(code) = fixture.code {
            promotion = promotion.with_code(code);
        }

        if let Some(minimum) = fixture.minimum_order_value {
            promotion = promotion.with_minimum_order_value(parse_money(&minimum)?);
        }

        if let Some(maximum) = fixture.maximum_discount {
            promotion = promotion.with_maximum_discount(parse_money(&maximum)?);
        }

        if let Some(ends_at) = fixture.ends_at {
            promotion = promotion.ending_at(ends_at);
        }

        Ok(promotion)
    }
}

/// Parse percentage string on a 0-100 scale (e.g., "15%" or "15")
///
/// # Errors
///
/// Returns an error if the string cannot be parsed or lies outside 0-100.
pub fn parse_percentage(s: &str) -> Result<Decimal, FixtureError> {
    let trimmed = s.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();

    let value = number
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(FixtureError::InvalidPercentage(s.to_string()));
    }

    Ok(value)
}

/// Currencies of every amount a promotion carries.
pub(crate) fn currencies(promotion: &Promotion<'static>) -> Vec<&'static Currency> {
    let fixed = match promotion.discount {
        Discount::FixedAmount(amount) => Some(amount),
        Discount::Percentage(_) | Discount::BuyOneGetOne | Discount::FreeShipping => None,
    };

    [fixed, promotion.minimum_order_value, promotion.maximum_discount]
        .into_iter()
        .flatten()
        .map(|amount: Money<'static, Currency>| amount.currency())
        .collect()
}
