//! Tier Fixtures

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    fixtures::{FixtureError, promotions::parse_percentage},
    loyalty::{LoyaltyTier, TierPerks},
};

/// Wrapper for tiers in YAML
#[derive(Debug, Deserialize)]
pub struct TiersFixture {
    /// Tiers in any order
    pub tiers: Vec<TierFixture>,
}

/// Tier fixture from YAML
#[derive(Debug, Deserialize)]
pub struct TierFixture {
    /// Tier name
    pub name: String,

    /// Balance needed to reach the tier
    pub threshold: i64,

    /// Points multiplier (e.g. "1.5")
    pub multiplier: String,

    /// Shipping waived
    #[serde(default)]
    pub free_shipping: bool,

    /// Standing discount (e.g. "5%")
    #[serde(default)]
    pub discount: Option<String>,

    /// Whether the tier can be assigned
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl TryFrom<TierFixture> for LoyaltyTier {
    type Error = FixtureError;

    fn try_from(fixture: TierFixture) -> Result<Self, Self::Error> {
        let multiplier = fixture
            .multiplier
            .trim()
            .parse::<Decimal>()
            .map_err(|_err| FixtureError::InvalidTier(fixture.multiplier.clone()))?;

        if multiplier <= Decimal::ZERO || fixture.threshold < 0 {
            return Err(FixtureError::InvalidTier(format!(
                "tier {} needs a positive multiplier and a non-negative threshold",
                fixture.name
            )));
        }

        let discount_percentage = fixture
            .discount
            .as_deref()
            .map(parse_percentage)
            .transpose()?;

        Ok(LoyaltyTier::new(fixture.name, fixture.threshold, multiplier)
            .with_perks(TierPerks {
                free_shipping: fixture.free_shipping,
                discount_percentage,
            })
            .with_active(fixture.active))
    }
}
