//! Loyalty Tiers

use std::borrow::Borrow;

use rust_decimal::Decimal;

/// Benefits granted to members of a tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierPerks {
    /// Shipping is waived on orders.
    pub free_shipping: bool,

    /// Standing percentage off orders, on a 0-100 scale.
    pub discount_percentage: Option<Decimal>,
}

/// A threshold-based customer classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoyaltyTier {
    /// Display name.
    pub name: String,

    /// Balance needed to reach the tier.
    pub points_threshold: i64,

    /// Multiplier applied to points earned on purchases.
    pub points_multiplier: Decimal,

    /// Tier benefits.
    pub perks: TierPerks,

    /// Inactive tiers are never assigned.
    pub active: bool,
}

impl LoyaltyTier {
    /// Create an active tier without perks.
    pub fn new(name: impl Into<String>, points_threshold: i64, points_multiplier: Decimal) -> Self {
        Self {
            name: name.into(),
            points_threshold,
            points_multiplier,
            perks: TierPerks::default(),
            active: true,
        }
    }

    /// Set the perks.
    #[must_use]
    pub fn with_perks(mut self, perks: TierPerks) -> Self {
        self.perks = perks;
        self
    }

    /// Switch the tier on or off.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// The tier above a customer's current one.
#[derive(Debug, PartialEq, Eq)]
pub struct NextTier<'t, T> {
    /// Next tier.
    pub tier: &'t T,

    /// Points still needed to reach it.
    pub points_needed: i64,
}

/// The active tier with the highest threshold not above `balance`.
pub fn current_tier<T: Borrow<LoyaltyTier>>(tiers: &[T], balance: i64) -> Option<&T> {
    tiers
        .iter()
        .filter(|tier| tier_of(*tier).active && tier_of(*tier).points_threshold <= balance)
        .max_by_key(|tier| tier_of(*tier).points_threshold)
}

/// The active tier with the lowest threshold above `balance`, if any.
pub fn next_tier<T: Borrow<LoyaltyTier>>(tiers: &[T], balance: i64) -> Option<NextTier<'_, T>> {
    tiers
        .iter()
        .filter(|tier| tier_of(*tier).active && tier_of(*tier).points_threshold > balance)
        .min_by_key(|tier| tier_of(*tier).points_threshold)
        .map(|tier| NextTier {
            tier,
            points_needed: tier_of(tier).points_threshold - balance,
        })
}

fn tier_of<T: Borrow<LoyaltyTier>>(tier: &T) -> &LoyaltyTier {
    tier.borrow()
}
