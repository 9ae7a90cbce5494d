//! Loyalty Data

use hearth::loyalty::LoyaltyTier;

use crate::domain::loyalty::records::{RewardUuid, TierRecord, TierUuid};

/// New Tier Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTier {
    pub uuid: TierUuid,
    pub tier: LoyaltyTier,
}

impl From<LoyaltyTier> for NewTier {
    fn from(tier: LoyaltyTier) -> Self {
        Self {
            uuid: TierUuid::new(),
            tier,
        }
    }
}

/// New Reward Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReward {
    pub uuid: RewardUuid,
    pub name: String,
    pub points_cost: i64,
    pub active: bool,
}

/// The tier above a customer's current one and the points still needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextTierRecord {
    pub tier: TierRecord,
    pub points_needed: i64,
}
