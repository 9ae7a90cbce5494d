//! Loyalty Records

use std::borrow::Borrow;

use hearth::loyalty::{LedgerEntry, LoyaltyTier, TransactionKind};
use jiff::Timestamp;

use crate::{
    domain::{customers::CustomerUuid, orders::records::OrderUuid},
    uuids::TypedUuid,
};

/// Tier UUID
pub type TierUuid = TypedUuid<TierRecord>;

/// Reward UUID
pub type RewardUuid = TypedUuid<RewardRecord>;

/// Ledger Entry UUID
pub type LedgerEntryUuid = TypedUuid<LedgerEntryRecord>;

/// Tier Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierRecord {
    pub uuid: TierUuid,
    pub tier: LoyaltyTier,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Borrow<LoyaltyTier> for TierRecord {
    fn borrow(&self) -> &LoyaltyTier {
        &self.tier
    }
}

/// Reward Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardRecord {
    pub uuid: RewardUuid,
    pub name: String,
    pub points_cost: i64,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Ledger Entry Record
///
/// `total_points` is the customer's balance immediately after the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntryRecord {
    pub uuid: LedgerEntryUuid,
    pub customer: CustomerUuid,
    pub kind: TransactionKind,
    pub points: i64,
    pub total_points: i64,
    pub order: Option<OrderUuid>,
    pub reward: Option<RewardUuid>,
    pub expires_entry: Option<LedgerEntryUuid>,
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl LedgerEntryRecord {
    /// Replay view of the entry.
    #[must_use]
    pub fn to_entry(&self) -> LedgerEntry {
        LedgerEntry {
            id: self.uuid.into_uuid(),
            kind: self.kind,
            points: self.points,
            created_at: self.created_at,
            expires_at: self.expires_at,
            expires_entry: self.expires_entry.map(LedgerEntryUuid::into_uuid),
        }
    }
}
