//! Loyalty
//!
//! Tiers, points earned on purchases and the append-only points ledger.

pub mod ledger;
pub mod points;
pub mod tiers;

pub use ledger::{LapsedLot, Ledger, LedgerEntry, LedgerError, TransactionKind};
pub use points::{PointsError, points_for_purchase};
pub use tiers::{LoyaltyTier, NextTier, TierPerks, current_tier, next_tier};
