//! Points Ledger
//!
//! Every change to a customer's points goes through here, inside a
//! caller-owned transaction. Appends for one customer are serialized with an
//! advisory lock, then the ledger is replayed to check the change and work out
//! the running total stored with the new entry.

use hearth::loyalty::{Ledger, LedgerEntry, TransactionKind, current_tier, points_for_purchase};
use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::Money;
use sqlx::{Postgres, Transaction};
use tracing::{debug, info};

use crate::{
    config::Pricing,
    database::lock_key,
    domain::{
        customers::CustomerUuid,
        loyalty::{
            LoyaltyServiceError,
            records::{LedgerEntryRecord, LedgerEntryUuid, RewardRecord, RewardUuid, TierRecord},
            repositories::{PgLedgerRepository, PgTiersRepository},
        },
        orders::records::OrderUuid,
    },
};

const CUSTOMER_LOCK_NAMESPACE: &str = "loyalty_customer";

/// A customer's replayed ledger, locked for the rest of the transaction.
#[derive(Debug)]
pub(crate) struct CustomerLedger {
    customer: CustomerUuid,
    ledger: Ledger,
}

impl CustomerLedger {
    pub(crate) fn balance_at(&self, now: Timestamp) -> i64 {
        self.ledger.balance_at(now)
    }
}

/// Link from an entry to what caused it.
#[derive(Debug, Clone, Copy, Default)]
struct Source {
    order: Option<OrderUuid>,
    reward: Option<RewardUuid>,
}

#[derive(Debug, Clone)]
pub(crate) struct PointsLedger {
    ledger: PgLedgerRepository,
    tiers: PgTiersRepository,
    pricing: Pricing,
}

impl PointsLedger {
    #[must_use]
    pub(crate) fn new(pricing: Pricing) -> Self {
        Self {
            ledger: PgLedgerRepository::new(),
            tiers: PgTiersRepository::new(),
            pricing,
        }
    }

    /// Lock the customer's ledger and replay it.
    pub(crate) async fn open(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
    ) -> Result<CustomerLedger, LoyaltyServiceError> {
        lock_key(tx, CUSTOMER_LOCK_NAMESPACE, customer.into_uuid()).await?;

        let entries: Vec<LedgerEntry> = self
            .ledger
            .list_customer_entries(tx, customer)
            .await?
            .iter()
            .map(LedgerEntryRecord::to_entry)
            .collect();

        let ledger = Ledger::replay(&entries)?;

        Ok(CustomerLedger { customer, ledger })
    }

    /// The customer's tier at `now`.
    pub(crate) async fn tier_at(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
        now: Timestamp,
    ) -> Result<Option<TierRecord>, LoyaltyServiceError> {
        let balance = self.open(tx, customer).await?.balance_at(now);
        let tiers = self.tiers.list_tiers(tx).await?;

        Ok(current_tier(&tiers, balance).cloned())
    }

    /// Earn points for an order, using the multiplier of the customer's tier
    /// before the purchase.
    pub(crate) async fn award(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
        order: OrderUuid,
        amount: u64,
        now: Timestamp,
    ) -> Result<LedgerEntryRecord, LoyaltyServiceError> {
        self.award_once(tx, customer, order, amount, now)
            .await?
            .ok_or(LoyaltyServiceError::AlreadyAwarded)
    }

    /// Like [`PointsLedger::award`], but an order that already earned points
    /// yields `None` instead of an error.
    pub(crate) async fn award_once(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
        order: OrderUuid,
        amount: u64,
        now: Timestamp,
    ) -> Result<Option<LedgerEntryRecord>, LoyaltyServiceError> {
        let mut ledger = self.open(tx, customer).await?;

        if self
            .ledger
            .find_order_entry(tx, order, TransactionKind::Earn)
            .await?
            .is_some()
        {
            debug!(order_uuid = %order, "order already earned points");

            return Ok(None);
        }

        let tiers = self.tiers.list_tiers(tx).await?;

        let multiplier = current_tier(&tiers, ledger.balance_at(now))
            .map_or(Decimal::ONE, |tier| tier.tier.points_multiplier);

        let amount = Money::from_minor(i64::try_from(amount)?, self.pricing.currency);
        let points = points_for_purchase(&amount, multiplier)?;

        let expires_at = self
            .pricing
            .points_validity
            .map(|validity| now.checked_add(validity))
            .transpose()
            .map_err(|_err| LoyaltyServiceError::InvalidData)?;

        let entry = LedgerEntry::earn(points, now, expires_at);

        self.append(
            tx,
            &mut ledger,
            entry,
            Source {
                order: Some(order),
                reward: None,
            },
        )
        .await
        .map(Some)
    }

    /// Spend points on a reward.
    pub(crate) async fn redeem(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
        reward: RewardRecord,
        now: Timestamp,
    ) -> Result<LedgerEntryRecord, LoyaltyServiceError> {
        if !reward.active {
            return Err(LoyaltyServiceError::RewardUnavailable);
        }

        let mut ledger = self.open(tx, customer).await?;
        let available = ledger.balance_at(now);

        if available < reward.points_cost {
            return Err(LoyaltyServiceError::InsufficientPoints {
                available,
                required: reward.points_cost,
            });
        }

        let entry = LedgerEntry::redeem(reward.points_cost, now);

        self.append(
            tx,
            &mut ledger,
            entry,
            Source {
                order: None,
                reward: Some(reward.uuid),
            },
        )
        .await
    }

    /// Take back the points earned for an order, as far as the live balance allows.
    ///
    /// Returns `None` when nothing was earned for the order, it has already been
    /// reversed, or there is nothing left to take back.
    pub(crate) async fn reverse(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
        order: OrderUuid,
        now: Timestamp,
    ) -> Result<Option<LedgerEntryRecord>, LoyaltyServiceError> {
        let mut ledger = self.open(tx, customer).await?;

        let Some(earned) = self
            .ledger
            .find_order_entry(tx, order, TransactionKind::Earn)
            .await?
        else {
            return Ok(None);
        };

        if self
            .ledger
            .find_order_entry(tx, order, TransactionKind::Adjust)
            .await?
            .is_some()
        {
            return Ok(None);
        }

        let points = earned.points.min(ledger.balance_at(now));

        if points <= 0 {
            debug!(order_uuid = %order, "no points left to reverse");

            return Ok(None);
        }

        let entry = LedgerEntry::adjust(-points, now);

        self.append(
            tx,
            &mut ledger,
            entry,
            Source {
                order: Some(order),
                reward: None,
            },
        )
        .await
        .map(Some)
    }

    /// Write off every lapsed lot of one customer. Returns the entries written.
    pub(crate) async fn expire(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
        now: Timestamp,
    ) -> Result<Vec<LedgerEntryRecord>, LoyaltyServiceError> {
        let mut ledger = self.open(tx, customer).await?;
        let lapsed = ledger.ledger.lapsed_at(now);

        let mut written = Vec::with_capacity(lapsed.len());

        for lot in &lapsed {
            let entry = LedgerEntry::expire(lot, now);

            written.push(self.append(tx, &mut ledger, entry, Source::default()).await?);
        }

        Ok(written)
    }

    async fn append(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ledger: &mut CustomerLedger,
        entry: LedgerEntry,
        source: Source,
    ) -> Result<LedgerEntryRecord, LoyaltyServiceError> {
        ledger.ledger.apply(&entry)?;

        let record = LedgerEntryRecord {
            uuid: LedgerEntryUuid::from_uuid(entry.id),
            customer: ledger.customer,
            kind: entry.kind,
            points: entry.points,
            total_points: ledger.ledger.balance_at(entry.created_at),
            order: source.order,
            reward: source.reward,
            expires_entry: entry.expires_entry.map(LedgerEntryUuid::from_uuid),
            expires_at: entry.expires_at,
            created_at: entry.created_at,
        };

        let created = self.ledger.create_entry(tx, &record).await?;

        info!(
            customer_uuid = %created.customer,
            entry_uuid = %created.uuid,
            kind = %created.kind,
            points = created.points,
            total_points = created.total_points,
            "appended ledger entry"
        );

        Ok(created)
    }
}
