//! Loyalty Service

use async_trait::async_trait;
use hearth::loyalty::next_tier;
use jiff::Timestamp;
use mockall::automock;
use tracing::info;

use crate::{
    config::Pricing,
    database::Db,
    domain::{
        customers::CustomerUuid,
        loyalty::{
            LoyaltyServiceError,
            data::{NewReward, NewTier, NextTierRecord},
            points::PointsLedger,
            records::{LedgerEntryRecord, RewardRecord, RewardUuid, TierRecord},
            repositories::{PgLedgerRepository, PgRewardsRepository, PgTiersRepository},
        },
        orders::records::OrderUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgLoyaltyService {
    db: Db,
    tiers: PgTiersRepository,
    rewards: PgRewardsRepository,
    ledger: PgLedgerRepository,
    points: PointsLedger,
}

impl PgLoyaltyService {
    #[must_use]
    pub fn new(db: Db, pricing: Pricing) -> Self {
        Self {
            db,
            tiers: PgTiersRepository::new(),
            rewards: PgRewardsRepository::new(),
            ledger: PgLedgerRepository::new(),
            points: PointsLedger::new(pricing),
        }
    }
}

#[async_trait]
impl LoyaltyService for PgLoyaltyService {
    #[tracing::instrument(
        name = "loyalty.service.create_tier",
        skip(self, tier),
        fields(tier_uuid = %tier.uuid, threshold = tier.tier.points_threshold),
        err
    )]
    async fn create_tier(&self, tier: NewTier) -> Result<TierRecord, LoyaltyServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let created = self.tiers.create_tier(&mut tx, tier).await?;

        tx.commit().await?;

        info!(tier_uuid = %created.uuid, name = %created.tier.name, "created tier");

        Ok(created)
    }

    async fn list_tiers(&self) -> Result<Vec<TierRecord>, LoyaltyServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let tiers = self.tiers.list_tiers(&mut tx).await?;

        tx.commit().await?;

        Ok(tiers)
    }

    #[tracing::instrument(
        name = "loyalty.service.create_reward",
        skip(self, reward),
        fields(reward_uuid = %reward.uuid, points_cost = reward.points_cost),
        err
    )]
    async fn create_reward(&self, reward: NewReward) -> Result<RewardRecord, LoyaltyServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let created = self.rewards.create_reward(&mut tx, reward).await?;

        tx.commit().await?;

        info!(reward_uuid = %created.uuid, "created reward");

        Ok(created)
    }

    async fn list_rewards(&self) -> Result<Vec<RewardRecord>, LoyaltyServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let rewards = self.rewards.list_rewards(&mut tx).await?;

        tx.commit().await?;

        Ok(rewards)
    }

    async fn current_balance(
        &self,
        customer: CustomerUuid,
        now: Timestamp,
    ) -> Result<i64, LoyaltyServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let balance = self.points.open(&mut tx, customer).await?.balance_at(now);

        tx.commit().await?;

        Ok(balance)
    }

    async fn current_tier(
        &self,
        customer: CustomerUuid,
        now: Timestamp,
    ) -> Result<Option<TierRecord>, LoyaltyServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let tier = self.points.tier_at(&mut tx, customer, now).await?;

        tx.commit().await?;

        Ok(tier)
    }

    async fn next_tier(
        &self,
        customer: CustomerUuid,
        now: Timestamp,
    ) -> Result<Option<NextTierRecord>, LoyaltyServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let balance = self.points.open(&mut tx, customer).await?.balance_at(now);
        let tiers = self.tiers.list_tiers(&mut tx).await?;

        tx.commit().await?;

        Ok(next_tier(&tiers, balance).map(|next| NextTierRecord {
            tier: next.tier.clone(),
            points_needed: next.points_needed,
        }))
    }

    #[tracing::instrument(
        name = "loyalty.service.award_points_for_purchase",
        skip(self, customer, order),
        fields(customer_uuid = %customer, order_uuid = %order, amount),
        err
    )]
    async fn award_points_for_purchase(
        &self,
        customer: CustomerUuid,
        order: OrderUuid,
        amount: u64,
        now: Timestamp,
    ) -> Result<LedgerEntryRecord, LoyaltyServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let entry = self
            .points
            .award(&mut tx, customer, order, amount, now)
            .await?;

        tx.commit().await?;

        Ok(entry)
    }

    #[tracing::instrument(
        name = "loyalty.service.redeem_points",
        skip(self, customer, reward),
        fields(customer_uuid = %customer, reward_uuid = %reward),
        err
    )]
    async fn redeem_points(
        &self,
        customer: CustomerUuid,
        reward: RewardUuid,
        now: Timestamp,
    ) -> Result<LedgerEntryRecord, LoyaltyServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let reward = self.rewards.get_reward(&mut tx, reward).await?;
        let entry = self.points.redeem(&mut tx, customer, reward, now).await?;

        tx.commit().await?;

        Ok(entry)
    }

    #[tracing::instrument(name = "loyalty.service.process_expired_points", skip(self), err)]
    async fn process_expired_points(&self, now: Timestamp) -> Result<u64, LoyaltyServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let customers = self
            .ledger
            .list_customers_with_lapsed_points(&mut tx, now)
            .await?;

        tx.commit().await?;

        let mut expired: u64 = 0;

        for customer in customers {
            let mut tx = self.db.begin_transaction().await?;

            let written = self.points.expire(&mut tx, customer, now).await?;

            tx.commit().await?;

            let written_off = written.iter().filter(|entry| entry.points != 0).count();

            expired += u64::try_from(written_off)?;
        }

        info!(expired, "expired lapsed points");

        Ok(expired)
    }

    #[tracing::instrument(
        name = "loyalty.service.reverse_order_points",
        skip(self, customer, order),
        fields(customer_uuid = %customer, order_uuid = %order),
        err
    )]
    async fn reverse_order_points(
        &self,
        customer: CustomerUuid,
        order: OrderUuid,
        now: Timestamp,
    ) -> Result<Option<LedgerEntryRecord>, LoyaltyServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let entry = self.points.reverse(&mut tx, customer, order, now).await?;

        tx.commit().await?;

        Ok(entry)
    }

    async fn ledger_history(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<LedgerEntryRecord>, LoyaltyServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let entries = self.ledger.list_customer_entries(&mut tx, customer).await?;

        tx.commit().await?;

        Ok(entries)
    }
}

#[automock]
#[async_trait]
pub trait LoyaltyService: Send + Sync {
    /// Creates a new tier.
    async fn create_tier(&self, tier: NewTier) -> Result<TierRecord, LoyaltyServiceError>;

    /// All tiers, lowest threshold first.
    async fn list_tiers(&self) -> Result<Vec<TierRecord>, LoyaltyServiceError>;

    /// Creates a new reward.
    async fn create_reward(&self, reward: NewReward) -> Result<RewardRecord, LoyaltyServiceError>;

    /// Active rewards, cheapest first.
    async fn list_rewards(&self) -> Result<Vec<RewardRecord>, LoyaltyServiceError>;

    /// Live points balance at `now`.
    async fn current_balance(
        &self,
        customer: CustomerUuid,
        now: Timestamp,
    ) -> Result<i64, LoyaltyServiceError>;

    /// The customer's tier at `now`, if any tier's threshold is met.
    async fn current_tier(
        &self,
        customer: CustomerUuid,
        now: Timestamp,
    ) -> Result<Option<TierRecord>, LoyaltyServiceError>;

    /// The tier above the customer's current one and the points needed to reach it.
    async fn next_tier(
        &self,
        customer: CustomerUuid,
        now: Timestamp,
    ) -> Result<Option<NextTierRecord>, LoyaltyServiceError>;

    /// Earn points for a purchase. Each order earns once.
    async fn award_points_for_purchase(
        &self,
        customer: CustomerUuid,
        order: OrderUuid,
        amount: u64,
        now: Timestamp,
    ) -> Result<LedgerEntryRecord, LoyaltyServiceError>;

    /// Spend points on a reward.
    async fn redeem_points(
        &self,
        customer: CustomerUuid,
        reward: RewardUuid,
        now: Timestamp,
    ) -> Result<LedgerEntryRecord, LoyaltyServiceError>;

    /// Write off lapsed points for every customer. Returns the number of entries written.
    async fn process_expired_points(&self, now: Timestamp) -> Result<u64, LoyaltyServiceError>;

    /// Take back the points an order earned.
    async fn reverse_order_points(
        &self,
        customer: CustomerUuid,
        order: OrderUuid,
        now: Timestamp,
    ) -> Result<Option<LedgerEntryRecord>, LoyaltyServiceError>;

    /// A customer's ledger entries, oldest first.
    async fn ledger_history(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<LedgerEntryRecord>, LoyaltyServiceError>;
}

#[cfg(test)]
mod tests {
    use hearth::loyalty::{LoyaltyTier, TransactionKind};
    use jiff::SignedDuration;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::test::{TestContext, helpers::instant};

    use super::*;

    fn now() -> Timestamp {
        instant("2026-03-01T09:00:00Z")
    }

    async fn bakery_tiers(ctx: &TestContext) -> TestResult {
        for tier in ctx.fixture_tiers()? {
            ctx.loyalty.create_tier(NewTier::from(tier)).await?;
        }

        Ok(())
    }

    async fn reward(ctx: &TestContext, points_cost: i64) -> Result<RewardRecord, LoyaltyServiceError> {
        ctx.loyalty
            .create_reward(NewReward {
                uuid: RewardUuid::new(),
                name: "Free coffee".to_string(),
                points_cost,
                active: true,
            })
            .await
    }

    #[tokio::test]
    async fn award_uses_base_multiplier_without_tiers() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = CustomerUuid::new();

        let entry = ctx
            .loyalty
            .award_points_for_purchase(customer, OrderUuid::new(), 2_099, now())
            .await?;

        assert_eq!(entry.kind, TransactionKind::Earn);
        assert_eq!(entry.points, 20);
        assert_eq!(entry.total_points, 20);
        assert_eq!(
            entry.expires_at,
            ctx.pricing.points_validity.map(|validity| now() + validity)
        );
        assert_eq!(ctx.loyalty.current_balance(customer, now()).await?, 20);

        Ok(())
    }

    #[tokio::test]
    async fn award_uses_tier_multiplier_before_purchase() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = CustomerUuid::new();

        bakery_tiers(&ctx).await?;

        ctx.loyalty
            .award_points_for_purchase(customer, OrderUuid::new(), 50_000, now())
            .await?;

        let tier = ctx.loyalty.current_tier(customer, now()).await?;

        assert_eq!(tier.map(|tier| tier.tier.name), Some("Crust".to_string()));

        let entry = ctx
            .loyalty
            .award_points_for_purchase(customer, OrderUuid::new(), 1_000, now())
            .await?;

        assert_eq!(entry.points, 15);
        assert_eq!(entry.total_points, 515);

        Ok(())
    }

    #[tokio::test]
    async fn order_earns_points_once() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = CustomerUuid::new();
        let order = OrderUuid::new();

        ctx.loyalty
            .award_points_for_purchase(customer, order, 1_000, now())
            .await?;

        let again = ctx
            .loyalty
            .award_points_for_purchase(customer, order, 1_000, now())
            .await;

        assert!(
            matches!(again, Err(LoyaltyServiceError::AlreadyAwarded)),
            "expected AlreadyAwarded, got {again:?}"
        );
        assert_eq!(ctx.loyalty.current_balance(customer, now()).await?, 10);

        Ok(())
    }

    #[tokio::test]
    async fn next_tier_reports_points_needed() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = CustomerUuid::new();

        bakery_tiers(&ctx).await?;

        ctx.loyalty
            .award_points_for_purchase(customer, OrderUuid::new(), 12_000, now())
            .await?;

        let next = ctx.loyalty.next_tier(customer, now()).await?;

        assert_eq!(
            next.map(|next| (next.tier.tier.name, next.points_needed)),
            Some(("Crust".to_string(), 380))
        );

        Ok(())
    }

    #[tokio::test]
    async fn redeem_with_insufficient_points_writes_nothing() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = CustomerUuid::new();
        let coffee = reward(&ctx, 50).await?;

        ctx.loyalty
            .award_points_for_purchase(customer, OrderUuid::new(), 4_000, now())
            .await?;

        let result = ctx.loyalty.redeem_points(customer, coffee.uuid, now()).await;

        assert!(
            matches!(
                result,
                Err(LoyaltyServiceError::InsufficientPoints {
                    available: 40,
                    required: 50
                })
            ),
            "expected InsufficientPoints, got {result:?}"
        );
        assert_eq!(ctx.loyalty.ledger_history(customer).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn redeem_appends_negative_entry() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = CustomerUuid::new();
        let coffee = reward(&ctx, 50).await?;

        ctx.loyalty
            .award_points_for_purchase(customer, OrderUuid::new(), 8_000, now())
            .await?;

        let entry = ctx.loyalty.redeem_points(customer, coffee.uuid, now()).await?;

        assert_eq!(entry.kind, TransactionKind::Redeem);
        assert_eq!(entry.points, -50);
        assert_eq!(entry.total_points, 30);
        assert_eq!(entry.reward, Some(coffee.uuid));

        Ok(())
    }

    #[tokio::test]
    async fn inactive_reward_is_unavailable() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = CustomerUuid::new();

        let stale = ctx
            .loyalty
            .create_reward(NewReward {
                uuid: RewardUuid::new(),
                name: "Retired mug".to_string(),
                points_cost: 1,
                active: false,
            })
            .await?;

        let result = ctx.loyalty.redeem_points(customer, stale.uuid, now()).await;

        assert!(
            matches!(result, Err(LoyaltyServiceError::RewardUnavailable)),
            "expected RewardUnavailable, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_redemptions_never_overdraw() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = CustomerUuid::new();
        let coffee = reward(&ctx, 40).await?;

        ctx.loyalty
            .award_points_for_purchase(customer, OrderUuid::new(), 10_000, now())
            .await?;

        let attempts: Vec<_> = (0..5)
            .map(|_| {
                let service = ctx.loyalty.clone();
                let reward = coffee.uuid;

                tokio::spawn(async move { service.redeem_points(customer, reward, now()).await })
            })
            .collect();

        let mut redeemed = 0;

        for attempt in attempts {
            if attempt.await?.is_ok() {
                redeemed += 1;
            }
        }

        assert_eq!(redeemed, 2);
        assert_eq!(ctx.loyalty.current_balance(customer, now()).await?, 20);

        Ok(())
    }

    #[tokio::test]
    async fn lapsed_points_stop_counting_and_expire_once() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = CustomerUuid::new();

        let earned = ctx
            .loyalty
            .award_points_for_purchase(customer, OrderUuid::new(), 10_000, now())
            .await?;

        let Some(expires_at) = earned.expires_at else {
            return Err("test pricing should set a points validity".into());
        };

        let later = expires_at + SignedDuration::from_hours(1);

        assert_eq!(ctx.loyalty.current_balance(customer, later).await?, 0);

        assert_eq!(ctx.loyalty.process_expired_points(later).await?, 1);
        assert_eq!(ctx.loyalty.process_expired_points(later).await?, 0);

        let history = ctx.loyalty.ledger_history(customer).await?;

        let Some(expiry) = history.last() else {
            return Err("expected an expire entry".into());
        };

        assert_eq!(expiry.kind, TransactionKind::Expire);
        assert_eq!(expiry.points, -100);
        assert_eq!(expiry.expires_entry, Some(earned.uuid));
        assert_eq!(expiry.total_points, 0);

        Ok(())
    }

    #[tokio::test]
    async fn redemptions_consume_soonest_expiring_points_first() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = CustomerUuid::new();
        let coffee = reward(&ctx, 100).await?;

        let first = ctx
            .loyalty
            .award_points_for_purchase(customer, OrderUuid::new(), 10_000, now())
            .await?;

        let a_week_later = now() + SignedDuration::from_hours(24 * 7);

        ctx.loyalty
            .award_points_for_purchase(customer, OrderUuid::new(), 10_000, a_week_later)
            .await?;

        ctx.loyalty
            .redeem_points(customer, coffee.uuid, a_week_later)
            .await?;

        let Some(expires_at) = first.expires_at else {
            return Err("test pricing should set a points validity".into());
        };

        assert_eq!(ctx.loyalty.current_balance(customer, expires_at).await?, 100);
        assert_eq!(ctx.loyalty.process_expired_points(expires_at).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn spent_lots_are_closed_once_they_lapse() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = CustomerUuid::new();
        let coffee = reward(&ctx, 100).await?;

        let earned = ctx
            .loyalty
            .award_points_for_purchase(customer, OrderUuid::new(), 10_000, now())
            .await?;

        ctx.loyalty.redeem_points(customer, coffee.uuid, now()).await?;

        let Some(expires_at) = earned.expires_at else {
            return Err("test pricing should set a points validity".into());
        };

        assert_eq!(ctx.loyalty.process_expired_points(expires_at).await?, 0);

        let history = ctx.loyalty.ledger_history(customer).await?;

        let Some(closing) = history.last() else {
            return Err("expected a closing expire entry".into());
        };

        assert_eq!(closing.kind, TransactionKind::Expire);
        assert_eq!(closing.points, 0);
        assert_eq!(closing.expires_entry, Some(earned.uuid));

        assert_eq!(ctx.loyalty.process_expired_points(expires_at).await?, 0);
        assert_eq!(
            ctx.loyalty.ledger_history(customer).await?.len(),
            history.len(),
            "a closed lot should not be visited again"
        );

        Ok(())
    }

    #[tokio::test]
    async fn reverse_order_points_takes_back_what_is_left() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = CustomerUuid::new();
        let order = OrderUuid::new();
        let coffee = reward(&ctx, 70).await?;

        ctx.loyalty
            .award_points_for_purchase(customer, order, 10_000, now())
            .await?;

        ctx.loyalty.redeem_points(customer, coffee.uuid, now()).await?;

        let reversal = ctx
            .loyalty
            .reverse_order_points(customer, order, now())
            .await?;

        assert_eq!(reversal.as_ref().map(|entry| entry.points), Some(-30));
        assert_eq!(ctx.loyalty.current_balance(customer, now()).await?, 0);

        let again = ctx
            .loyalty
            .reverse_order_points(customer, order, now())
            .await?;

        assert_eq!(again, None);

        Ok(())
    }

    #[tokio::test]
    async fn inactive_tiers_are_never_assigned() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = CustomerUuid::new();

        ctx.loyalty
            .create_tier(NewTier::from(
                LoyaltyTier::new("Retired", 0, Decimal::TEN).with_active(false),
            ))
            .await?;

        ctx.loyalty
            .award_points_for_purchase(customer, OrderUuid::new(), 1_000, now())
            .await?;

        assert_eq!(ctx.loyalty.current_tier(customer, now()).await?, None);
        assert_eq!(ctx.loyalty.current_balance(customer, now()).await?, 10);

        Ok(())
    }
}
