//! Promotion Redemption
//!
//! Using a promotion touches the promotion, its usages and the customer's
//! history, so redemption runs inside a caller-owned transaction. The orders
//! service redeems in the same transaction that stores the order's discount.

use hearth::{
    discounts::{DiscountOutcome, DiscountPolicy, evaluate_discount, evaluate_scoped_discount},
    orders::OrderLine,
    promotions::{InvalidReason, Promotion},
};
use jiff::Timestamp;
use rusty_money::Money;
use sqlx::{Postgres, Transaction};
use tracing::{info, warn};

use crate::{
    config::Pricing,
    database::lock_key,
    domain::{
        customers::CustomerUuid,
        orders::records::OrderUuid,
        promotions::{
            PromotionsServiceError,
            records::{PromotionRecord, PromotionUsageRecord, PromotionUsageUuid, PromotionUuid},
            repositories::{PgPromotionUsagesRepository, PgPromotionsRepository},
        },
    },
};

const CUSTOMER_LOCK_NAMESPACE: &str = "promotion_customer";

/// What the discount is calculated over.
#[derive(Debug, Clone, Copy)]
pub(crate) enum DiscountBase<'l> {
    /// A bare order total in minor units; the promotion's scope is not consulted.
    Total(u64),

    /// Order lines, narrowed to those the promotion's scope covers.
    Lines(&'l [OrderLine<'static>]),
}

/// A counted promotion use.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Redemption {
    pub promotion: PromotionRecord,
    pub usage: PromotionUsageRecord,
}

#[derive(Debug, Clone)]
pub(crate) struct PromotionRedemptions {
    promotions: PgPromotionsRepository,
    usages: PgPromotionUsagesRepository,
    pricing: Pricing,
}

impl PromotionRedemptions {
    #[must_use]
    pub(crate) fn new(pricing: Pricing) -> Self {
        Self {
            promotions: PgPromotionsRepository::new(),
            usages: PgPromotionUsagesRepository::new(),
            pricing,
        }
    }

    /// Validate, price and count one use of the promotion with `code`.
    ///
    /// Nothing is written unless every check passes. Uses by the same customer
    /// are serialized, so the per-customer limit holds under concurrency; the
    /// usage limit itself is enforced by a conditional increment.
    pub(crate) async fn redeem(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
        customer: CustomerUuid,
        order: OrderUuid,
        base: DiscountBase<'_>,
        now: Timestamp,
    ) -> Result<Redemption, PromotionsServiceError> {
        lock_key(tx, CUSTOMER_LOCK_NAMESPACE, customer.into_uuid()).await?;

        let record = self.promotions.get_promotion_by_code(tx, code).await?;
        let currency = self.pricing.currency;
        let promotion = record.to_promotion(currency)?;

        promotion.check_validity(now)?;

        let limit = self.pricing.per_customer_promotion_limit;

        if limit > 0 {
            let used = self
                .usages
                .count_customer_usages(tx, record.uuid, customer)
                .await?;

            if used >= u64::from(limit) {
                return Err(InvalidReason::CustomerLimitReached.into());
            }
        }

        let discount = self.discount(&promotion, base)?;

        if !self.promotions.claim_usage(tx, record.uuid).await? {
            warn!(promotion_uuid = %record.uuid, "promotion usage limit reached while claiming");

            return Err(InvalidReason::Exhausted.into());
        }

        let usage = self
            .usages
            .create_usage(
                tx,
                &PromotionUsageRecord {
                    uuid: PromotionUsageUuid::new(),
                    promotion: record.uuid,
                    customer,
                    order,
                    discount_amount: discount,
                    used_at: now,
                    released_at: None,
                },
            )
            .await?;

        info!(
            promotion_uuid = %record.uuid,
            usage_uuid = %usage.uuid,
            discount_amount = discount,
            "redeemed promotion"
        );

        Ok(Redemption {
            promotion: record,
            usage,
        })
    }

    /// Recalculate the discount of a promotion already redeemed on an order.
    ///
    /// The promotion's window and limits are not checked again; the use was
    /// counted when it was redeemed.
    pub(crate) async fn reprice(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: PromotionUuid,
        order: OrderUuid,
        lines: &[OrderLine<'static>],
    ) -> Result<PromotionUsageRecord, PromotionsServiceError> {
        let record = self.promotions.get_promotion(tx, promotion).await?;
        let discount = self.discount(
            &record.to_promotion(self.pricing.currency)?,
            DiscountBase::Lines(lines),
        )?;

        let usage = self
            .usages
            .reprice_order_usage(tx, promotion, order, discount)
            .await?;

        info!(
            promotion_uuid = %promotion,
            usage_uuid = %usage.uuid,
            discount_amount = discount,
            "repriced promotion usage"
        );

        Ok(usage)
    }

    fn discount(
        &self,
        promotion: &Promotion<'static>,
        base: DiscountBase<'_>,
    ) -> Result<u64, PromotionsServiceError> {
        let currency = self.pricing.currency;

        let policy = DiscountPolicy {
            free_shipping_estimate: Money::from_minor(
                i64::try_from(self.pricing.free_shipping_estimate)?,
                currency,
            ),
        };

        let outcome = match base {
            DiscountBase::Total(total) => {
                let total = Money::from_minor(i64::try_from(total)?, currency);

                evaluate_discount(promotion, &total, &policy)?
            }
            DiscountBase::Lines(lines) => {
                evaluate_scoped_discount(promotion, currency, lines, &policy)?
                    .ok_or(PromotionsServiceError::NoEligibleLines)?
            }
        };

        match outcome {
            DiscountOutcome::Applied(amount) => Ok(u64::try_from(amount.to_minor_units())?),
            DiscountOutcome::BelowMinimum { minimum } => {
                Err(PromotionsServiceError::NotApplicable {
                    minimum: u64::try_from(minimum.to_minor_units())?,
                })
            }
        }
    }

    /// Release every open usage on an order and give the uses back.
    pub(crate) async fn release(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        now: Timestamp,
    ) -> Result<Vec<PromotionUsageRecord>, PromotionsServiceError> {
        let released = self.usages.release_order_usages(tx, order, now).await?;

        for usage in &released {
            self.promotions.release_usage(tx, usage.promotion).await?;
        }

        if !released.is_empty() {
            info!(order_uuid = %order, released = released.len(), "released promotion usages");
        }

        Ok(released)
    }
}
