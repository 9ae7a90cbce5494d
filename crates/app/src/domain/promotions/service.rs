//! Promotions Service

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::{Span, info};

use crate::{
    config::Pricing,
    database::Db,
    domain::{
        orders::records::OrderUuid,
        promotions::{
            PromotionsServiceError,
            data::{AppliedPromotion, ApplyPromotion, NewPromotion},
            records::{PromotionRecord, PromotionUsageRecord, PromotionUuid},
            redemption::{DiscountBase, PromotionRedemptions},
            repositories::{PgPromotionUsagesRepository, PgPromotionsRepository},
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgPromotionsService {
    db: Db,
    promotions: PgPromotionsRepository,
    usages: PgPromotionUsagesRepository,
    redemptions: PromotionRedemptions,
}

impl PgPromotionsService {
    #[must_use]
    pub fn new(db: Db, pricing: Pricing) -> Self {
        Self {
            db,
            promotions: PgPromotionsRepository::new(),
            usages: PgPromotionUsagesRepository::new(),
            redemptions: PromotionRedemptions::new(pricing),
        }
    }
}

#[async_trait]
impl PromotionsService for PgPromotionsService {
    #[tracing::instrument(
        name = "promotions.service.create_promotion",
        skip(self, promotion),
        fields(
            promotion_uuid = %promotion.uuid,
            discount_kind = %promotion.discount.kind(),
        ),
        err
    )]
    async fn create_promotion(
        &self,
        promotion: NewPromotion,
    ) -> Result<PromotionRecord, PromotionsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let record = self.promotions.create_promotion(&mut tx, promotion).await?;

        tx.commit().await?;

        info!(promotion_uuid = %record.uuid, "created promotion");

        Ok(record)
    }

    async fn get_promotion(
        &self,
        promotion: PromotionUuid,
    ) -> Result<PromotionRecord, PromotionsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let record = self.promotions.get_promotion(&mut tx, promotion).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn get_promotion_by_code(
        &self,
        code: String,
    ) -> Result<PromotionRecord, PromotionsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let record = self.promotions.get_promotion_by_code(&mut tx, &code).await?;

        tx.commit().await?;

        Ok(record)
    }

    #[tracing::instrument(
        name = "promotions.service.set_active",
        skip(self, promotion),
        fields(promotion_uuid = %promotion),
        err
    )]
    async fn set_active(
        &self,
        promotion: PromotionUuid,
        active: bool,
    ) -> Result<PromotionRecord, PromotionsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let record = self.promotions.set_active(&mut tx, promotion, active).await?;

        tx.commit().await?;

        info!(promotion_uuid = %record.uuid, active, "changed promotion state");

        Ok(record)
    }

    #[tracing::instrument(
        name = "promotions.service.apply_promotion",
        skip(self, request),
        fields(
            customer_uuid = %request.customer,
            order_uuid = %request.order,
            order_total = request.order_total,
            promotion_uuid = tracing::field::Empty,
            discount_amount = tracing::field::Empty,
        ),
        err
    )]
    async fn apply_promotion(
        &self,
        request: ApplyPromotion,
        now: Timestamp,
    ) -> Result<AppliedPromotion, PromotionsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let redemption = self
            .redemptions
            .redeem(
                &mut tx,
                &request.code,
                request.customer,
                request.order,
                DiscountBase::Total(request.order_total),
                now,
            )
            .await?;

        tx.commit().await?;

        let discount_amount = redemption.usage.discount_amount;
        let final_amount = request.order_total.saturating_sub(discount_amount);

        let span = Span::current();

        span.record(
            "promotion_uuid",
            tracing::field::display(redemption.promotion.uuid),
        );
        span.record("discount_amount", discount_amount);

        Ok(AppliedPromotion {
            usage: redemption.usage,
            discount_amount,
            final_amount,
        })
    }

    #[tracing::instrument(
        name = "promotions.service.release_order_usages",
        skip(self, order),
        fields(order_uuid = %order),
        err
    )]
    async fn release_order_usages(
        &self,
        order: OrderUuid,
        now: Timestamp,
    ) -> Result<Vec<PromotionUsageRecord>, PromotionsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let released = self.redemptions.release(&mut tx, order, now).await?;

        tx.commit().await?;

        Ok(released)
    }

    async fn list_order_usages(
        &self,
        order: OrderUuid,
    ) -> Result<Vec<PromotionUsageRecord>, PromotionsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let usages = self.usages.list_order_usages(&mut tx, order).await?;

        tx.commit().await?;

        Ok(usages)
    }
}

#[automock]
#[async_trait]
pub trait PromotionsService: Send + Sync {
    /// Creates a new promotion.
    async fn create_promotion(
        &self,
        promotion: NewPromotion,
    ) -> Result<PromotionRecord, PromotionsServiceError>;

    /// Retrieve a single promotion.
    async fn get_promotion(
        &self,
        promotion: PromotionUuid,
    ) -> Result<PromotionRecord, PromotionsServiceError>;

    /// Retrieve a promotion by its promo code.
    async fn get_promotion_by_code(
        &self,
        code: String,
    ) -> Result<PromotionRecord, PromotionsServiceError>;

    /// Switches a promotion on or off.
    async fn set_active(
        &self,
        promotion: PromotionUuid,
        active: bool,
    ) -> Result<PromotionRecord, PromotionsServiceError>;

    /// Use a promotion against an order total.
    ///
    /// On success one use is counted and a usage record holding the discount
    /// is stored. Nothing is written when the promotion is invalid, the
    /// customer has used it up, or the total is under its minimum.
    async fn apply_promotion(
        &self,
        request: ApplyPromotion,
        now: Timestamp,
    ) -> Result<AppliedPromotion, PromotionsServiceError>;

    /// Give back the uses recorded against an order.
    async fn release_order_usages(
        &self,
        order: OrderUuid,
        now: Timestamp,
    ) -> Result<Vec<PromotionUsageRecord>, PromotionsServiceError>;

    /// Usages recorded against an order, released ones included.
    async fn list_order_usages(
        &self,
        order: OrderUuid,
    ) -> Result<Vec<PromotionUsageRecord>, PromotionsServiceError>;
}
