//! Orders Service

use async_trait::async_trait;
use hearth::orders::{Charges, OrderStatus, OrderTotals, TotalsError};
use jiff::Timestamp;
use mockall::automock;
use rusty_money::Money;
use sqlx::{Postgres, Transaction};
use tracing::{Span, info};

use crate::{
    config::Pricing,
    database::Db,
    domain::{
        customers::CustomerUuid,
        loyalty::points::PointsLedger,
        orders::{
            OrdersServiceError,
            data::{NewOrder, NewOrderItem},
            records::{OrderItemRecord, OrderRecord, OrderUuid},
            repositories::{OrderAmounts, PgOrderItemsRepository, PgOrdersRepository, PricedItem},
        },
        products::repository::PgProductsRepository,
        promotions::{
            records::PromotionUuid,
            redemption::{DiscountBase, PromotionRedemptions},
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    pricing: Pricing,
    orders: PgOrdersRepository,
    items: PgOrderItemsRepository,
    products: PgProductsRepository,
    redemptions: PromotionRedemptions,
    points: PointsLedger,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db, pricing: Pricing) -> Self {
        Self {
            db,
            pricing,
            orders: PgOrdersRepository::new(),
            items: PgOrderItemsRepository::new(),
            products: PgProductsRepository::new(),
            redemptions: PromotionRedemptions::new(pricing),
            points: PointsLedger::new(pricing),
        }
    }

    /// Snapshot the product's current price onto a new item.
    async fn price_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: NewOrderItem,
    ) -> Result<PricedItem, OrdersServiceError> {
        if item.quantity == 0 {
            return Err(OrdersServiceError::InvalidQuantity);
        }

        let product = match self.products.get_product(tx, item.product).await {
            Ok(product) => product,
            Err(sqlx::Error::RowNotFound) => {
                return Err(OrdersServiceError::UnknownProduct(item.product));
            }
            Err(error) => return Err(error.into()),
        };

        let total_price = product
            .price
            .checked_mul(u64::from(item.quantity))
            .ok_or(TotalsError::Overflow)?;

        Ok(PricedItem {
            uuid: item.uuid,
            product: item.product,
            category: product.category,
            quantity: item.quantity,
            unit_price: product.price,
            total_price,
        })
    }

    /// Recompute and store a pending order's totals from its items.
    ///
    /// Shipping is waived when the customer's tier carries free shipping.
    async fn reconcile(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderRecord,
        discount: u64,
        promotion: Option<PromotionUuid>,
        now: Timestamp,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let currency = self.pricing.currency;
        let lines = order.lines(currency)?;

        let free_shipping = self
            .points
            .tier_at(tx, order.customer, now)
            .await?
            .is_some_and(|tier| tier.tier.perks.free_shipping);

        let shipping = if free_shipping {
            0
        } else {
            self.pricing.shipping_fee
        };

        let charges = Charges {
            tax_rate: self.pricing.tax_rate,
            shipping: Money::from_minor(i64::try_from(shipping)?, currency),
            discount: Money::from_minor(i64::try_from(discount)?, currency),
        };

        let totals = OrderTotals::reconcile(currency, &lines, &charges)?;
        let amounts = OrderAmounts::try_from(&totals)?;

        let mut updated = self
            .orders
            .update_totals(tx, order.uuid, amounts, promotion)
            .await?
            .ok_or(OrdersServiceError::StatusChanged)?;

        updated.items = order.items;

        Ok(updated)
    }

    async fn load_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        mut order: OrderRecord,
    ) -> Result<OrderRecord, OrdersServiceError> {
        order.items = self.items.list_items(tx, order.uuid).await?;

        Ok(order)
    }

    /// Lock a pending order and load its items.
    async fn lock_pending(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let record = self.orders.lock_order(tx, order).await?;

        if record.status != OrderStatus::Pending {
            return Err(OrdersServiceError::NotPending(record.status));
        }

        self.load_items(tx, record).await
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(
        name = "orders.service.create_order",
        skip(self, order),
        fields(
            order_uuid = %order.uuid,
            customer_uuid = %order.customer,
            item_count = order.items.len(),
            total = tracing::field::Empty,
        ),
        err
    )]
    async fn create_order(
        &self,
        order: NewOrder,
        now: Timestamp,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let mut record = self
            .orders
            .create_order(&mut tx, order.uuid, order.customer)
            .await?;

        let mut items: Vec<OrderItemRecord> = Vec::with_capacity(order.items.len());

        for item in order.items {
            let priced = self.price_item(&mut tx, item).await?;

            items.push(self.items.create_item(&mut tx, order.uuid, priced).await?);
        }

        record.items = items;

        let record = self.reconcile(&mut tx, record, 0, None, now).await?;

        tx.commit().await?;

        Span::current().record("total", record.total);

        info!(order_uuid = %record.uuid, total = record.total, "created order");

        Ok(record)
    }

    async fn get_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let record = self.orders.get_order(&mut tx, order).await?;
        let record = self.load_items(&mut tx, record).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn list_customer_orders(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let records = self.orders.list_customer_orders(&mut tx, customer).await?;

        let mut orders = Vec::with_capacity(records.len());

        for record in records {
            orders.push(self.load_items(&mut tx, record).await?);
        }

        tx.commit().await?;

        Ok(orders)
    }

    #[tracing::instrument(
        name = "orders.service.add_item",
        skip(self, order, item),
        fields(order_uuid = %order, product_uuid = %item.product, quantity = item.quantity),
        err
    )]
    async fn add_item(
        &self,
        order: OrderUuid,
        item: NewOrderItem,
        now: Timestamp,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let mut record = self.lock_pending(&mut tx, order).await?;

        let priced = self.price_item(&mut tx, item).await?;
        let created = self.items.create_item(&mut tx, order, priced).await?;

        record.items.push(created);

        let (mut discount, promotion) = (record.discount, record.promotion);

        if let Some(promotion) = promotion {
            let lines = record.lines(self.pricing.currency)?;

            discount = self
                .redemptions
                .reprice(&mut tx, promotion, order, &lines)
                .await?
                .discount_amount;
        }

        let record = self
            .reconcile(&mut tx, record, discount, promotion, now)
            .await?;

        tx.commit().await?;

        info!(order_uuid = %record.uuid, total = record.total, "added order item");

        Ok(record)
    }

    #[tracing::instrument(
        name = "orders.service.apply_promotion",
        skip(self, order, code),
        fields(order_uuid = %order, promotion_uuid = tracing::field::Empty),
        err
    )]
    async fn apply_promotion(
        &self,
        order: OrderUuid,
        code: String,
        now: Timestamp,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let record = self.lock_pending(&mut tx, order).await?;

        if record.promotion.is_some() {
            return Err(OrdersServiceError::PromotionAlreadyApplied);
        }

        let lines = record.lines(self.pricing.currency)?;

        let redemption = self
            .redemptions
            .redeem(
                &mut tx,
                &code,
                record.customer,
                order,
                DiscountBase::Lines(&lines),
                now,
            )
            .await?;

        Span::current().record(
            "promotion_uuid",
            tracing::field::display(redemption.promotion.uuid),
        );

        let record = self
            .reconcile(
                &mut tx,
                record,
                redemption.usage.discount_amount,
                Some(redemption.promotion.uuid),
                now,
            )
            .await?;

        tx.commit().await?;

        info!(
            order_uuid = %record.uuid,
            discount = record.discount,
            total = record.total,
            "applied promotion to order"
        );

        Ok(record)
    }

    #[tracing::instrument(
        name = "orders.service.transition",
        skip(self, order),
        fields(order_uuid = %order, to = %next, from = tracing::field::Empty),
        err
    )]
    async fn transition(
        &self,
        order: OrderUuid,
        next: OrderStatus,
        now: Timestamp,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self.orders.lock_order(&mut tx, order).await?;

        Span::current().record("from", tracing::field::display(current.status));

        let next = current.status.transition(next)?;

        let updated = self
            .orders
            .transition(&mut tx, order, current.status, next)
            .await?
            .ok_or(OrdersServiceError::StatusChanged)?;

        if next == OrderStatus::Completed {
            self.points
                .award_once(&mut tx, updated.customer, order, updated.total, now)
                .await?;
        } else if next.reverses_rewards() {
            // Promotion rows are locked before the loyalty ledger, as in apply_promotion.
            self.redemptions.release(&mut tx, order, now).await?;

            self.points
                .reverse(&mut tx, updated.customer, order, now)
                .await?;
        }

        let updated = self.load_items(&mut tx, updated).await?;

        tx.commit().await?;

        info!(order_uuid = %updated.uuid, status = %updated.status, "changed order status");

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Creates a pending order, pricing each item at its product's current price.
    async fn create_order(
        &self,
        order: NewOrder,
        now: Timestamp,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Retrieve a single order with its items.
    async fn get_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError>;

    /// A customer's orders, oldest first.
    async fn list_customer_orders(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Adds an item to a pending order and reconciles its totals.
    async fn add_item(
        &self,
        order: OrderUuid,
        item: NewOrderItem,
        now: Timestamp,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Uses a promotion on a pending order.
    async fn apply_promotion(
        &self,
        order: OrderUuid,
        code: String,
        now: Timestamp,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Moves an order to another status.
    ///
    /// Completing an order awards loyalty points. Cancelling or refunding it takes
    /// those points back and releases its promotion use.
    async fn transition(
        &self,
        order: OrderUuid,
        next: OrderStatus,
        now: Timestamp,
    ) -> Result<OrderRecord, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use hearth::{
        loyalty::{LoyaltyTier, TierPerks, TransactionKind},
        orders::TransitionError,
        promotions::{InvalidReason, scope::PromotionScope},
    };
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{
        domain::{
            loyalty::{LoyaltyService, data::NewTier},
            products::{ProductsService, records::ProductUuid},
            promotions::{
                PromotionsService, PromotionsServiceError,
                data::{NewPromotion, PromotionDiscount},
            },
        },
        test::{TestContext, helpers::{create_product, instant}},
    };

    use super::*;

    fn now() -> Timestamp {
        instant("2026-02-01T12:00:00Z")
    }

    struct Basket {
        loaf: ProductUuid,
        cake: ProductUuid,
    }

    async fn basket(ctx: &TestContext) -> TestResult<Basket> {
        let loaf = create_product(ctx, "Sourdough loaf", Some("bread"), 450).await?;
        let cake = create_product(ctx, "Lemon drizzle", Some("cakes"), 1_800).await?;

        Ok(Basket {
            loaf: loaf.uuid,
            cake: cake.uuid,
        })
    }

    async fn order(
        ctx: &TestContext,
        customer: CustomerUuid,
        basket: &Basket,
    ) -> Result<OrderRecord, OrdersServiceError> {
        ctx.orders
            .create_order(
                NewOrder {
                    uuid: OrderUuid::new(),
                    customer,
                    items: vec![
                        NewOrderItem::new(basket.loaf, 2),
                        NewOrderItem::new(basket.cake, 1),
                    ],
                },
                now(),
            )
            .await
    }

    async fn bread_promotion(ctx: &TestContext) -> TestResult<PromotionUuid> {
        let mut promotion = NewPromotion::new(
            "BREAD10",
            PromotionDiscount::Percentage {
                percentage: Decimal::TEN,
            },
            instant("2026-01-01T00:00:00Z"),
        );
        promotion.scope = PromotionScope::Category("bread".to_string());

        Ok(ctx.promotions.create_promotion(promotion).await?.uuid)
    }

    async fn complete(ctx: &TestContext, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError> {
        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
        ] {
            ctx.orders.transition(order, status, now()).await?;
        }

        ctx.orders
            .transition(order, OrderStatus::Completed, now())
            .await
    }

    #[tokio::test]
    async fn create_order_reconciles_totals() -> TestResult {
        let ctx = TestContext::new().await;
        let basket = basket(&ctx).await?;

        let order = order(&ctx, CustomerUuid::new(), &basket).await?;

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.subtotal, 2_700);
        assert_eq!(order.tax, 540);
        assert_eq!(order.shipping, 399);
        assert_eq!(order.discount, 0);
        assert_eq!(order.total, 3_639);
        assert_eq!(order, ctx.orders.get_order(order.uuid).await?);

        Ok(())
    }

    #[tokio::test]
    async fn items_keep_the_price_they_were_added_at() -> TestResult {
        let ctx = TestContext::new().await;
        let basket = basket(&ctx).await?;

        let order = order(&ctx, CustomerUuid::new(), &basket).await?;

        ctx.products.update_price(basket.loaf, 500).await?;

        let order = ctx
            .orders
            .add_item(order.uuid, NewOrderItem::new(basket.loaf, 1), now())
            .await?;

        let prices: Vec<u64> = order.items.iter().map(|item| item.unit_price).collect();

        assert_eq!(prices, vec![450, 1_800, 500]);
        assert_eq!(order.subtotal, 3_200);
        assert_eq!(order.total, order.subtotal + order.tax + order.shipping);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_product_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;

        let result = ctx
            .orders
            .create_order(
                NewOrder {
                    uuid: OrderUuid::new(),
                    customer: CustomerUuid::new(),
                    items: vec![NewOrderItem::new(ProductUuid::new(), 1)],
                },
                now(),
            )
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::UnknownProduct(_))),
            "expected UnknownProduct, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn scoped_promotion_discounts_matching_lines() -> TestResult {
        let ctx = TestContext::new().await;
        let basket = basket(&ctx).await?;
        let promotion = bread_promotion(&ctx).await?;

        let order = order(&ctx, CustomerUuid::new(), &basket).await?;

        let order = ctx
            .orders
            .apply_promotion(order.uuid, "BREAD10".to_string(), now())
            .await?;

        assert_eq!(order.discount, 90);
        assert_eq!(order.total, 3_549);
        assert_eq!(order.promotion, Some(promotion));

        let again = ctx
            .orders
            .apply_promotion(order.uuid, "BREAD10".to_string(), now())
            .await;

        assert!(
            matches!(again, Err(OrdersServiceError::PromotionAlreadyApplied)),
            "expected PromotionAlreadyApplied, got {again:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn promotion_covering_no_items_is_not_redeemed() -> TestResult {
        let ctx = TestContext::new().await;
        let basket = basket(&ctx).await?;

        let mut pastries = NewPromotion::new(
            "PASTRY20",
            PromotionDiscount::Percentage {
                percentage: Decimal::from(20),
            },
            instant("2026-01-01T00:00:00Z"),
        );
        pastries.scope = PromotionScope::Category("pastries".to_string());

        let promotion = ctx.promotions.create_promotion(pastries).await?.uuid;
        let created = order(&ctx, CustomerUuid::new(), &basket).await?;

        let result = ctx
            .orders
            .apply_promotion(created.uuid, "PASTRY20".to_string(), now())
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Promotion(
                    PromotionsServiceError::NoEligibleLines
                ))
            ),
            "expected NoEligibleLines, got {result:?}"
        );
        assert_eq!(ctx.promotions.get_promotion(promotion).await?.usage_count, 0);
        assert!(ctx.promotions.list_order_usages(created.uuid).await?.is_empty());
        assert_eq!(ctx.orders.get_order(created.uuid).await?, created);

        Ok(())
    }

    #[tokio::test]
    async fn adding_items_reprices_the_applied_promotion() -> TestResult {
        let ctx = TestContext::new().await;
        let basket = basket(&ctx).await?;

        bread_promotion(&ctx).await?;

        let order = order(&ctx, CustomerUuid::new(), &basket).await?;

        ctx.orders
            .apply_promotion(order.uuid, "BREAD10".to_string(), now())
            .await?;

        let order = ctx
            .orders
            .add_item(order.uuid, NewOrderItem::new(basket.loaf, 1), now())
            .await?;

        assert_eq!(order.discount, 135);
        assert_eq!(
            order.total,
            order.subtotal + order.tax + order.shipping - order.discount
        );

        let usages = ctx.promotions.list_order_usages(order.uuid).await?;
        let amounts: Vec<u64> = usages.iter().map(|usage| usage.discount_amount).collect();

        assert_eq!(amounts, vec![135]);

        let order = ctx
            .orders
            .add_item(order.uuid, NewOrderItem::new(basket.cake, 1), now())
            .await?;

        assert_eq!(order.discount, 135, "cakes are outside the promotion");

        Ok(())
    }

    #[tokio::test]
    async fn invalid_promotion_leaves_order_untouched() -> TestResult {
        let ctx = TestContext::new().await;
        let basket = basket(&ctx).await?;
        let promotion = bread_promotion(&ctx).await?;

        ctx.promotions.set_active(promotion, false).await?;

        let created = order(&ctx, CustomerUuid::new(), &basket).await?;

        let result = ctx
            .orders
            .apply_promotion(created.uuid, "BREAD10".to_string(), now())
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Promotion(PromotionsServiceError::Invalid(
                    InvalidReason::Inactive
                )))
            ),
            "expected Inactive, got {result:?}"
        );
        assert_eq!(ctx.orders.get_order(created.uuid).await?, created);

        Ok(())
    }

    #[tokio::test]
    async fn completing_an_order_awards_points_on_its_total() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = CustomerUuid::new();
        let basket = basket(&ctx).await?;

        let order = order(&ctx, customer, &basket).await?;
        let completed = complete(&ctx, order.uuid).await?;

        assert_eq!(completed.status, OrderStatus::Completed);
        assert_eq!(ctx.loyalty.current_balance(customer, now()).await?, 36);

        Ok(())
    }

    #[tokio::test]
    async fn completing_an_order_that_already_earned_points() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = CustomerUuid::new();
        let basket = basket(&ctx).await?;

        let order = order(&ctx, customer, &basket).await?;

        ctx.loyalty
            .award_points_for_purchase(customer, order.uuid, order.total, now())
            .await?;

        let completed = complete(&ctx, order.uuid).await?;

        assert_eq!(completed.status, OrderStatus::Completed);

        let history = ctx.loyalty.ledger_history(customer).await?;
        let kinds: Vec<TransactionKind> = history.iter().map(|entry| entry.kind).collect();

        assert_eq!(kinds, vec![TransactionKind::Earn]);
        assert_eq!(ctx.loyalty.current_balance(customer, now()).await?, 36);

        Ok(())
    }

    #[tokio::test]
    async fn skipping_a_status_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let basket = basket(&ctx).await?;

        let order = order(&ctx, CustomerUuid::new(), &basket).await?;

        let result = ctx
            .orders
            .transition(order.uuid, OrderStatus::Completed, now())
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::InvalidTransition(TransitionError {
                    from: OrderStatus::Pending,
                    to: OrderStatus::Completed,
                }))
            ),
            "expected InvalidTransition, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn confirmed_order_cannot_change() -> TestResult {
        let ctx = TestContext::new().await;
        let basket = basket(&ctx).await?;

        let order = order(&ctx, CustomerUuid::new(), &basket).await?;

        ctx.orders
            .transition(order.uuid, OrderStatus::Confirmed, now())
            .await?;

        let result = ctx
            .orders
            .add_item(order.uuid, NewOrderItem::new(basket.cake, 1), now())
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::NotPending(OrderStatus::Confirmed))
            ),
            "expected NotPending, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn cancelling_releases_the_promotion_use() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = CustomerUuid::new();
        let basket = basket(&ctx).await?;
        let promotion = bread_promotion(&ctx).await?;

        let first = order(&ctx, customer, &basket).await?;

        ctx.orders
            .apply_promotion(first.uuid, "BREAD10".to_string(), now())
            .await?;

        let cancelled = ctx
            .orders
            .transition(first.uuid, OrderStatus::Cancelled, now())
            .await?;

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(ctx.promotions.get_promotion(promotion).await?.usage_count, 0);

        let second = order(&ctx, customer, &basket).await?;

        ctx.orders
            .apply_promotion(second.uuid, "BREAD10".to_string(), now())
            .await?;

        let result = ctx
            .orders
            .transition(first.uuid, OrderStatus::Confirmed, now())
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::InvalidTransition(_))),
            "expected InvalidTransition, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn refunding_a_completed_order_takes_points_back() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = CustomerUuid::new();
        let basket = basket(&ctx).await?;

        let order = order(&ctx, customer, &basket).await?;

        complete(&ctx, order.uuid).await?;

        ctx.orders
            .transition(order.uuid, OrderStatus::Refunded, now())
            .await?;

        let history = ctx.loyalty.ledger_history(customer).await?;
        let kinds: Vec<TransactionKind> = history.iter().map(|entry| entry.kind).collect();

        assert_eq!(kinds, vec![TransactionKind::Earn, TransactionKind::Adjust]);
        assert_eq!(ctx.loyalty.current_balance(customer, now()).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn free_shipping_tier_waives_shipping() -> TestResult {
        let ctx = TestContext::new().await;
        let basket = basket(&ctx).await?;

        ctx.loyalty
            .create_tier(NewTier::from(
                LoyaltyTier::new("Everyone", 0, Decimal::ONE).with_perks(TierPerks {
                    free_shipping: true,
                    discount_percentage: None,
                }),
            ))
            .await?;

        let order = order(&ctx, CustomerUuid::new(), &basket).await?;

        assert_eq!(order.shipping, 0);
        assert_eq!(order.total, 3_240);

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_transitions_apply_once() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = CustomerUuid::new();
        let basket = basket(&ctx).await?;

        let order = order(&ctx, customer, &basket).await?;

        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
        ] {
            ctx.orders.transition(order.uuid, status, now()).await?;
        }

        let attempts: Vec<_> = (0..4)
            .map(|_| {
                let service = ctx.orders.clone();
                let uuid = order.uuid;

                tokio::spawn(async move {
                    service
                        .transition(uuid, OrderStatus::Completed, now())
                        .await
                })
            })
            .collect();

        let mut completed = 0;

        for attempt in attempts {
            if attempt.await?.is_ok() {
                completed += 1;
            }
        }

        assert_eq!(completed, 1);
        assert_eq!(ctx.loyalty.ledger_history(customer).await?.len(), 1);

        Ok(())
    }
}
