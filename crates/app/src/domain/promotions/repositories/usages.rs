//! Promotion Usages Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar};

use crate::{
    database::{try_get_amount, try_i64_from_u64},
    domain::{
        customers::CustomerUuid,
        orders::records::OrderUuid,
        promotions::records::{PromotionUsageRecord, PromotionUsageUuid, PromotionUuid},
    },
};

const COLUMN_DISCOUNT_AMOUNT: &str = "discount_amount";

const CREATE_PROMOTION_USAGE_SQL: &str = include_str!("../sql/create_promotion_usage.sql");
const COUNT_CUSTOMER_USAGES_SQL: &str = include_str!("../sql/count_customer_usages.sql");
const RELEASE_ORDER_USAGES_SQL: &str = include_str!("../sql/release_order_usages.sql");
const LIST_ORDER_USAGES_SQL: &str = include_str!("../sql/list_order_usages.sql");
const REPRICE_ORDER_USAGE_SQL: &str = include_str!("../sql/reprice_order_usage.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPromotionUsagesRepository;

impl PgPromotionUsagesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_usage(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        usage: &PromotionUsageRecord,
    ) -> Result<PromotionUsageRecord, sqlx::Error> {
        query_as::<Postgres, PromotionUsageRecord>(CREATE_PROMOTION_USAGE_SQL)
            .bind(usage.uuid.into_uuid())
            .bind(usage.promotion.into_uuid())
            .bind(usage.customer.into_uuid())
            .bind(usage.order.into_uuid())
            .bind(try_i64_from_u64(usage.discount_amount, COLUMN_DISCOUNT_AMOUNT)?)
            .bind(SqlxTimestamp::from(usage.used_at))
            .fetch_one(&mut **tx)
            .await
    }

    /// Uses of a promotion by one customer that have not been released.
    pub(crate) async fn count_customer_usages(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: PromotionUuid,
        customer: CustomerUuid,
    ) -> Result<u64, sqlx::Error> {
        let count: i64 = query_scalar(COUNT_CUSTOMER_USAGES_SQL)
            .bind(promotion.into_uuid())
            .bind(customer.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Mark every open usage on an order as released.
    pub(crate) async fn release_order_usages(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        released_at: Timestamp,
    ) -> Result<Vec<PromotionUsageRecord>, sqlx::Error> {
        query_as::<Postgres, PromotionUsageRecord>(RELEASE_ORDER_USAGES_SQL)
            .bind(order.into_uuid())
            .bind(SqlxTimestamp::from(released_at))
            .fetch_all(&mut **tx)
            .await
    }

    /// Record a new discount amount on the open usage of a promotion by an order.
    pub(crate) async fn reprice_order_usage(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: PromotionUuid,
        order: OrderUuid,
        discount_amount: u64,
    ) -> Result<PromotionUsageRecord, sqlx::Error> {
        query_as::<Postgres, PromotionUsageRecord>(REPRICE_ORDER_USAGE_SQL)
            .bind(promotion.into_uuid())
            .bind(order.into_uuid())
            .bind(try_i64_from_u64(discount_amount, COLUMN_DISCOUNT_AMOUNT)?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_order_usages(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<PromotionUsageRecord>, sqlx::Error> {
        query_as::<Postgres, PromotionUsageRecord>(LIST_ORDER_USAGES_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for PromotionUsageRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: PromotionUsageUuid::from_uuid(row.try_get("uuid")?),
            promotion: PromotionUuid::from_uuid(row.try_get("promotion_uuid")?),
            customer: CustomerUuid::from_uuid(row.try_get("customer_uuid")?),
            order: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            discount_amount: try_get_amount(row, COLUMN_DISCOUNT_AMOUNT)?,
            used_at: row.try_get::<SqlxTimestamp, _>("used_at")?.to_jiff(),
            released_at: row
                .try_get::<Option<SqlxTimestamp>, _>("released_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
