//! Orders Repository

use hearth::orders::{OrderStatus, OrderTotals};
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::{
    database::{try_get_amount, try_i64_from_u64},
    domain::{
        customers::CustomerUuid,
        orders::records::{OrderRecord, OrderUuid},
        promotions::records::PromotionUuid,
    },
};

const CREATE_ORDER_SQL: &str = include_str!("../sql/create_order.sql");
const GET_ORDER_SQL: &str = include_str!("../sql/get_order.sql");
const LOCK_ORDER_SQL: &str = include_str!("../sql/lock_order.sql");
const LIST_CUSTOMER_ORDERS_SQL: &str = include_str!("../sql/list_customer_orders.sql");
const UPDATE_ORDER_TOTALS_SQL: &str = include_str!("../sql/update_order_totals.sql");
const TRANSITION_ORDER_SQL: &str = include_str!("../sql/transition_order.sql");

/// Reconciled amounts to store on an order, in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OrderAmounts {
    pub subtotal: u64,
    pub tax: u64,
    pub shipping: u64,
    pub discount: u64,
    pub total: u64,
}

impl TryFrom<&OrderTotals<'_>> for OrderAmounts {
    type Error = std::num::TryFromIntError;

    fn try_from(totals: &OrderTotals<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            subtotal: u64::try_from(totals.subtotal.to_minor_units())?,
            tax: u64::try_from(totals.tax.to_minor_units())?,
            shipping: u64::try_from(totals.shipping.to_minor_units())?,
            discount: u64::try_from(totals.discount.to_minor_units())?,
            total: u64::try_from(totals.total.to_minor_units())?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        customer: CustomerUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(CREATE_ORDER_SQL)
            .bind(order.into_uuid())
            .bind(customer.into_uuid())
            .bind(OrderStatus::Pending.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Fetch an order and hold its row lock until the transaction ends.
    pub(crate) async fn lock_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LOCK_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_customer_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LIST_CUSTOMER_ORDERS_SQL)
            .bind(customer.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    /// Store new totals on a pending order.
    ///
    /// Returns `None` when the order is no longer pending.
    pub(crate) async fn update_totals(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        amounts: OrderAmounts,
        promotion: Option<PromotionUuid>,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(UPDATE_ORDER_TOTALS_SQL)
            .bind(order.into_uuid())
            .bind(OrderStatus::Pending.as_str())
            .bind(try_i64_from_u64(amounts.subtotal, "subtotal")?)
            .bind(try_i64_from_u64(amounts.tax, "tax")?)
            .bind(try_i64_from_u64(amounts.shipping, "shipping")?)
            .bind(try_i64_from_u64(amounts.discount, "discount")?)
            .bind(try_i64_from_u64(amounts.total, "total")?)
            .bind(promotion.map(PromotionUuid::into_uuid))
            .fetch_optional(&mut **tx)
            .await
    }

    /// Move an order from `from` to `to`.
    ///
    /// Returns `None` when the order's status is no longer `from`.
    pub(crate) async fn transition(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(TRANSITION_ORDER_SQL)
            .bind(order.into_uuid())
            .bind(from.as_str())
            .bind(to.as_str())
            .fetch_optional(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;

        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            customer: CustomerUuid::from_uuid(row.try_get("customer_uuid")?),
            status,
            subtotal: try_get_amount(row, "subtotal")?,
            tax: try_get_amount(row, "tax")?,
            shipping: try_get_amount(row, "shipping")?,
            discount: try_get_amount(row, "discount")?,
            total: try_get_amount(row, "total")?,
            promotion: row
                .try_get::<Option<Uuid>, _>("promotion_uuid")?
                .map(PromotionUuid::from_uuid),
            items: Vec::new(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
