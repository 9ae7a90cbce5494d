//! Ledger Repository

use hearth::loyalty::TransactionKind;
use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar};
use uuid::Uuid;

use crate::domain::{
    customers::CustomerUuid,
    loyalty::records::{LedgerEntryRecord, LedgerEntryUuid, RewardUuid},
    orders::records::OrderUuid,
};

const CREATE_ENTRY_SQL: &str = include_str!("../sql/create_entry.sql");
const LIST_CUSTOMER_ENTRIES_SQL: &str = include_str!("../sql/list_customer_entries.sql");
const FIND_ORDER_ENTRY_SQL: &str = include_str!("../sql/find_order_entry.sql");
const LIST_CUSTOMERS_WITH_LAPSED_POINTS_SQL: &str =
    include_str!("../sql/list_customers_with_lapsed_points.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgLedgerRepository;

impl PgLedgerRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_entry(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entry: &LedgerEntryRecord,
    ) -> Result<LedgerEntryRecord, sqlx::Error> {
        query_as::<Postgres, LedgerEntryRecord>(CREATE_ENTRY_SQL)
            .bind(entry.uuid.into_uuid())
            .bind(entry.customer.into_uuid())
            .bind(entry.kind.as_str())
            .bind(entry.points)
            .bind(entry.total_points)
            .bind(entry.order.map(OrderUuid::into_uuid))
            .bind(entry.reward.map(RewardUuid::into_uuid))
            .bind(entry.expires_entry.map(LedgerEntryUuid::into_uuid))
            .bind(entry.expires_at.map(SqlxTimestamp::from))
            .bind(SqlxTimestamp::from(entry.created_at))
            .fetch_one(&mut **tx)
            .await
    }

    /// A customer's entries in the order they were appended.
    pub(crate) async fn list_customer_entries(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
    ) -> Result<Vec<LedgerEntryRecord>, sqlx::Error> {
        query_as::<Postgres, LedgerEntryRecord>(LIST_CUSTOMER_ENTRIES_SQL)
            .bind(customer.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn find_order_entry(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        kind: TransactionKind,
    ) -> Result<Option<LedgerEntryRecord>, sqlx::Error> {
        query_as::<Postgres, LedgerEntryRecord>(FIND_ORDER_ENTRY_SQL)
            .bind(order.into_uuid())
            .bind(kind.as_str())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Customers holding a lot that lapsed by `now` and has not been written off.
    pub(crate) async fn list_customers_with_lapsed_points(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        now: Timestamp,
    ) -> Result<Vec<CustomerUuid>, sqlx::Error> {
        let customers: Vec<Uuid> = query_scalar(LIST_CUSTOMERS_WITH_LAPSED_POINTS_SQL)
            .bind(SqlxTimestamp::from(now))
            .fetch_all(&mut **tx)
            .await?;

        Ok(customers.into_iter().map(CustomerUuid::from_uuid).collect())
    }
}

impl<'r> FromRow<'r, PgRow> for LedgerEntryRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let kind: String = row.try_get("kind")?;

        let kind = kind
            .parse::<TransactionKind>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "kind".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            uuid: LedgerEntryUuid::from_uuid(row.try_get("uuid")?),
            customer: CustomerUuid::from_uuid(row.try_get("customer_uuid")?),
            kind,
            points: row.try_get("points")?,
            total_points: row.try_get("total_points")?,
            order: row
                .try_get::<Option<Uuid>, _>("order_uuid")?
                .map(OrderUuid::from_uuid),
            reward: row
                .try_get::<Option<Uuid>, _>("reward_uuid")?
                .map(RewardUuid::from_uuid),
            expires_entry: row
                .try_get::<Option<Uuid>, _>("expires_entry_uuid")?
                .map(LedgerEntryUuid::from_uuid),
            expires_at: row
                .try_get::<Option<SqlxTimestamp>, _>("expires_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
