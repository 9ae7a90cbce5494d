//! Promotions Repository

use hearth::promotions::{DiscountKind, scope::PromotionScope};
use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    database::{
        try_get_count, try_get_optional_amount, try_i32_from_u32, try_i64_from_u64,
    },
    domain::promotions::{
        data::{NewPromotion, PromotionDiscount},
        records::{PromotionRecord, PromotionUuid},
    },
};

const COLUMN_DISCOUNT_AMOUNT: &str = "discount_amount";
const COLUMN_MINIMUM_ORDER_VALUE: &str = "minimum_order_value";
const COLUMN_MAXIMUM_DISCOUNT: &str = "maximum_discount";
const COLUMN_USAGE_LIMIT: &str = "usage_limit";

const CREATE_PROMOTION_SQL: &str = include_str!("../sql/create_promotion.sql");
const GET_PROMOTION_SQL: &str = include_str!("../sql/get_promotion.sql");
const GET_PROMOTION_BY_CODE_SQL: &str = include_str!("../sql/get_promotion_by_code.sql");
const SET_PROMOTION_ACTIVE_SQL: &str = include_str!("../sql/set_promotion_active.sql");
const CLAIM_PROMOTION_USAGE_SQL: &str = include_str!("../sql/claim_promotion_usage.sql");
const RELEASE_PROMOTION_USAGE_SQL: &str = include_str!("../sql/release_promotion_usage.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPromotionsRepository;

impl PgPromotionsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_promotion(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: NewPromotion,
    ) -> Result<PromotionRecord, sqlx::Error> {
        let (category, product) = scope_columns(promotion.scope);

        let discount_amount = promotion
            .discount
            .amount()
            .map(|amount| try_i64_from_u64(amount, COLUMN_DISCOUNT_AMOUNT))
            .transpose()?;

        let minimum_order_value = promotion
            .minimum_order_value
            .map(|amount| try_i64_from_u64(amount, COLUMN_MINIMUM_ORDER_VALUE))
            .transpose()?;

        let maximum_discount = promotion
            .maximum_discount
            .map(|amount| try_i64_from_u64(amount, COLUMN_MAXIMUM_DISCOUNT))
            .transpose()?;

        let usage_limit = promotion
            .usage_limit
            .map(|limit| try_i32_from_u32(limit, COLUMN_USAGE_LIMIT))
            .transpose()?;

        query_as::<Postgres, PromotionRecord>(CREATE_PROMOTION_SQL)
            .bind(promotion.uuid.into_uuid())
            .bind(promotion.code)
            .bind(promotion.discount.kind().as_str())
            .bind(promotion.discount.percentage())
            .bind(discount_amount)
            .bind(minimum_order_value)
            .bind(maximum_discount)
            .bind(usage_limit)
            .bind(SqlxTimestamp::from(promotion.starts_at))
            .bind(promotion.ends_at.map(SqlxTimestamp::from))
            .bind(promotion.active)
            .bind(category)
            .bind(product)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_promotion(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: PromotionUuid,
    ) -> Result<PromotionRecord, sqlx::Error> {
        query_as::<Postgres, PromotionRecord>(GET_PROMOTION_SQL)
            .bind(promotion.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_promotion_by_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<PromotionRecord, sqlx::Error> {
        query_as::<Postgres, PromotionRecord>(GET_PROMOTION_BY_CODE_SQL)
            .bind(code)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_active(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: PromotionUuid,
        active: bool,
    ) -> Result<PromotionRecord, sqlx::Error> {
        query_as::<Postgres, PromotionRecord>(SET_PROMOTION_ACTIVE_SQL)
            .bind(promotion.into_uuid())
            .bind(active)
            .fetch_one(&mut **tx)
            .await
    }

    /// Count one use unless the promotion is inactive or its limit is reached.
    ///
    /// Returns whether the use was counted.
    pub(crate) async fn claim_usage(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: PromotionUuid,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(CLAIM_PROMOTION_USAGE_SQL)
            .bind(promotion.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected == 1)
    }

    pub(crate) async fn release_usage(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: PromotionUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(RELEASE_PROMOTION_USAGE_SQL)
            .bind(promotion.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn scope_columns(scope: PromotionScope) -> (Option<String>, Option<Uuid>) {
    match scope {
        PromotionScope::Order => (None, None),
        PromotionScope::Category(category) => (Some(category), None),
        PromotionScope::Product(product) => (None, Some(product)),
    }
}

fn decode_error(column: &str, message: String) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: message.into(),
    }
}

impl<'r> FromRow<'r, PgRow> for PromotionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let kind: String = row.try_get("discount_kind")?;

        let kind = kind
            .parse::<DiscountKind>()
            .map_err(|e| decode_error("discount_kind", e.to_string()))?;

        let percentage: Option<Decimal> = row.try_get("discount_percentage")?;
        let amount = try_get_optional_amount(row, COLUMN_DISCOUNT_AMOUNT)?;

        let discount = PromotionDiscount::from_columns(kind, percentage, amount)
            .ok_or_else(|| decode_error("discount_kind", format!("{kind} discount has no value")))?;

        let category: Option<String> = row.try_get("category")?;
        let product: Option<Uuid> = row.try_get("product_uuid")?;

        let scope = match (category, product) {
            (Some(category), _) => PromotionScope::Category(category),
            (None, Some(product)) => PromotionScope::Product(product),
            (None, None) => PromotionScope::Order,
        };

        let usage_limit: Option<i32> = row.try_get(COLUMN_USAGE_LIMIT)?;

        let usage_limit = usage_limit
            .map(u32::try_from)
            .transpose()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: COLUMN_USAGE_LIMIT.to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            uuid: PromotionUuid::from_uuid(row.try_get("uuid")?),
            code: row.try_get("code")?,
            discount,
            minimum_order_value: try_get_optional_amount(row, COLUMN_MINIMUM_ORDER_VALUE)?,
            maximum_discount: try_get_optional_amount(row, COLUMN_MAXIMUM_DISCOUNT)?,
            usage_limit,
            usage_count: try_get_count(row, "usage_count")?,
            starts_at: row.try_get::<SqlxTimestamp, _>("starts_at")?.to_jiff(),
            ends_at: row
                .try_get::<Option<SqlxTimestamp>, _>("ends_at")?
                .map(SqlxTimestamp::to_jiff),
            active: row.try_get("active")?,
            scope,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
