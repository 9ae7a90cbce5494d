//! Tiers Repository

use hearth::loyalty::{LoyaltyTier, TierPerks};
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::loyalty::{
    data::NewTier,
    records::{TierRecord, TierUuid},
};

const CREATE_TIER_SQL: &str = include_str!("../sql/create_tier.sql");
const LIST_TIERS_SQL: &str = include_str!("../sql/list_tiers.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgTiersRepository;

impl PgTiersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_tier(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tier: NewTier,
    ) -> Result<TierRecord, sqlx::Error> {
        let NewTier { uuid, tier } = tier;

        query_as::<Postgres, TierRecord>(CREATE_TIER_SQL)
            .bind(uuid.into_uuid())
            .bind(tier.name)
            .bind(tier.points_threshold)
            .bind(tier.points_multiplier)
            .bind(tier.perks.free_shipping)
            .bind(tier.perks.discount_percentage)
            .bind(tier.active)
            .fetch_one(&mut **tx)
            .await
    }

    /// All tiers, inactive ones included, lowest threshold first.
    pub(crate) async fn list_tiers(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<TierRecord>, sqlx::Error> {
        query_as::<Postgres, TierRecord>(LIST_TIERS_SQL)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for TierRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let tier = LoyaltyTier::new(
            row.try_get::<String, _>("name")?,
            row.try_get("points_threshold")?,
            row.try_get("points_multiplier")?,
        )
        .with_perks(TierPerks {
            free_shipping: row.try_get("free_shipping")?,
            discount_percentage: row.try_get("discount_percentage")?,
        })
        .with_active(row.try_get("active")?);

        Ok(Self {
            uuid: TierUuid::from_uuid(row.try_get("uuid")?),
            tier,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
