//! Rewards Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::loyalty::{
    data::NewReward,
    records::{RewardRecord, RewardUuid},
};

const CREATE_REWARD_SQL: &str = include_str!("../sql/create_reward.sql");
const GET_REWARD_SQL: &str = include_str!("../sql/get_reward.sql");
const LIST_REWARDS_SQL: &str = include_str!("../sql/list_rewards.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgRewardsRepository;

impl PgRewardsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_reward(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        reward: NewReward,
    ) -> Result<RewardRecord, sqlx::Error> {
        query_as::<Postgres, RewardRecord>(CREATE_REWARD_SQL)
            .bind(reward.uuid.into_uuid())
            .bind(reward.name)
            .bind(reward.points_cost)
            .bind(reward.active)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_reward(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        reward: RewardUuid,
    ) -> Result<RewardRecord, sqlx::Error> {
        query_as::<Postgres, RewardRecord>(GET_REWARD_SQL)
            .bind(reward.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Active rewards, cheapest first.
    pub(crate) async fn list_rewards(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<RewardRecord>, sqlx::Error> {
        query_as::<Postgres, RewardRecord>(LIST_REWARDS_SQL)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for RewardRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: RewardUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            points_cost: row.try_get("points_cost")?,
            active: row.try_get("active")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
