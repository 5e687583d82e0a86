//! Points ledger repository.

use async_trait::async_trait;
use domain::models::{PointsAward, PointsRecord};
use domain::services::{RewardsLedger, StoreError};
use sqlx::PgPool;

use crate::db_error;
use crate::entities::PointsRecordEntity;
use crate::metrics::QueryTimer;

/// Repository for points balances and their audit records.
#[derive(Clone)]
pub struct PointsRepository {
    pool: PgPool,
}

impl PointsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RewardsLedger for PointsRepository {
    async fn award_points(&self, award: PointsAward) -> Result<PointsRecord, StoreError> {
        let timer = QueryTimer::new("award_points");

        // Balance and audit record move together.
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let updated = sqlx::query("UPDATE users SET points = points + $2, updated_at = NOW() WHERE id = $1")
            .bind(award.user_id)
            .bind(i64::from(award.points))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::Database(format!(
                "user {} not found for points award",
                award.user_id
            )));
        }

        let record = sqlx::query_as::<_, PointsRecordEntity>(
            r#"
            INSERT INTO points_records (user_id, points, reason, metadata)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, points, reason, metadata, created_at
            "#,
        )
        .bind(award.user_id)
        .bind(award.points)
        .bind(&award.reason)
        .bind(&award.metadata)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        timer.record();

        Ok(record.into())
    }
}
