//! Subscription repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{Entitlement, NewEntitlement, Usage};
use domain::services::{EntitlementStore, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db_error;
use crate::entities::subscription::{SubscriptionEntity, SUBSCRIPTION_COLUMNS};
use crate::metrics::QueryTimer;

/// Repository for subscription (entitlement) database operations.
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    /// Creates a new SubscriptionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntitlementStore for SubscriptionRepository {
    async fn find_current(&self, user_id: Uuid) -> Result<Option<Entitlement>, StoreError> {
        let timer = QueryTimer::new("find_current_subscription");
        let result = sqlx::query_as::<_, SubscriptionEntity>(&format!(
            r#"
            SELECT {SUBSCRIPTION_COLUMNS}
            FROM subscriptions
            WHERE user_id = $1 AND status IN ('active', 'trial')
            ORDER BY created_at ASC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map_err(db_error)?
            .map(Entitlement::try_from)
            .transpose()
    }

    async fn create_entitlement(&self, new: NewEntitlement) -> Result<Entitlement, StoreError> {
        let timer = QueryTimer::new("create_subscription");
        let result = sqlx::query_as::<_, SubscriptionEntity>(&format!(
            r#"
            INSERT INTO subscriptions (user_id, plan_id, status, start_date, end_date, amount)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(new.plan_id)
        .bind(new.status.as_str())
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.amount)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result.map_err(db_error)?.try_into()
    }

    async fn repair_plan(&self, entitlement_id: Uuid, plan_id: Uuid) -> Result<(), StoreError> {
        let timer = QueryTimer::new("repair_subscription_plan");
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET plan_id = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(entitlement_id)
        .bind(plan_id)
        .execute(&self.pool)
        .await;
        timer.record();

        result.map_err(db_error)?;
        Ok(())
    }

    async fn record_service_call(
        &self,
        entitlement_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Usage, StoreError> {
        let timer = QueryTimer::new("record_subscription_service_call");
        let result = sqlx::query_as::<_, (i32, Option<DateTime<Utc>>)>(
            r#"
            UPDATE subscriptions
            SET service_calls_used = service_calls_used + 1,
                last_service_call_date = $2,
                updated_at = $2
            WHERE id = $1
            RETURNING service_calls_used, last_service_call_date
            "#,
        )
        .bind(entitlement_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        let (service_calls_used, last_service_call_date) = result
            .map_err(db_error)?
            .ok_or_else(|| StoreError::Database(format!("subscription {} not found", entitlement_id)))?;

        Ok(Usage {
            service_calls_used,
            last_service_call_date,
        })
    }
}
