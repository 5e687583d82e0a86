//! Subscription entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Entitlement, EntitlementStatus, Usage};
use domain::services::StoreError;
use sqlx::FromRow;
use uuid::Uuid;

pub const SUBSCRIPTION_COLUMNS: &str = "id, user_id, plan_id, status, service_calls_used, \
     last_service_call_date, start_date, end_date, amount, created_at";

/// Database row mapping for the subscriptions table.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub status: String,
    pub service_calls_used: i32,
    pub last_service_call_date: Option<DateTime<Utc>>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionEntity> for Entitlement {
    type Error = StoreError;

    fn try_from(entity: SubscriptionEntity) -> Result<Self, Self::Error> {
        let status = entity
            .status
            .parse::<EntitlementStatus>()
            .map_err(StoreError::Corrupt)?;

        Ok(Entitlement {
            id: entity.id,
            user_id: entity.user_id,
            plan_id: entity.plan_id,
            status,
            usage: Usage {
                service_calls_used: entity.service_calls_used,
                last_service_call_date: entity.last_service_call_date,
            },
            start_date: entity.start_date,
            end_date: entity.end_date,
            amount: entity.amount,
            created_at: entity.created_at,
        })
    }
}
