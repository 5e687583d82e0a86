//! Points record entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::PointsRecord;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the append-only points_records table.
#[derive(Debug, Clone, FromRow)]
pub struct PointsRecordEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub points: i32,
    pub reason: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<PointsRecordEntity> for PointsRecord {
    fn from(entity: PointsRecordEntity) -> Self {
        PointsRecord {
            id: entity.id,
            user_id: entity.user_id,
            points: entity.points,
            reason: entity.reason,
            metadata: entity.metadata,
            created_at: entity.created_at,
        }
    }
}
