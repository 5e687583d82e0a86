//! SOS alert entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Alert, AlertStatus, GeoPoint, Priority};
use domain::services::StoreError;
use sqlx::FromRow;
use uuid::Uuid;

/// Column list shared by every alert query.
pub const ALERT_COLUMNS: &str = "id, user_id, longitude, latitude, address, phone, vehicle_type, \
     status, priority, sla_deadline, assigned_garage, assigned_at, resolved_at, created_at, updated_at";

/// Database row mapping for the sos_alerts table.
#[derive(Debug, Clone, FromRow)]
pub struct AlertEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub longitude: f64,
    pub latitude: f64,
    pub address: Option<String>,
    pub phone: String,
    pub vehicle_type: String,
    pub status: String,
    pub priority: String,
    pub sla_deadline: DateTime<Utc>,
    pub assigned_garage: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AlertEntity> for Alert {
    type Error = StoreError;

    fn try_from(entity: AlertEntity) -> Result<Self, Self::Error> {
        let status = entity
            .status
            .parse::<AlertStatus>()
            .map_err(StoreError::Corrupt)?;
        let priority = entity
            .priority
            .parse::<Priority>()
            .map_err(StoreError::Corrupt)?;

        Ok(Alert {
            id: entity.id,
            user_id: entity.user_id,
            location: GeoPoint::new(entity.longitude, entity.latitude),
            address: entity.address,
            phone: entity.phone,
            vehicle_type: entity.vehicle_type,
            status,
            priority,
            sla_deadline: entity.sla_deadline,
            assigned_garage: entity.assigned_garage,
            assigned_at: entity.assigned_at,
            resolved_at: entity.resolved_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}
