//! Garage entity (database row mapping).

use domain::models::{GeoPoint, Responder};
use sqlx::FromRow;
use uuid::Uuid;

pub const GARAGE_COLUMNS: &str =
    "id, owner_id, name, phone, email, address, latitude, longitude, is_active";

/// Database row mapping for the garages table.
#[derive(Debug, Clone, FromRow)]
pub struct GarageEntity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub is_active: bool,
}

impl From<GarageEntity> for Responder {
    fn from(entity: GarageEntity) -> Self {
        Responder {
            id: entity.id,
            owner_id: entity.owner_id,
            name: entity.name,
            phone: entity.phone,
            email: entity.email,
            address: entity.address,
            location: GeoPoint::new(entity.longitude, entity.latitude),
            is_active: entity.is_active,
        }
    }
}
