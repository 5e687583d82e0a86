//! Responder (garage) domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::alert::{GeoPoint, LocationResponse};

/// A garage or service provider that can be dispatched to alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Responder {
    pub id: Uuid,
    /// Account that owns the garage profile; receives notifications and points.
    pub owner_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub location: GeoPoint,
    pub is_active: bool,
}

/// Displayable garage details attached to alert listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GarageSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub location: LocationResponse,
}

impl From<Responder> for GarageSummary {
    fn from(r: Responder) -> Self {
        Self {
            id: r.id,
            name: r.name,
            phone: r.phone,
            email: r.email,
            location: LocationResponse {
                kind: "Point",
                coordinates: [r.location.longitude, r.location.latitude],
                address: r.address,
            },
        }
    }
}
