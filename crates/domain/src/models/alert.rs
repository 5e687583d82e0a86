//! SOS alert domain model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::account::UserSummary;
use super::plan::PlanTier;
use super::responder::GarageSummary;

/// Vehicle category recorded when the requester does not send one.
pub const DEFAULT_VEHICLE_TYPE: &str = "car";

/// Lifecycle state of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Pending,
    Assigned,
    Resolved,
    Cancelled,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Pending => "pending",
            AlertStatus::Assigned => "assigned",
            AlertStatus::Resolved => "resolved",
            AlertStatus::Cancelled => "cancelled",
        }
    }

    /// No transition leaves a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AlertStatus::Resolved | AlertStatus::Cancelled)
    }

    /// Statuses that imply a responder owns the alert.
    pub fn is_owned_by_responder(&self) -> bool {
        matches!(self, AlertStatus::Assigned | AlertStatus::Resolved)
    }

    /// Parses a comma-separated status list such as `pending,assigned`.
    pub fn parse_list(raw: &str) -> Result<Vec<AlertStatus>, String> {
        let mut statuses = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let status = part.parse::<AlertStatus>()?;
            if !statuses.contains(&status) {
                statuses.push(status);
            }
        }
        Ok(statuses)
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(AlertStatus::Pending),
            "assigned" => Ok(AlertStatus::Assigned),
            "resolved" => Ok(AlertStatus::Resolved),
            "cancelled" => Ok(AlertStatus::Cancelled),
            other => Err(format!("Unknown alert status: {}", other)),
        }
    }
}

/// Alert priority, fixed at creation from the requester's plan tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Normal,
    Critical,
}

impl Priority {
    pub fn for_tier(tier: PlanTier) -> Self {
        match tier {
            PlanTier::Enterprise => Priority::Critical,
            _ => Priority::Normal,
        }
    }

    /// Time allowed before the SLA deadline.
    pub fn sla_window(&self) -> Duration {
        match self {
            Priority::Critical => Duration::minutes(5),
            Priority::Normal => Duration::minutes(60),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::Critical => "critical",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Priority::Normal),
            "critical" => Ok(Priority::Critical),
            other => Err(format!("Unknown priority: {}", other)),
        }
    }
}

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Great-circle distance in meters.
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        use geo::HaversineDistance;
        let a = geo::Point::new(self.longitude, self.latitude);
        let b = geo::Point::new(other.longitude, other.latitude);
        a.haversine_distance(&b)
    }
}

/// Represents an emergency roadside-assistance request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location: GeoPoint,
    pub address: Option<String>,
    pub phone: String,
    pub vehicle_type: String,
    pub status: AlertStatus,
    pub priority: Priority,
    pub sla_deadline: DateTime<Utc>,
    pub assigned_garage: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data needed to persist a new alert. Status always starts as pending.
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub user_id: Uuid,
    pub location: GeoPoint,
    pub address: Option<String>,
    pub phone: String,
    pub vehicle_type: String,
    pub priority: Priority,
    pub sla_deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Which statuses an [`AlertClause`] accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusMatch {
    Any,
    In(Vec<AlertStatus>),
    NotIn(Vec<AlertStatus>),
}

impl StatusMatch {
    pub fn accepts(&self, status: AlertStatus) -> bool {
        match self {
            StatusMatch::Any => true,
            StatusMatch::In(list) => list.contains(&status),
            StatusMatch::NotIn(list) => !list.contains(&status),
        }
    }
}

/// One conjunctive condition of an [`AlertFilter`].
#[derive(Debug, Clone, PartialEq)]
pub struct AlertClause {
    pub statuses: StatusMatch,
    pub created_by: Option<Uuid>,
    pub assigned_garage: Option<Uuid>,
}

impl AlertClause {
    pub fn statuses(statuses: StatusMatch) -> Self {
        Self {
            statuses,
            created_by: None,
            assigned_garage: None,
        }
    }

    pub fn created_by(mut self, user_id: Uuid) -> Self {
        self.created_by = Some(user_id);
        self
    }

    pub fn assigned_to(mut self, garage_id: Uuid) -> Self {
        self.assigned_garage = Some(garage_id);
        self
    }

    pub fn matches(&self, alert: &Alert) -> bool {
        self.statuses.accepts(alert.status)
            && self.created_by.map_or(true, |id| alert.user_id == id)
            && self
                .assigned_garage
                .map_or(true, |id| alert.assigned_garage == Some(id))
    }
}

/// Alert listing filter: an alert matches when any clause matches.
/// A filter without clauses matches nothing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlertFilter {
    pub any_of: Vec<AlertClause>,
}

impl AlertFilter {
    pub fn single(clause: AlertClause) -> Self {
        Self {
            any_of: vec![clause],
        }
    }

    pub fn or(mut self, clause: AlertClause) -> Self {
        self.any_of.push(clause);
        self
    }

    pub fn matches(&self, alert: &Alert) -> bool {
        self.any_of.iter().any(|c| c.matches(alert))
    }
}

/// Request payload for creating an SOS alert.
///
/// Required fields are optional at the type level so that missing values
/// surface as validation errors rather than body rejections.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    #[validate(
        required(message = "Location coordinates are required"),
        custom(function = "validate_latitude_field")
    )]
    pub latitude: Option<f64>,

    #[validate(
        required(message = "Location coordinates are required"),
        custom(function = "validate_longitude_field")
    )]
    pub longitude: Option<f64>,

    #[validate(length(max = 500, message = "Address must be at most 500 characters"))]
    pub address: Option<String>,

    #[validate(
        required(message = "Phone number is required"),
        custom(function = "validate_phone_field")
    )]
    pub phone: Option<String>,

    #[validate(length(max = 50, message = "Vehicle type must be at most 50 characters"))]
    pub vehicle_type: Option<String>,
}

fn validate_latitude_field(lat: f64) -> Result<(), validator::ValidationError> {
    shared::validation::validate_latitude(lat)
}

fn validate_longitude_field(lon: f64) -> Result<(), validator::ValidationError> {
    shared::validation::validate_longitude(lon)
}

fn validate_phone_field(phone: &str) -> Result<(), validator::ValidationError> {
    if phone.trim().is_empty() {
        let mut err = validator::ValidationError::new("required");
        err.message = Some("Phone number is required".into());
        return Err(err);
    }
    shared::validation::validate_phone(phone)
}

/// Request payload for changing an alert's status.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAlertStatusRequest {
    pub sos_id: Option<Uuid>,
    pub status: Option<String>,
    /// Responder to assign; honored for administrators only.
    pub garage_id: Option<Uuid>,
}

/// Query parameters for listing alerts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAlertsQuery {
    /// Comma-separated status filter.
    pub status: Option<String>,
}

/// GeoJSON-style location in responses.
#[derive(Debug, Clone, Serialize)]
pub struct LocationResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// `[longitude, latitude]`
    pub coordinates: [f64; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Response payload for alert operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    pub location: LocationResponse,
    pub phone: String,
    pub vehicle_type: String,
    pub status: AlertStatus,
    pub priority: Priority,
    pub sla_deadline: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_garage_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_garage: Option<GarageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AlertResponse {
    /// Attaches displayable requester and garage details.
    pub fn expanded(
        alert: Alert,
        user: Option<UserSummary>,
        garage: Option<GarageSummary>,
    ) -> Self {
        let mut response = Self::from(alert);
        response.user = user;
        response.assigned_garage = garage;
        response
    }
}

impl From<Alert> for AlertResponse {
    fn from(a: Alert) -> Self {
        Self {
            id: a.id,
            user_id: a.user_id,
            user: None,
            location: LocationResponse {
                kind: "Point",
                coordinates: [a.location.longitude, a.location.latitude],
                address: a.address,
            },
            phone: a.phone,
            vehicle_type: a.vehicle_type,
            status: a.status,
            priority: a.priority,
            sla_deadline: a.sla_deadline,
            assigned_garage_id: a.assigned_garage,
            assigned_garage: None,
            assigned_at: a.assigned_at,
            resolved_at: a.resolved_at,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}
