//! Reward points audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Points credited to the responder owner when an alert is resolved.
pub const RESPONDER_RESOLUTION_POINTS: i32 = 100;

/// Points credited to the requester when their alert is resolved.
pub const REQUESTER_RESOLUTION_POINTS: i32 = 20;

/// Append-only audit entry for a points balance change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub points: i32,
    pub reason: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A points award to apply: balance increment plus audit record.
#[derive(Debug, Clone)]
pub struct PointsAward {
    pub user_id: Uuid,
    pub points: i32,
    pub reason: String,
    pub metadata: serde_json::Value,
}

impl PointsAward {
    /// Award for the garage owner that handled an alert.
    pub fn responder_resolution(owner_id: Uuid, alert_id: Uuid, garage_id: Uuid) -> Self {
        Self {
            user_id: owner_id,
            points: RESPONDER_RESOLUTION_POINTS,
            reason: "SOS request resolved".to_string(),
            metadata: serde_json::json!({
                "sosId": alert_id,
                "garageId": garage_id,
                "role": "garage",
            }),
        }
    }

    /// Award for the requester whose alert was resolved.
    pub fn requester_resolution(user_id: Uuid, alert_id: Uuid) -> Self {
        Self {
            user_id,
            points: REQUESTER_RESOLUTION_POINTS,
            reason: "SOS request completed".to_string(),
            metadata: serde_json::json!({
                "sosId": alert_id,
                "role": "user",
            }),
        }
    }
}
