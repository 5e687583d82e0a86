//! Entitlement (subscription) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Length of an auto-provisioned entry-level subscription.
pub const PROVISIONED_PERIOD_DAYS: i64 = 30;

/// Subscription status. Only `active` and `trial` count as current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntitlementStatus {
    Active,
    Trial,
    Expired,
    Cancelled,
}

impl EntitlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntitlementStatus::Active => "active",
            EntitlementStatus::Trial => "trial",
            EntitlementStatus::Expired => "expired",
            EntitlementStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_current(&self) -> bool {
        matches!(self, EntitlementStatus::Active | EntitlementStatus::Trial)
    }
}

impl FromStr for EntitlementStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(EntitlementStatus::Active),
            "trial" => Ok(EntitlementStatus::Trial),
            "expired" => Ok(EntitlementStatus::Expired),
            "cancelled" | "canceled" => Ok(EntitlementStatus::Cancelled),
            other => Err(format!("Unknown subscription status: {}", other)),
        }
    }
}

/// Usage counters for the current billing cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub service_calls_used: i32,
    pub last_service_call_date: Option<DateTime<Utc>>,
}

/// A requester's subscription to a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub id: Uuid,
    pub user_id: Uuid,
    /// `None` when the plan reference was lost; repaired on next use.
    pub plan_id: Option<Uuid>,
    pub status: EntitlementStatus,
    pub usage: Usage,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Amount paid, in minor currency units.
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Data needed to persist a new entitlement. Usage starts at zero.
#[derive(Debug, Clone)]
pub struct NewEntitlement {
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub status: EntitlementStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub amount: i64,
}
