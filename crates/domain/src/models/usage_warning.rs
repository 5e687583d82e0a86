//! Usage warning models for quota monitoring.
//!
//! Produces a warning when a requester's SOS usage approaches the plan quota.

use serde::{Deserialize, Serialize};

/// A warning about SOS usage approaching the plan quota.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageWarning {
    /// Calls used in the current cycle
    pub current: i64,
    /// Calls allowed per cycle
    pub limit: i64,
    /// Remaining calls
    pub remaining: i64,
    /// Usage percentage (0.0 - 100.0)
    pub percentage: f64,
    /// Plan name shown to the requester
    pub plan_name: String,
    /// Human-readable warning message
    pub message: String,
}

impl UsageWarning {
    pub fn new(plan_name: &str, current: i64, limit: i64) -> Self {
        let remaining = (limit - current).max(0);
        let percentage = if limit > 0 {
            (current as f64 / limit as f64) * 100.0
        } else {
            0.0
        };

        let message = format!(
            "You have used {}/{} SOS requests on your {} plan ({}%). {} remaining.",
            current,
            limit,
            plan_name,
            percentage.round() as i64,
            remaining
        );

        Self {
            current,
            limit,
            remaining,
            percentage,
            plan_name: plan_name.to_string(),
            message,
        }
    }

    pub fn exceeds_threshold(&self, threshold_percent: u32) -> bool {
        self.percentage >= threshold_percent as f64
    }
}

/// Returns a warning when exactly one call remains or usage reached the
/// threshold. Unlimited or zero quotas never warn.
pub fn check_quota_warning(
    plan_name: &str,
    used: i64,
    limit: i64,
    threshold_percent: u32,
) -> Option<UsageWarning> {
    if limit <= 0 {
        return None;
    }

    let warning = UsageWarning::new(plan_name, used, limit);

    if warning.remaining == 1 || warning.exceeds_threshold(threshold_percent) {
        Some(warning)
    } else {
        None
    }
}
