//! Subscription plan domain model.
//!
//! Plans are read-only reference data for dispatch: they decide the cycle
//! quota, the priority tier and how far to search for responders.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Quota value meaning "no limit".
pub const UNLIMITED_SERVICE_CALLS: i32 = -1;

/// Quota applied when a plan does not declare one.
pub const DEFAULT_SERVICE_CALLS: i32 = 1;

/// Search radius applied when a plan does not declare one.
pub const DEFAULT_SERVICE_RADIUS_KM: f64 = 5.0;

/// Legacy plans encode nationwide coverage as a radius above this value.
pub const NATIONWIDE_RADIUS_THRESHOLD_KM: f64 = 10_000.0;

/// Plan tier, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Trial,
    Standard,
    Premium,
    Enterprise,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Trial => "trial",
            PlanTier::Standard => "standard",
            PlanTier::Premium => "premium",
            PlanTier::Enterprise => "enterprise",
        }
    }

    /// Free and trial plans are handed out without payment.
    pub fn is_entry_level(&self) -> bool {
        matches!(self, PlanTier::Free | PlanTier::Trial)
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(PlanTier::Free),
            "trial" => Ok(PlanTier::Trial),
            "standard" | "basic" => Ok(PlanTier::Standard),
            "premium" => Ok(PlanTier::Premium),
            "enterprise" => Ok(PlanTier::Enterprise),
            other => Err(format!("Unknown plan tier: {}", other)),
        }
    }
}

/// How a plan's responder search is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageMode {
    Local,
    Nationwide,
}

impl CoverageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageMode::Local => "local",
            CoverageMode::Nationwide => "nationwide",
        }
    }
}

impl FromStr for CoverageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(CoverageMode::Local),
            "nationwide" => Ok(CoverageMode::Nationwide),
            other => Err(format!("Unknown coverage mode: {}", other)),
        }
    }
}

/// Area in which responders are searched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchArea {
    /// Every active responder, distance ignored.
    Nationwide,
    /// Active responders within the radius of the alert.
    Within { radius_meters: f64 },
}

/// Alert quota for one billing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    Unlimited,
    Limited(i32),
}

impl Quota {
    /// Builds a quota from a stored limit. Missing limits fall back to
    /// [`DEFAULT_SERVICE_CALLS`]; any negative value means unlimited.
    pub fn from_limit(limit: Option<i32>) -> Self {
        match limit {
            None => Quota::Limited(DEFAULT_SERVICE_CALLS),
            Some(n) if n < 0 => Quota::Unlimited,
            Some(n) => Quota::Limited(n),
        }
    }

    pub fn is_exhausted(&self, used: i32) -> bool {
        match self {
            Quota::Unlimited => false,
            Quota::Limited(limit) => used >= *limit,
        }
    }

    /// Remaining calls, or `None` when unlimited.
    pub fn remaining(&self, used: i32) -> Option<i32> {
        match self {
            Quota::Unlimited => None,
            Quota::Limited(limit) => Some((limit - used).max(0)),
        }
    }
}

/// Limits attached to a plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    /// Alerts per cycle; `-1` is unlimited.
    pub service_calls: Option<i32>,
    /// Responder search radius in kilometers.
    pub service_radius: Option<f64>,
    pub coverage_mode: Option<CoverageMode>,
}

impl PlanLimits {
    pub fn quota(&self) -> Quota {
        Quota::from_limit(self.service_calls)
    }

    /// Resolves the responder search area.
    ///
    /// An explicit coverage mode wins. Without one, a radius above
    /// [`NATIONWIDE_RADIUS_THRESHOLD_KM`] is read as nationwide.
    pub fn search_area(&self) -> SearchArea {
        let radius_km = self.service_radius.unwrap_or(DEFAULT_SERVICE_RADIUS_KM);

        let coverage = self.coverage_mode.unwrap_or(if radius_km > NATIONWIDE_RADIUS_THRESHOLD_KM {
            CoverageMode::Nationwide
        } else {
            CoverageMode::Local
        });

        match coverage {
            CoverageMode::Nationwide => SearchArea::Nationwide,
            CoverageMode::Local => SearchArea::Within {
                radius_meters: radius_km * 1000.0,
            },
        }
    }
}

/// A priced service level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub tier: PlanTier,
    /// Monthly price in minor currency units.
    pub price_monthly: i64,
    /// Yearly price in minor currency units.
    pub price_yearly: i64,
    pub limits: PlanLimits,
}

impl Plan {
    /// Whether an entitlement paid `amount` for this plan.
    pub fn matches_amount(&self, amount: i64) -> bool {
        self.price_monthly == amount || self.price_yearly == amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(PlanTier::Free < PlanTier::Trial);
        assert!(PlanTier::Trial < PlanTier::Standard);
        assert!(PlanTier::Premium < PlanTier::Enterprise);
    }

    #[test]
    fn test_tier_entry_level() {
        assert!(PlanTier::Free.is_entry_level());
        assert!(PlanTier::Trial.is_entry_level());
        assert!(!PlanTier::Standard.is_entry_level());
    }

    #[test]
    fn test_tier_from_str() {
        assert_eq!("Enterprise".parse::<PlanTier>().unwrap(), PlanTier::Enterprise);
        assert!("gold".parse::<PlanTier>().is_err());
    }

    #[test]
    fn test_quota_defaults_to_one_call() {
        let quota = Quota::from_limit(None);
        assert_eq!(quota, Quota::Limited(1));
        assert!(!quota.is_exhausted(0));
        assert!(quota.is_exhausted(1));
    }

    #[test]
    fn test_quota_unlimited() {
        let quota = Quota::from_limit(Some(UNLIMITED_SERVICE_CALLS));
        assert_eq!(quota, Quota::Unlimited);
        assert!(!quota.is_exhausted(i32::MAX));
        assert_eq!(quota.remaining(10), None);
    }

    #[test]
    fn test_quota_remaining_never_negative() {
        assert_eq!(Quota::Limited(3).remaining(1), Some(2));
        assert_eq!(Quota::Limited(3).remaining(7), Some(0));
    }

    #[test]
    fn test_search_area_defaults_to_five_km() {
        let limits = PlanLimits::default();
        assert_eq!(
            limits.search_area(),
            SearchArea::Within {
                radius_meters: 5000.0
            }
        );
    }

    #[test]
    fn test_search_area_legacy_radius_sentinel() {
        let limits = PlanLimits {
            service_radius: Some(50_000.0),
            ..Default::default()
        };
        assert_eq!(limits.search_area(), SearchArea::Nationwide);

        let limits = PlanLimits {
            service_radius: Some(10_000.0),
            ..Default::default()
        };
        assert_eq!(
            limits.search_area(),
            SearchArea::Within {
                radius_meters: 10_000_000.0
            }
        );
    }

    #[test]
    fn test_search_area_explicit_mode_wins() {
        let limits = PlanLimits {
            service_radius: Some(50_000.0),
            coverage_mode: Some(CoverageMode::Local),
            ..Default::default()
        };
        assert_eq!(
            limits.search_area(),
            SearchArea::Within {
                radius_meters: 50_000_000.0
            }
        );

        let limits = PlanLimits {
            service_radius: Some(20.0),
            coverage_mode: Some(CoverageMode::Nationwide),
            ..Default::default()
        };
        assert_eq!(limits.search_area(), SearchArea::Nationwide);
    }

    #[test]
    fn test_plan_matches_amount() {
        let plan = Plan {
            id: Uuid::new_v4(),
            name: "Premium".to_string(),
            tier: PlanTier::Premium,
            price_monthly: 9900,
            price_yearly: 99000,
            limits: PlanLimits::default(),
        };
        assert!(plan.matches_amount(9900));
        assert!(plan.matches_amount(99000));
        assert!(!plan.matches_amount(4900));
    }
}
