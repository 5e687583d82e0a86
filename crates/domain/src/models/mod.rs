//! Domain models for SOS dispatch.

pub mod account;
pub mod alert;
pub mod entitlement;
pub mod plan;
pub mod points;
pub mod responder;
pub mod usage_warning;

pub use account::{Actor, ActorScope, Role, UserProfile, UserSummary};
pub use alert::{
    Alert, AlertClause, AlertFilter, AlertResponse, AlertStatus, CreateAlertRequest, GeoPoint,
    ListAlertsQuery, NewAlert, Priority, StatusMatch, UpdateAlertStatusRequest,
};
pub use entitlement::{Entitlement, EntitlementStatus, NewEntitlement, Usage};
pub use plan::{CoverageMode, Plan, PlanLimits, PlanTier, Quota, SearchArea};
pub use points::{PointsAward, PointsRecord};
pub use responder::{GarageSummary, Responder};
pub use usage_warning::{check_quota_warning, UsageWarning};
