//! Persistence interfaces consumed by the dispatch service.
//!
//! Each trait covers one collaborator. PostgreSQL repositories implement them
//! in the persistence crate; [`super::memory::InMemoryStore`] implements all
//! of them for tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Alert, AlertFilter, AlertStatus, Entitlement, GeoPoint, NewAlert, NewEntitlement, Plan,
    PointsAward, PointsRecord, Responder, SearchArea, Usage, UserProfile,
};

/// Errors raised by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// A state change to apply to an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub to: AlertStatus,
    /// Responder to (re)assign; stamps the assignment time.
    pub assign_garage: Option<Uuid>,
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn create_alert(&self, alert: NewAlert) -> Result<Alert, StoreError>;

    async fn find_alert(&self, id: Uuid) -> Result<Option<Alert>, StoreError>;

    /// Alerts matching the filter, newest first.
    async fn list_alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>, StoreError>;

    /// Applies `transition` only if the alert is still in `expected` status
    /// and still assigned to `expected_garage`.
    ///
    /// Returns `None` when the alert is missing, its status moved on, or it
    /// was reassigned; the check and the write must be a single atomic step.
    async fn apply_transition(
        &self,
        id: Uuid,
        expected: AlertStatus,
        expected_garage: Option<Uuid>,
        transition: Transition,
        at: DateTime<Utc>,
    ) -> Result<Option<Alert>, StoreError>;
}

#[async_trait]
pub trait EntitlementStore: Send + Sync {
    /// First entitlement with status `active` or `trial`, oldest first.
    async fn find_current(&self, user_id: Uuid) -> Result<Option<Entitlement>, StoreError>;

    async fn create_entitlement(&self, new: NewEntitlement) -> Result<Entitlement, StoreError>;

    /// Persists a repaired plan reference.
    async fn repair_plan(&self, entitlement_id: Uuid, plan_id: Uuid) -> Result<(), StoreError>;

    /// Increments the cycle usage counter and stamps the last call time.
    async fn record_service_call(
        &self,
        entitlement_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Usage, StoreError>;
}

#[async_trait]
pub trait PlanCatalog: Send + Sync {
    async fn find_plan(&self, id: Uuid) -> Result<Option<Plan>, StoreError>;

    async fn list_plans(&self) -> Result<Vec<Plan>, StoreError>;
}

#[async_trait]
pub trait ResponderDirectory: Send + Sync {
    async fn find_responder(&self, id: Uuid) -> Result<Option<Responder>, StoreError>;

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Option<Responder>, StoreError>;

    /// Active responders inside the search area around `center`.
    async fn find_active(
        &self,
        center: GeoPoint,
        area: SearchArea,
    ) -> Result<Vec<Responder>, StoreError>;
}

#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn find_profile(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError>;

    async fn list_admins(&self) -> Result<Vec<UserProfile>, StoreError>;
}

#[async_trait]
pub trait RewardsLedger: Send + Sync {
    /// Credits the balance and appends the audit record.
    async fn award_points(&self, award: PointsAward) -> Result<PointsRecord, StoreError>;
}

/// The set of stores a [`super::dispatch::DispatchService`] works against.
#[derive(Clone)]
pub struct DispatchStores {
    pub alerts: Arc<dyn AlertStore>,
    pub entitlements: Arc<dyn EntitlementStore>,
    pub plans: Arc<dyn PlanCatalog>,
    pub responders: Arc<dyn ResponderDirectory>,
    pub accounts: Arc<dyn AccountDirectory>,
    pub rewards: Arc<dyn RewardsLedger>,
}

impl DispatchStores {
    /// Uses one backend for every store.
    pub fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: AlertStore
            + EntitlementStore
            + PlanCatalog
            + ResponderDirectory
            + AccountDirectory
            + RewardsLedger
            + 'static,
    {
        Self {
            alerts: store.clone(),
            entitlements: store.clone(),
            plans: store.clone(),
            responders: store.clone(),
            accounts: store.clone(),
            rewards: store,
        }
    }
}
