//! In-memory implementation of every dispatch store.
//!
//! Used by unit tests and by API tests that exercise the router without a
//! database. All state sits behind one mutex, so conditional writes are
//! atomic just like their SQL counterparts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::models::{
    Alert, AlertFilter, AlertStatus, CoverageMode, Entitlement, GeoPoint, NewAlert,
    NewEntitlement, Plan, PlanLimits, PlanTier, PointsAward, PointsRecord, Responder, Role,
    SearchArea, Usage, UserProfile,
};
use crate::services::store::{
    AccountDirectory, AlertStore, EntitlementStore, PlanCatalog, ResponderDirectory,
    RewardsLedger, StoreError, Transition,
};

/// Default plan catalog, matching the database seed.
pub fn seed_plans() -> Vec<Plan> {
    let plan = |name: &str, tier, monthly, yearly, calls, radius, coverage| Plan {
        id: Uuid::new_v4(),
        name: name.to_string(),
        tier,
        price_monthly: monthly,
        price_yearly: yearly,
        limits: PlanLimits {
            service_calls: Some(calls),
            service_radius: Some(radius),
            coverage_mode: coverage,
        },
    };

    vec![
        plan("Free", PlanTier::Free, 0, 0, 1, 5.0, Some(CoverageMode::Local)),
        plan("Standard", PlanTier::Standard, 4900, 49000, 5, 25.0, Some(CoverageMode::Local)),
        plan("Premium", PlanTier::Premium, 9900, 99000, 20, 100.0, Some(CoverageMode::Local)),
        plan(
            "Enterprise",
            PlanTier::Enterprise,
            29900,
            299000,
            -1,
            50000.0,
            Some(CoverageMode::Nationwide),
        ),
    ]
}

#[derive(Debug, Default)]
struct State {
    alerts: Vec<Alert>,
    entitlements: Vec<Entitlement>,
    plans: Vec<Plan>,
    responders: Vec<Responder>,
    profiles: Vec<UserProfile>,
    points: Vec<PointsRecord>,
    balances: HashMap<Uuid, i64>,
    fail_usage: bool,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plans(plans: Vec<Plan>) -> Self {
        let store = Self::new();
        store.lock_state().plans = plans;
        store
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not wedge the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_plan(&self, plan: Plan) {
        self.lock_state().plans.push(plan);
    }

    pub fn plan_by_tier(&self, tier: PlanTier) -> Option<Plan> {
        self.lock_state().plans.iter().find(|p| p.tier == tier).cloned()
    }

    pub fn add_entitlement(&self, entitlement: Entitlement) {
        self.lock_state().entitlements.push(entitlement);
    }

    pub fn entitlements_for(&self, user_id: Uuid) -> Vec<Entitlement> {
        self.lock_state()
            .entitlements
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn add_responder(&self, responder: Responder) {
        self.lock_state().responders.push(responder);
    }

    pub fn add_profile(&self, profile: UserProfile) {
        self.lock_state().profiles.push(profile);
    }

    /// Seeds an alert directly, bypassing entitlement checks.
    pub fn insert_alert(&self, alert: Alert) {
        self.lock_state().alerts.push(alert);
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.lock_state().alerts.clone()
    }

    pub fn points_records(&self) -> Vec<PointsRecord> {
        self.lock_state().points.clone()
    }

    pub fn balance(&self, user_id: Uuid) -> i64 {
        self.lock_state().balances.get(&user_id).copied().unwrap_or(0)
    }

    /// Makes usage increments fail, to exercise the best-effort path.
    pub fn fail_usage_increments(&self, fail: bool) {
        self.lock_state().fail_usage = fail;
    }
}

#[async_trait]
impl AlertStore for InMemoryStore {
    async fn create_alert(&self, new: NewAlert) -> Result<Alert, StoreError> {
        let alert = Alert {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            location: new.location,
            address: new.address,
            phone: new.phone,
            vehicle_type: new.vehicle_type,
            status: AlertStatus::Pending,
            priority: new.priority,
            sla_deadline: new.sla_deadline,
            assigned_garage: None,
            assigned_at: None,
            resolved_at: None,
            created_at: new.created_at,
            updated_at: new.created_at,
        };
        self.lock_state().alerts.push(alert.clone());
        Ok(alert)
    }

    async fn find_alert(&self, id: Uuid) -> Result<Option<Alert>, StoreError> {
        Ok(self.lock_state().alerts.iter().find(|a| a.id == id).cloned())
    }

    async fn list_alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>, StoreError> {
        // Reverse insertion order first so ties on created_at stay newest-first.
        let mut alerts: Vec<Alert> = self
            .lock_state()
            .alerts
            .iter()
            .rev()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }

    async fn apply_transition(
        &self,
        id: Uuid,
        expected: AlertStatus,
        expected_garage: Option<Uuid>,
        transition: Transition,
        at: DateTime<Utc>,
    ) -> Result<Option<Alert>, StoreError> {
        let mut state = self.lock_state();
        let Some(alert) = state.alerts.iter_mut().find(|a| {
            a.id == id && a.status == expected && a.assigned_garage == expected_garage
        })
        else {
            return Ok(None);
        };

        alert.status = transition.to;
        if let Some(garage_id) = transition.assign_garage {
            alert.assigned_garage = Some(garage_id);
            alert.assigned_at = Some(at);
        }
        if transition.to == AlertStatus::Resolved {
            alert.resolved_at = Some(at);
        }
        alert.updated_at = at;

        Ok(Some(alert.clone()))
    }
}

#[async_trait]
impl EntitlementStore for InMemoryStore {
    async fn find_current(&self, user_id: Uuid) -> Result<Option<Entitlement>, StoreError> {
        Ok(self
            .lock_state()
            .entitlements
            .iter()
            .find(|e| e.user_id == user_id && e.status.is_current())
            .cloned())
    }

    async fn create_entitlement(&self, new: NewEntitlement) -> Result<Entitlement, StoreError> {
        let entitlement = Entitlement {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            plan_id: Some(new.plan_id),
            status: new.status,
            usage: Usage::default(),
            start_date: new.start_date,
            end_date: new.end_date,
            amount: new.amount,
            created_at: new.start_date,
        };
        self.lock_state().entitlements.push(entitlement.clone());
        Ok(entitlement)
    }

    async fn repair_plan(&self, entitlement_id: Uuid, plan_id: Uuid) -> Result<(), StoreError> {
        let mut state = self.lock_state();
        let entitlement = state
            .entitlements
            .iter_mut()
            .find(|e| e.id == entitlement_id)
            .ok_or_else(|| StoreError::Database(format!("entitlement {} not found", entitlement_id)))?;
        entitlement.plan_id = Some(plan_id);
        Ok(())
    }

    async fn record_service_call(
        &self,
        entitlement_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Usage, StoreError> {
        let mut state = self.lock_state();
        if state.fail_usage {
            return Err(StoreError::Database("usage increment unavailable".to_string()));
        }
        let entitlement = state
            .entitlements
            .iter_mut()
            .find(|e| e.id == entitlement_id)
            .ok_or_else(|| StoreError::Database(format!("entitlement {} not found", entitlement_id)))?;
        entitlement.usage.service_calls_used += 1;
        entitlement.usage.last_service_call_date = Some(at);
        Ok(entitlement.usage.clone())
    }
}

#[async_trait]
impl PlanCatalog for InMemoryStore {
    async fn find_plan(&self, id: Uuid) -> Result<Option<Plan>, StoreError> {
        Ok(self.lock_state().plans.iter().find(|p| p.id == id).cloned())
    }

    async fn list_plans(&self) -> Result<Vec<Plan>, StoreError> {
        Ok(self.lock_state().plans.clone())
    }
}

#[async_trait]
impl ResponderDirectory for InMemoryStore {
    async fn find_responder(&self, id: Uuid) -> Result<Option<Responder>, StoreError> {
        Ok(self.lock_state().responders.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Option<Responder>, StoreError> {
        Ok(self
            .lock_state()
            .responders
            .iter()
            .find(|r| r.owner_id == owner_id)
            .cloned())
    }

    async fn find_active(
        &self,
        center: GeoPoint,
        area: SearchArea,
    ) -> Result<Vec<Responder>, StoreError> {
        Ok(self
            .lock_state()
            .responders
            .iter()
            .filter(|r| r.is_active)
            .filter(|r| match area {
                SearchArea::Nationwide => true,
                SearchArea::Within { radius_meters } => {
                    center.distance_meters(&r.location) <= radius_meters
                }
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AccountDirectory for InMemoryStore {
    async fn find_profile(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.lock_state().profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn list_admins(&self) -> Result<Vec<UserProfile>, StoreError> {
        Ok(self
            .lock_state()
            .profiles
            .iter()
            .filter(|p| p.role == Role::Admin)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RewardsLedger for InMemoryStore {
    async fn award_points(&self, award: PointsAward) -> Result<PointsRecord, StoreError> {
        let record = PointsRecord {
            id: Uuid::new_v4(),
            user_id: award.user_id,
            points: award.points,
            reason: award.reason,
            metadata: award.metadata,
            created_at: Utc::now(),
        };
        let mut state = self.lock_state();
        *state.balances.entry(award.user_id).or_insert(0) += i64::from(award.points);
        state.points.push(record.clone());
        Ok(record)
    }
}
