//! SOS dispatch service.
//!
//! Orchestrates alert creation, role-scoped listing and status transitions.
//! Primary writes (the alert itself, its status) decide the outcome; every
//! side effect after them is best-effort and only logged on failure.

use chrono::Utc;
use futures::future::{join_all, BoxFuture, FutureExt};
use metrics::counter;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::DispatchError;
use crate::models::alert::DEFAULT_VEHICLE_TYPE;
use crate::models::{
    check_quota_warning, ActorScope, Actor, Alert, AlertResponse, AlertStatus, CreateAlertRequest,
    GarageSummary, GeoPoint, ListAlertsQuery, NewAlert, PointsAward, Priority, Quota, Responder,
    Role, UpdateAlertStatusRequest, UserSummary,
};
use crate::services::entitlement::{resolve_entitlement, ResolvedEntitlement};
use crate::services::notification::{DispatchEvent, NotificationError, NotificationSink};
use crate::services::store::DispatchStores;
use crate::services::transition::plan_transition;
use crate::services::visibility::listing_filter;

/// Default bound on each best-effort outbound call.
pub const DEFAULT_NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Default usage percentage at which requesters are warned.
pub const DEFAULT_QUOTA_WARNING_PERCENT: u32 = 50;

/// Tunables for [`DispatchService`].
#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings {
    pub notification_timeout: Duration,
    pub quota_warning_percent: u32,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            notification_timeout: DEFAULT_NOTIFICATION_TIMEOUT,
            quota_warning_percent: DEFAULT_QUOTA_WARNING_PERCENT,
        }
    }
}

/// Outcome of a successful alert creation.
#[derive(Debug, Clone)]
pub struct AlertCreated {
    pub alert: Alert,
    pub responders_notified: usize,
    pub message: String,
}

/// Outcome of a successful status change.
#[derive(Debug, Clone)]
pub struct StatusUpdated {
    pub alert: Alert,
    pub message: String,
}

#[derive(Clone)]
pub struct DispatchService {
    stores: DispatchStores,
    notifier: Arc<dyn NotificationSink>,
    settings: DispatchSettings,
}

impl DispatchService {
    pub fn new(
        stores: DispatchStores,
        notifier: Arc<dyn NotificationSink>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            stores,
            notifier,
            settings,
        }
    }

    /// Creates an SOS alert for `actor`.
    ///
    /// Order of writes: alert, usage increment, notifications. A failure
    /// after the alert is stored never fails the request.
    #[instrument(skip(self, request), fields(user_id = %actor.user_id))]
    pub async fn create_alert(
        &self,
        actor: Actor,
        request: CreateAlertRequest,
    ) -> Result<AlertCreated, DispatchError> {
        request
            .validate()
            .map_err(|e| DispatchError::from_validation(&e))?;

        let (Some(latitude), Some(longitude)) = (request.latitude, request.longitude) else {
            return Err(DispatchError::Validation(
                "Location coordinates are required".to_string(),
            ));
        };
        let phone = request
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| DispatchError::Validation("Phone number is required".to_string()))?;

        let now = Utc::now();
        let ResolvedEntitlement {
            entitlement, plan, ..
        } = resolve_entitlement(
            self.stores.entitlements.as_ref(),
            self.stores.plans.as_ref(),
            actor.user_id,
            now,
        )
        .await?;

        let quota = plan.limits.quota();
        let used = entitlement.usage.service_calls_used;
        if quota.is_exhausted(used) {
            counter!("sos_quota_rejections_total").increment(1);
            info!(plan = %plan.name, used, "SOS quota exhausted");
            return Err(DispatchError::quota_exceeded(format!(
                "You have used all SOS requests included in your {} plan this cycle. \
                 Upgrade your plan to request more assistance.",
                plan.name
            )));
        }

        let priority = Priority::for_tier(plan.tier);
        let alert = self
            .stores
            .alerts
            .create_alert(NewAlert {
                user_id: actor.user_id,
                location: GeoPoint::new(longitude, latitude),
                address: request.address.filter(|a| !a.trim().is_empty()),
                phone,
                vehicle_type: request
                    .vehicle_type
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_VEHICLE_TYPE.to_string()),
                priority,
                sla_deadline: now + priority.sla_window(),
                created_at: now,
            })
            .await?;

        counter!("sos_alerts_created_total", "priority" => priority.as_str()).increment(1);
        info!(
            alert_id = %alert.id,
            priority = priority.as_str(),
            sla_deadline = %alert.sla_deadline,
            "SOS alert created"
        );

        match self
            .stores
            .entitlements
            .record_service_call(entitlement.id, now)
            .await
        {
            Ok(usage) => {
                if let Quota::Limited(limit) = quota {
                    if let Some(warning) = check_quota_warning(
                        &plan.name,
                        i64::from(usage.service_calls_used),
                        i64::from(limit),
                        self.settings.quota_warning_percent,
                    ) {
                        self.best_effort(
                            "quota_warning",
                            self.notifier.send_quota_warning(actor.user_id, &warning),
                        )
                        .await;
                    }
                }
            }
            Err(e) => {
                warn!(
                    entitlement_id = %entitlement.id,
                    error = %e,
                    "Failed to record SOS usage"
                );
                counter!("sos_side_effect_failures_total", "effect" => "usage_increment")
                    .increment(1);
            }
        }

        let responders = match self
            .stores
            .responders
            .find_active(alert.location, plan.limits.search_area())
            .await
        {
            Ok(responders) => responders,
            Err(e) => {
                warn!(alert_id = %alert.id, error = %e, "Responder discovery failed");
                counter!("sos_side_effect_failures_total", "effect" => "responder_discovery")
                    .increment(1);
                Vec::new()
            }
        };

        let admins = match self.stores.accounts.list_admins().await {
            Ok(admins) => admins,
            Err(e) => {
                warn!(alert_id = %alert.id, error = %e, "Admin lookup failed");
                Vec::new()
            }
        };

        let event = DispatchEvent::for_alert(&alert, now);
        let mut fan_out: Vec<BoxFuture<'_, ()>> = Vec::new();
        for responder in &responders {
            fan_out.push(
                self.best_effort(
                    "responder_email",
                    self.notifier.email_responder(responder, &alert),
                )
                .boxed(),
            );
            fan_out.push(
                self.best_effort(
                    "responder_notification",
                    self.notifier.notify_responder(responder, &alert),
                )
                .boxed(),
            );
        }
        for admin in &admins {
            fan_out.push(
                self.best_effort("admin_notification", self.notifier.notify_admin(admin, &alert))
                    .boxed(),
            );
        }
        fan_out.push(
            self.best_effort("webhook", self.notifier.publish_event(&event))
                .boxed(),
        );
        join_all(fan_out).await;

        let responders_notified = responders.len();
        let message = match responders_notified {
            0 => "SOS request created. No garages are available nearby yet; our team has been alerted."
                .to_string(),
            1 => "SOS request created. 1 nearby garage has been notified.".to_string(),
            n => format!("SOS request created. {} nearby garages have been notified.", n),
        };

        Ok(AlertCreated {
            alert,
            responders_notified,
            message,
        })
    }

    /// Lists the alerts visible to `actor`, newest first.
    #[instrument(skip(self, query), fields(user_id = %actor.user_id))]
    pub async fn list_alerts(
        &self,
        actor: Actor,
        query: ListAlertsQuery,
    ) -> Result<Vec<AlertResponse>, DispatchError> {
        let statuses = match query.status.as_deref() {
            None => None,
            Some(raw) => {
                let parsed = AlertStatus::parse_list(raw).map_err(DispatchError::Validation)?;
                (!parsed.is_empty()).then_some(parsed)
            }
        };

        let scope = self.scope_for(actor).await?;
        let alerts = self
            .stores
            .alerts
            .list_alerts(&listing_filter(scope, statuses))
            .await?;

        let mut users: HashMap<Uuid, Option<UserSummary>> = HashMap::new();
        let mut garages: HashMap<Uuid, Option<GarageSummary>> = HashMap::new();
        let mut responses = Vec::with_capacity(alerts.len());

        for alert in alerts {
            if !users.contains_key(&alert.user_id) {
                let profile = self.stores.accounts.find_profile(alert.user_id).await?;
                users.insert(alert.user_id, profile.map(UserSummary::from));
            }
            let user = users.get(&alert.user_id).cloned().flatten();

            let garage = match alert.assigned_garage {
                Some(garage_id) => {
                    if !garages.contains_key(&garage_id) {
                        let responder = self.stores.responders.find_responder(garage_id).await?;
                        garages.insert(garage_id, responder.map(GarageSummary::from));
                    }
                    garages.get(&garage_id).cloned().flatten()
                }
                None => None,
            };

            responses.push(AlertResponse::expanded(alert, user, garage));
        }

        Ok(responses)
    }

    /// Applies a role-gated status change.
    #[instrument(skip(self, request), fields(user_id = %actor.user_id))]
    pub async fn update_status(
        &self,
        actor: Actor,
        request: UpdateAlertStatusRequest,
    ) -> Result<StatusUpdated, DispatchError> {
        let (Some(sos_id), Some(raw_status)) = (request.sos_id, request.status.as_deref()) else {
            return Err(DispatchError::Validation(
                "SOS ID and status are required".to_string(),
            ));
        };
        let requested: AlertStatus = raw_status.parse().map_err(DispatchError::Validation)?;

        let alert = self
            .stores
            .alerts
            .find_alert(sos_id)
            .await?
            .ok_or_else(|| DispatchError::NotFound("SOS request not found".to_string()))?;

        let scope = self.scope_for(actor).await?;

        // Only administrators pick a garage explicitly.
        let assigned_responder = match (scope, request.garage_id) {
            (ActorScope::Admin, Some(garage_id)) => Some(
                self.stores
                    .responders
                    .find_responder(garage_id)
                    .await?
                    .filter(|r| r.is_active)
                    .ok_or_else(|| DispatchError::NotFound("Garage not found".to_string()))?,
            ),
            _ => None,
        };

        let transition = plan_transition(
            scope,
            &alert,
            requested,
            assigned_responder.as_ref().map(|r| r.id),
        )?;

        let now = Utc::now();
        let updated = self
            .stores
            .alerts
            .apply_transition(alert.id, alert.status, alert.assigned_garage, transition, now)
            .await?
            .ok_or_else(|| {
                info!(alert_id = %alert.id, "Lost race on SOS status change");
                DispatchError::Conflict(
                    "This SOS request was updated by someone else. Refresh and try again."
                        .to_string(),
                )
            })?;

        counter!("sos_transitions_total", "to" => updated.status.as_str()).increment(1);
        info!(
            alert_id = %updated.id,
            from = %alert.status,
            to = %updated.status,
            role = %actor.role,
            "SOS status changed"
        );

        if updated.status == AlertStatus::Resolved {
            self.award_resolution_points(&updated).await;
        }

        let event = DispatchEvent::for_alert(&updated, now);
        let mut fan_out: Vec<BoxFuture<'_, ()>> = vec![
            self.best_effort("requester_notification", self.notifier.notify_requester(&updated))
                .boxed(),
            self.best_effort("webhook", self.notifier.publish_event(&event))
                .boxed(),
        ];
        if let Some(responder) = &assigned_responder {
            fan_out.push(
                self.best_effort(
                    "assignment_email",
                    self.notifier.send_assignment(responder, &updated),
                )
                .boxed(),
            );
        }
        join_all(fan_out).await;

        let message = match updated.status {
            AlertStatus::Assigned => "SOS request assigned successfully",
            AlertStatus::Resolved => "SOS request resolved successfully",
            AlertStatus::Cancelled => "SOS request cancelled",
            AlertStatus::Pending => "SOS request updated",
        };

        Ok(StatusUpdated {
            alert: updated,
            message: message.to_string(),
        })
    }

    /// Credits the assigned garage's owner and the requester.
    ///
    /// The garage award only happens when a garage is assigned; an admin can
    /// resolve an unassigned alert and only the requester is rewarded.
    async fn award_resolution_points(&self, alert: &Alert) {
        if let Some(garage_id) = alert.assigned_garage {
            match self.stores.responders.find_responder(garage_id).await {
                Ok(Some(responder)) => self.award_garage_owner(&responder, alert).await,
                Ok(None) => warn!(
                    alert_id = %alert.id,
                    garage_id = %garage_id,
                    "Assigned garage no longer exists; skipping garage points"
                ),
                Err(e) => {
                    warn!(alert_id = %alert.id, error = %e, "Failed to load assigned garage");
                    counter!("sos_side_effect_failures_total", "effect" => "points_award")
                        .increment(1);
                }
            }
        }

        let award = PointsAward::requester_resolution(alert.user_id, alert.id);
        if let Err(e) = self.stores.rewards.award_points(award).await {
            warn!(alert_id = %alert.id, error = %e, "Failed to award requester points");
            counter!("sos_side_effect_failures_total", "effect" => "points_award").increment(1);
        }
    }

    async fn award_garage_owner(&self, responder: &Responder, alert: &Alert) {
        let award = PointsAward::responder_resolution(responder.owner_id, alert.id, responder.id);
        match self.stores.rewards.award_points(award).await {
            Ok(record) => {
                self.best_effort(
                    "points_notification",
                    self.notifier.notify_points_awarded(&record),
                )
                .await
            }
            Err(e) => {
                warn!(alert_id = %alert.id, error = %e, "Failed to award garage points");
                counter!("sos_side_effect_failures_total", "effect" => "points_award")
                    .increment(1);
            }
        }
    }

    async fn scope_for(&self, actor: Actor) -> Result<ActorScope, DispatchError> {
        match actor.role {
            Role::Admin => Ok(ActorScope::Admin),
            Role::Garage => {
                let responder = self
                    .stores
                    .responders
                    .find_by_owner(actor.user_id)
                    .await?
                    .ok_or_else(|| DispatchError::NotFound("Garage profile not found".to_string()))?;
                Ok(ActorScope::Garage {
                    garage_id: responder.id,
                })
            }
            Role::User => Ok(ActorScope::Requester {
                user_id: actor.user_id,
            }),
        }
    }

    /// Runs a side effect under the notification timeout, logging failures.
    async fn best_effort<F>(&self, effect: &'static str, delivery: F)
    where
        F: Future<Output = Result<(), NotificationError>> + Send,
    {
        match tokio::time::timeout(self.settings.notification_timeout, delivery).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(effect, error = %e, "Best-effort side effect failed");
                counter!("sos_side_effect_failures_total", "effect" => effect).increment(1);
            }
            Err(_) => {
                warn!(
                    effect,
                    timeout_ms = self.settings.notification_timeout.as_millis() as u64,
                    "Best-effort side effect timed out"
                );
                counter!("sos_side_effect_failures_total", "effect" => effect).increment(1);
            }
        }
    }
}
