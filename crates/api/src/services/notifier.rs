//! Production notification sink.
//!
//! Writes in-app notifications to the notifications table, sends emails
//! through [`EmailService`] and publishes signed webhook events.

use async_trait::async_trait;
use domain::models::{Alert, AlertStatus, PointsRecord, Responder, UsageWarning, UserProfile};
use domain::services::{
    AccountDirectory, DispatchEvent, NotificationError, NotificationSink,
};
use persistence::repositories::{NotificationInput, NotificationRepository, UserRepository};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::services::email::{garage_recipients, EmailMessage, EmailService, Recipient};
use crate::services::webhook::WebhookPublisher;

/// In-app notification kinds.
pub mod kinds {
    pub const SOS_NEARBY: &str = "sos_nearby";
    pub const SOS_CREATED: &str = "sos_created";
    pub const SOS_STATUS: &str = "sos_status";
    pub const QUOTA_WARNING: &str = "quota_warning";
    pub const POINTS_AWARDED: &str = "points_awarded";
}

/// Delivers dispatch side effects through the platform's real channels.
pub struct PlatformNotifier {
    notifications: NotificationRepository,
    users: UserRepository,
    email: EmailService,
    webhook: WebhookPublisher,
    app_base_url: String,
}

impl PlatformNotifier {
    pub fn new(
        pool: PgPool,
        email: EmailService,
        webhook: WebhookPublisher,
        app_base_url: impl Into<String>,
    ) -> Self {
        Self {
            notifications: NotificationRepository::new(pool.clone()),
            users: UserRepository::new(pool),
            email,
            webhook,
            app_base_url: app_base_url.into(),
        }
    }

    fn link(&self, path: &str) -> String {
        format!("{}{}", self.app_base_url, path)
    }

    /// Mail addresses for a garage, resolved through its owning account.
    async fn recipients_for(
        &self,
        responder: &Responder,
    ) -> Result<Vec<Recipient>, NotificationError> {
        let owner = self
            .users
            .find_profile(responder.owner_id)
            .await
            .map_err(|e| NotificationError::Delivery(e.to_string()))?;

        let recipients = garage_recipients(owner.as_ref(), responder);
        if recipients.is_empty() {
            return Err(NotificationError::RecipientNotFound(format!(
                "no email address for owner {} of garage {}",
                responder.owner_id, responder.id
            )));
        }
        Ok(recipients)
    }

    async fn store(&self, input: NotificationInput) -> Result<(), NotificationError> {
        self.notifications
            .create(input)
            .await
            .map(|_| ())
            .map_err(|e| NotificationError::Delivery(e.to_string()))
    }
}

#[async_trait]
impl NotificationSink for PlatformNotifier {
    async fn email_responder(
        &self,
        responder: &Responder,
        alert: &Alert,
    ) -> Result<(), NotificationError> {
        let recipients = self.recipients_for(responder).await?;
        self.email
            .send_new_alert_email(&recipients, responder, alert)
            .await
            .map_err(|e| NotificationError::Delivery(e.to_string()))
    }

    async fn notify_responder(
        &self,
        responder: &Responder,
        alert: &Alert,
    ) -> Result<(), NotificationError> {
        let distance_km = responder.location.distance_meters(&alert.location) / 1000.0;
        self.store(NotificationInput {
            user_id: responder.owner_id,
            kind: kinds::SOS_NEARBY.to_string(),
            title: "New SOS request nearby".to_string(),
            message: format!(
                "A driver needs roadside assistance {:.1} km from {}.",
                distance_km, responder.name
            ),
            link: Some(self.link("/garage/sos")),
            metadata: json!({
                "sosId": alert.id,
                "garageId": responder.id,
                "priority": alert.priority,
            }),
        })
        .await
    }

    async fn notify_admin(
        &self,
        admin: &UserProfile,
        alert: &Alert,
    ) -> Result<(), NotificationError> {
        self.store(NotificationInput {
            user_id: admin.id,
            kind: kinds::SOS_CREATED.to_string(),
            title: format!("New {} SOS request", alert.priority.as_str()),
            message: format!(
                "SOS request {} was created and is awaiting a garage.",
                alert.id
            ),
            link: Some(self.link("/admin/sos")),
            metadata: json!({
                "sosId": alert.id,
                "userId": alert.user_id,
                "priority": alert.priority,
            }),
        })
        .await
    }

    async fn send_quota_warning(
        &self,
        user_id: Uuid,
        warning: &UsageWarning,
    ) -> Result<(), NotificationError> {
        self.store(NotificationInput {
            user_id,
            kind: kinds::QUOTA_WARNING.to_string(),
            title: "SOS quota running low".to_string(),
            message: warning.message.clone(),
            link: Some(self.link("/pricing")),
            metadata: json!({
                "current": warning.current,
                "limit": warning.limit,
                "remaining": warning.remaining,
            }),
        })
        .await?;

        let profile = self
            .users
            .find_profile(user_id)
            .await
            .map_err(|e| NotificationError::Delivery(e.to_string()))?
            .ok_or_else(|| NotificationError::RecipientNotFound(user_id.to_string()))?;

        self.email
            .send(EmailMessage {
                to: profile.email,
                to_name: Some(profile.name),
                subject: "Your SOS quota is running low".to_string(),
                body_text: format!(
                    "{}\n\nUpgrade your plan: {}\n",
                    warning.message,
                    self.link("/pricing")
                ),
                body_html: None,
            })
            .await
            .map_err(|e| NotificationError::Delivery(e.to_string()))
    }

    async fn send_assignment(
        &self,
        responder: &Responder,
        alert: &Alert,
    ) -> Result<(), NotificationError> {
        let recipients = self.recipients_for(responder).await?;
        self.email
            .send_assignment_email(&recipients, responder, alert)
            .await
            .map_err(|e| NotificationError::Delivery(e.to_string()))
    }

    async fn notify_requester(&self, alert: &Alert) -> Result<(), NotificationError> {
        let (title, message) = status_notice(alert.status);
        self.store(NotificationInput {
            user_id: alert.user_id,
            kind: kinds::SOS_STATUS.to_string(),
            title: title.to_string(),
            message: message.to_string(),
            link: Some(self.link("/sos")),
            metadata: json!({
                "sosId": alert.id,
                "status": alert.status,
                "garageId": alert.assigned_garage,
            }),
        })
        .await
    }

    async fn notify_points_awarded(&self, record: &PointsRecord) -> Result<(), NotificationError> {
        self.store(NotificationInput {
            user_id: record.user_id,
            kind: kinds::POINTS_AWARDED.to_string(),
            title: "Points earned".to_string(),
            message: format!("You earned {} points: {}.", record.points, record.reason),
            link: Some(self.link("/rewards")),
            metadata: record.metadata.clone(),
        })
        .await
    }

    async fn publish_event(&self, event: &DispatchEvent) -> Result<(), NotificationError> {
        self.webhook
            .publish(event)
            .await
            .map_err(|e| NotificationError::Delivery(e.to_string()))
    }
}

/// Title and body shown to a requester after their alert changes status.
pub fn status_notice(status: AlertStatus) -> (&'static str, &'static str) {
    match status {
        AlertStatus::Pending => (
            "SOS request received",
            "We are looking for a garage near you.",
        ),
        AlertStatus::Assigned => (
            "Help is on the way",
            "A garage accepted your SOS request and will contact you shortly.",
        ),
        AlertStatus::Resolved => (
            "SOS request resolved",
            "Your SOS request was resolved. You earned reward points for using the service.",
        ),
        AlertStatus::Cancelled => (
            "SOS request cancelled",
            "Your SOS request was cancelled.",
        ),
    }
}
