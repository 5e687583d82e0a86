//! Notification sink for best-effort dispatch side effects.
//!
//! The dispatch service only talks to [`NotificationSink`]; delivery channels
//! (in-app notifications, email, webhooks) live behind it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Alert, AlertStatus, PointsRecord, Priority, Responder, UsageWarning, UserProfile};

/// Errors raised while delivering a notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("Recipient not found: {0}")]
    RecipientNotFound(String),
}

/// Dispatch lifecycle event types published to webhooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchEventType {
    #[serde(rename = "sos.created")]
    Created,
    #[serde(rename = "sos.assigned")]
    Assigned,
    #[serde(rename = "sos.resolved")]
    Resolved,
    #[serde(rename = "sos.cancelled")]
    Cancelled,
}

impl DispatchEventType {
    pub fn for_status(status: AlertStatus) -> Self {
        match status {
            AlertStatus::Pending => DispatchEventType::Created,
            AlertStatus::Assigned => DispatchEventType::Assigned,
            AlertStatus::Resolved => DispatchEventType::Resolved,
            AlertStatus::Cancelled => DispatchEventType::Cancelled,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchEventType::Created => "sos.created",
            DispatchEventType::Assigned => "sos.assigned",
            DispatchEventType::Resolved => "sos.resolved",
            DispatchEventType::Cancelled => "sos.cancelled",
        }
    }
}

impl std::fmt::Display for DispatchEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Webhook payload describing an alert lifecycle change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchEvent {
    #[serde(rename = "type")]
    pub event_type: DispatchEventType,
    pub sos_id: Uuid,
    pub user_id: Uuid,
    pub status: AlertStatus,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_garage: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
}

impl DispatchEvent {
    pub fn for_alert(alert: &Alert, occurred_at: DateTime<Utc>) -> Self {
        Self {
            event_type: DispatchEventType::for_status(alert.status),
            sos_id: alert.id,
            user_id: alert.user_id,
            status: alert.status,
            priority: alert.priority,
            assigned_garage: alert.assigned_garage,
            occurred_at,
        }
    }
}

/// Delivery channels for dispatch side effects.
///
/// Every method is best-effort: callers log failures and never surface them.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    /// Email the owner of a responder about a new alert nearby.
    async fn email_responder(
        &self,
        responder: &Responder,
        alert: &Alert,
    ) -> Result<(), NotificationError>;

    /// In-app notification to a responder owner about a new alert nearby.
    async fn notify_responder(
        &self,
        responder: &Responder,
        alert: &Alert,
    ) -> Result<(), NotificationError>;

    /// In-app notification to an administrator about a new alert.
    async fn notify_admin(&self, admin: &UserProfile, alert: &Alert)
        -> Result<(), NotificationError>;

    /// Warn a requester that their quota is nearly used up.
    async fn send_quota_warning(
        &self,
        user_id: Uuid,
        warning: &UsageWarning,
    ) -> Result<(), NotificationError>;

    /// Email a responder that an administrator assigned them an alert.
    async fn send_assignment(
        &self,
        responder: &Responder,
        alert: &Alert,
    ) -> Result<(), NotificationError>;

    /// In-app notification to the requester after a status change.
    async fn notify_requester(&self, alert: &Alert) -> Result<(), NotificationError>;

    /// In-app notification about credited points.
    async fn notify_points_awarded(&self, record: &PointsRecord) -> Result<(), NotificationError>;

    /// Publish a lifecycle event to the configured webhook.
    async fn publish_event(&self, event: &DispatchEvent) -> Result<(), NotificationError>;
}

/// A notification captured by [`RecordingNotificationSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SentNotification {
    ResponderEmail { responder_id: Uuid, alert_id: Uuid },
    ResponderNotification { responder_id: Uuid, alert_id: Uuid },
    AdminNotification { admin_id: Uuid, alert_id: Uuid },
    QuotaWarning { user_id: Uuid, remaining: i64 },
    Assignment { responder_id: Uuid, alert_id: Uuid },
    RequesterNotification { user_id: Uuid, status: AlertStatus },
    PointsAwarded { user_id: Uuid, points: i32 },
    Event { event_type: DispatchEventType, alert_id: Uuid },
}

/// In-memory sink for development and tests.
///
/// Records every delivery. Can simulate failing or slow channels.
#[derive(Debug, Default)]
pub struct RecordingNotificationSink {
    simulate_failure: bool,
    delay: Option<Duration>,
    sent: Mutex<Vec<SentNotification>>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every delivery fails.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// A sink that sleeps before each delivery.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Deliveries recorded so far.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.clear();
        }
    }

    async fn deliver(&self, notification: SentNotification) -> Result<(), NotificationError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.simulate_failure {
            tracing::warn!(?notification, "Recording sink simulating failure");
            return Err(NotificationError::Delivery("Simulated failure".to_string()));
        }

        tracing::debug!(?notification, "Recording sink captured notification");
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn email_responder(
        &self,
        responder: &Responder,
        alert: &Alert,
    ) -> Result<(), NotificationError> {
        self.deliver(SentNotification::ResponderEmail {
            responder_id: responder.id,
            alert_id: alert.id,
        })
        .await
    }

    async fn notify_responder(
        &self,
        responder: &Responder,
        alert: &Alert,
    ) -> Result<(), NotificationError> {
        self.deliver(SentNotification::ResponderNotification {
            responder_id: responder.id,
            alert_id: alert.id,
        })
        .await
    }

    async fn notify_admin(
        &self,
        admin: &UserProfile,
        alert: &Alert,
    ) -> Result<(), NotificationError> {
        self.deliver(SentNotification::AdminNotification {
            admin_id: admin.id,
            alert_id: alert.id,
        })
        .await
    }

    async fn send_quota_warning(
        &self,
        user_id: Uuid,
        warning: &UsageWarning,
    ) -> Result<(), NotificationError> {
        self.deliver(SentNotification::QuotaWarning {
            user_id,
            remaining: warning.remaining,
        })
        .await
    }

    async fn send_assignment(
        &self,
        responder: &Responder,
        alert: &Alert,
    ) -> Result<(), NotificationError> {
        self.deliver(SentNotification::Assignment {
            responder_id: responder.id,
            alert_id: alert.id,
        })
        .await
    }

    async fn notify_requester(&self, alert: &Alert) -> Result<(), NotificationError> {
        self.deliver(SentNotification::RequesterNotification {
            user_id: alert.user_id,
            status: alert.status,
        })
        .await
    }

    async fn notify_points_awarded(&self, record: &PointsRecord) -> Result<(), NotificationError> {
        self.deliver(SentNotification::PointsAwarded {
            user_id: record.user_id,
            points: record.points,
        })
        .await
    }

    async fn publish_event(&self, event: &DispatchEvent) -> Result<(), NotificationError> {
        self.deliver(SentNotification::Event {
            event_type: event.event_type,
            alert_id: event.sos_id,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_serialization() {
        assert_eq!(
            serde_json::to_string(&DispatchEventType::Created).unwrap(),
            "\"sos.created\""
        );
        assert_eq!(DispatchEventType::Resolved.to_string(), "sos.resolved");
        assert_eq!(
            DispatchEventType::for_status(AlertStatus::Cancelled),
            DispatchEventType::Cancelled
        );
    }

    #[tokio::test]
    async fn test_recording_sink_records() {
        let sink = RecordingNotificationSink::new();
        let warning = UsageWarning::new("Free", 1, 2);
        sink.send_quota_warning(Uuid::nil(), &warning).await.unwrap();

        assert_eq!(
            sink.sent(),
            vec![SentNotification::QuotaWarning {
                user_id: Uuid::nil(),
                remaining: 1
            }]
        );

        sink.clear();
        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn test_failing_sink_records_nothing() {
        let sink = RecordingNotificationSink::failing();
        let warning = UsageWarning::new("Free", 1, 2);
        let result = sink.send_quota_warning(Uuid::nil(), &warning).await;

        assert!(matches!(result, Err(NotificationError::Delivery(_))));
        assert!(sink.sent().is_empty());
    }
}
