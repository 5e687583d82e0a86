//! Signed webhook publisher for SOS lifecycle events.
//!
//! Payloads are JSON-encoded [`DispatchEvent`]s signed with HMAC-SHA256 and
//! sent in the `X-Webhook-Signature` header as `sha256=<hex>`.

use domain::services::DispatchEvent;
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::WebhookConfig;

/// Signature header sent with every delivery.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Event type header sent with every delivery.
pub const EVENT_HEADER: &str = "X-Webhook-Event";

const WEBHOOK_TIMEOUT_SECS: u64 = 5;

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HMAC signing error: {0}")]
    Signing(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Webhook endpoint returned {0}")]
    Rejected(u16),
}

/// Publishes lifecycle events to a single configured endpoint.
#[derive(Clone)]
pub struct WebhookPublisher {
    config: WebhookConfig,
    client: Client,
}

impl WebhookPublisher {
    pub fn new(config: WebhookConfig) -> Result<Self, WebhookError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.url.is_empty()
    }

    /// Sends `event`. Disabled publishers succeed without sending.
    pub async fn publish(&self, event: &DispatchEvent) -> Result<(), WebhookError> {
        if !self.is_enabled() {
            debug!(event = event.event_type.as_str(), "Webhook disabled, skipping");
            return Ok(());
        }

        let payload = serde_json::to_string(event)?;
        let signature = sign_payload(&payload, &self.config.secret)?;

        let response = self
            .client
            .post(&self.config.url)
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .header(EVENT_HEADER, event.event_type.as_str())
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(
                event = event.event_type.as_str(),
                sos_id = %event.sos_id,
                status = status.as_u16(),
                "Webhook delivered"
            );
            Ok(())
        } else {
            warn!(
                event = event.event_type.as_str(),
                sos_id = %event.sos_id,
                status = status.as_u16(),
                "Webhook endpoint rejected delivery"
            );
            Err(WebhookError::Rejected(status.as_u16()))
        }
    }
}

/// Signs `payload` with HMAC-SHA256, formatted as `sha256=<hex>`.
pub fn sign_payload(payload: &str, secret: &str) -> Result<String, WebhookError> {
    type HmacSha256 = Hmac<Sha256>;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| WebhookError::Signing(e.to_string()))?;

    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(format!("sha256={}", signature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::models::{AlertStatus, Priority};
    use domain::services::DispatchEventType;
    use uuid::Uuid;

    fn event() -> DispatchEvent {
        DispatchEvent {
            event_type: DispatchEventType::Created,
            sos_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            status: AlertStatus::Pending,
            priority: Priority::Normal,
            assigned_garage: None,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn test_sign_payload_format() {
        let signature = sign_payload(r#"{"type":"sos.created"}"#, "secret").unwrap();
        assert!(signature.starts_with("sha256="));
        assert_eq!(signature.len(), "sha256=".len() + 64);
    }

    #[test]
    fn test_sign_payload_is_deterministic_per_secret() {
        let a = sign_payload("payload", "one").unwrap();
        let b = sign_payload("payload", "one").unwrap();
        let c = sign_payload("payload", "two").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_known_signature() {
        // Well-known HMAC-SHA256 test vector.
        let signature = sign_payload("The quick brown fox jumps over the lazy dog", "key").unwrap();
        assert_eq!(
            signature,
            "sha256=f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[tokio::test]
    async fn test_disabled_publisher_skips() {
        let publisher = WebhookPublisher::new(WebhookConfig::default()).unwrap();
        assert!(!publisher.is_enabled());
        assert!(publisher.publish(&event()).await.is_ok());
    }

    #[test]
    fn test_enabled_requires_url() {
        let publisher = WebhookPublisher::new(WebhookConfig {
            enabled: true,
            url: String::new(),
            secret: "s".to_string(),
        })
        .unwrap();
        assert!(!publisher.is_enabled());
    }
}
