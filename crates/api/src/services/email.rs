//! Email service for responder alerts and assignment notices.
//!
//! Supported providers:
//! - `console`: Logs emails (development)
//! - `sendgrid`: Uses the SendGrid API

use crate::config::EmailConfig;
use domain::models::{Alert, Responder, UserProfile};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
}

/// One addressee of an outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub email: String,
    pub name: Option<String>,
}

/// Addresses for mail about a garage: the owning account first, then the
/// garage's own contact address when it differs.
pub fn garage_recipients(owner: Option<&UserProfile>, responder: &Responder) -> Vec<Recipient> {
    let mut recipients = Vec::new();
    if let Some(owner) = owner.filter(|o| !o.email.trim().is_empty()) {
        recipients.push(Recipient {
            email: owner.email.clone(),
            name: Some(owner.name.clone()),
        });
    }
    if let Some(email) = responder.email.as_deref().filter(|e| !e.trim().is_empty()) {
        if !recipients
            .iter()
            .any(|r| r.email.eq_ignore_ascii_case(email))
        {
            recipients.push(Recipient {
                email: email.to_string(),
                name: Some(responder.name.clone()),
            });
        }
    }
    recipients
}

/// Transactional email sender.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    client: reqwest::Client,
    app_base_url: String,
}

impl EmailService {
    pub fn new(config: EmailConfig, app_base_url: impl Into<String>) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
            app_base_url: app_base_url.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Send an email message. Disabled services succeed without sending.
    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping send"
            );
            return Ok(());
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message).await,
            "sendgrid" => self.send_sendgrid(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        }
    }

    /// Tells a garage about a new SOS request in its service area.
    pub async fn send_new_alert_email(
        &self,
        recipients: &[Recipient],
        responder: &Responder,
        alert: &Alert,
    ) -> Result<(), EmailError> {
        self.send_all(recipients, |to| self.new_alert_message(to, responder, alert))
            .await
    }

    /// Tells a garage that an administrator assigned it an SOS request.
    pub async fn send_assignment_email(
        &self,
        recipients: &[Recipient],
        responder: &Responder,
        alert: &Alert,
    ) -> Result<(), EmailError> {
        self.send_all(recipients, |to| self.assignment_message(to, responder, alert))
            .await
    }

    /// Sends one message per recipient; reports the first failure after
    /// every recipient was attempted.
    async fn send_all<F>(&self, recipients: &[Recipient], build: F) -> Result<(), EmailError>
    where
        F: Fn(&Recipient) -> EmailMessage,
    {
        if recipients.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let mut failure = None;
        for recipient in recipients {
            if let Err(e) = self.send(build(recipient)).await {
                error!(to = %recipient.email, error = %e, "Email delivery failed");
                failure.get_or_insert(e);
            }
        }
        failure.map_or(Ok(()), Err)
    }

    pub fn new_alert_message(
        &self,
        to: &Recipient,
        responder: &Responder,
        alert: &Alert,
    ) -> EmailMessage {
        let link = format!("{}/garage/sos", self.app_base_url);
        let location = alert
            .address
            .clone()
            .unwrap_or_else(|| format_coordinates(alert));
        let name = to.name.as_deref().unwrap_or(&responder.name);

        let body_text = format!(
            "Hello {name},\n\n\
             A driver needs roadside assistance near {garage}.\n\n\
             Location: {location}\n\
             Vehicle: {vehicle}\n\
             Phone: {phone}\n\
             Priority: {priority}\n\n\
             Open your dashboard to claim the request: {link}\n",
            garage = responder.name,
            vehicle = alert.vehicle_type,
            phone = alert.phone,
            priority = alert.priority.as_str(),
        );

        let body_html = format!(
            r#"<p>Hello {name},</p>
<p>A driver needs roadside assistance near {garage}.</p>
<ul>
  <li><strong>Location:</strong> {location}</li>
  <li><strong>Vehicle:</strong> {vehicle}</li>
  <li><strong>Phone:</strong> {phone}</li>
  <li><strong>Priority:</strong> {priority}</li>
</ul>
<p><a href="{link}">Claim the request</a></p>"#,
            garage = responder.name,
            vehicle = alert.vehicle_type,
            phone = alert.phone,
            priority = alert.priority.as_str(),
        );

        EmailMessage {
            to: to.email.clone(),
            to_name: to.name.clone(),
            subject: "New SOS request near you".to_string(),
            body_text,
            body_html: Some(body_html),
        }
    }

    pub fn assignment_message(
        &self,
        to: &Recipient,
        responder: &Responder,
        alert: &Alert,
    ) -> EmailMessage {
        let link = format!("{}/garage/sos", self.app_base_url);
        let location = alert
            .address
            .clone()
            .unwrap_or_else(|| format_coordinates(alert));
        let name = to.name.as_deref().unwrap_or(&responder.name);

        let body_text = format!(
            "Hello {name},\n\n\
             {garage} has been assigned an SOS request.\n\n\
             Location: {location}\n\
             Phone: {phone}\n\
             Respond by: {deadline}\n\n\
             Details: {link}\n",
            garage = responder.name,
            phone = alert.phone,
            deadline = alert.sla_deadline.to_rfc3339(),
        );

        EmailMessage {
            to: to.email.clone(),
            to_name: to.name.clone(),
            subject: "SOS request assigned to your garage".to_string(),
            body_text,
            body_html: None,
        }
    }

    async fn send_console(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            to_name = ?message.to_name,
            subject = %message.subject,
            from = %self.config.sender_email,
            "Email (console provider)"
        );
        debug!(body_text = %message.body_text, "Email body");
        Ok(())
    }

    async fn send_sendgrid(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let body = sendgrid_payload(&self.config, &message);

        let response = self
            .client
            .post(SENDGRID_SEND_URL)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.sendgrid_api_key),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to = %message.to, subject = %message.subject, "Email sent via SendGrid");
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_body, "SendGrid API error");
            Err(EmailError::ProviderError(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }
}

fn format_coordinates(alert: &Alert) -> String {
    format!(
        "{:.5}, {:.5}",
        alert.location.latitude, alert.location.longitude
    )
}

fn sendgrid_payload(config: &EmailConfig, message: &EmailMessage) -> serde_json::Value {
    let mut recipient = serde_json::json!({ "email": message.to });
    if let Some(name) = &message.to_name {
        recipient["name"] = serde_json::json!(name);
    }

    let mut content = vec![serde_json::json!({
        "type": "text/plain",
        "value": message.body_text,
    })];
    if let Some(html) = &message.body_html {
        content.push(serde_json::json!({ "type": "text/html", "value": html }));
    }

    serde_json::json!({
        "personalizations": [{ "to": [recipient] }],
        "from": {
            "email": config.sender_email,
            "name": config.sender_name,
        },
        "subject": message.subject,
        "content": content,
    })
}
