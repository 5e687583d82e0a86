//! Outbound delivery channels used by the notification sink.

pub mod email;
pub mod notifier;
pub mod webhook;

pub use email::{EmailError, EmailService};
pub use notifier::PlatformNotifier;
pub use webhook::{WebhookError, WebhookPublisher};
