//! Dispatch error taxonomy.

use thiserror::Error;

use crate::services::store::StoreError;

/// Link suggested to requesters whose quota is exhausted.
pub const UPGRADE_ACTION: &str = "/pricing";

/// Errors returned by dispatch operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Missing or malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requester used up the plan quota for this cycle.
    #[error("Quota exceeded: {message}")]
    QuotaExceeded { message: String, action: String },

    /// Reference data is unusable (no plan to provision or repair with).
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The alert changed state underneath the request.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Role or ownership does not permit the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DispatchError {
    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        DispatchError::QuotaExceeded {
            message: message.into(),
            action: UPGRADE_ACTION.to_string(),
        }
    }

    /// Builds a validation error from `validator` output, keeping the first
    /// field message.
    pub fn from_validation(errors: &validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .collect();
        messages.sort();
        messages.dedup();

        DispatchError::Validation(messages.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_exceeded_carries_upgrade_action() {
        match DispatchError::quota_exceeded("Upgrade to continue") {
            DispatchError::QuotaExceeded { message, action } => {
                assert_eq!(message, "Upgrade to continue");
                assert_eq!(action, "/pricing");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            DispatchError::Forbidden("nope".to_string()).to_string(),
            "Forbidden: nope"
        );
        assert_eq!(
            DispatchError::Conflict("taken".to_string()).to_string(),
            "Conflict: taken"
        );
    }
}
