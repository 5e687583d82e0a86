//! Role-gated alert status transitions.
//!
//! Every (scope, current status, requested status) combination maps either to
//! a [`Transition`] to apply or to a named error. The store applies the
//! transition conditionally on the status observed here, so a concurrent
//! change surfaces as a conflict instead of being overwritten.

use uuid::Uuid;

use crate::error::DispatchError;
use crate::models::{ActorScope, Alert, AlertStatus};
use crate::services::store::Transition;

/// Decides the transition for `requested`, or why it is not allowed.
///
/// `assign_to` is only honored for administrators; callers drop it for
/// other roles before calling.
pub fn plan_transition(
    scope: ActorScope,
    alert: &Alert,
    requested: AlertStatus,
    assign_to: Option<Uuid>,
) -> Result<Transition, DispatchError> {
    match scope {
        ActorScope::Admin => plan_admin(alert, requested, assign_to),
        ActorScope::Garage { garage_id } => plan_garage(garage_id, alert, requested),
        ActorScope::Requester { user_id } => plan_requester(user_id, alert, requested),
    }
}

fn plan_admin(
    alert: &Alert,
    requested: AlertStatus,
    assign_to: Option<Uuid>,
) -> Result<Transition, DispatchError> {
    use AlertStatus::*;

    if alert.status.is_terminal() {
        return Err(closed(alert.status));
    }

    // Assigning a garage always lands in `assigned`, whatever status was sent.
    if let Some(garage_id) = assign_to {
        return Ok(Transition {
            to: Assigned,
            assign_garage: Some(garage_id),
        });
    }

    match (alert.status, requested) {
        (Pending, Assigned) => Err(DispatchError::Validation(
            "A garage is required to assign an SOS request".to_string(),
        )),
        (Pending | Assigned, Resolved) | (Pending, Cancelled) => Ok(Transition {
            to: requested,
            assign_garage: None,
        }),
        (from, to) => Err(DispatchError::Conflict(format!(
            "Cannot change SOS request from {} to {}",
            from, to
        ))),
    }
}

fn plan_garage(
    garage_id: Uuid,
    alert: &Alert,
    requested: AlertStatus,
) -> Result<Transition, DispatchError> {
    match requested {
        AlertStatus::Assigned => {
            if alert.status != AlertStatus::Pending {
                return Err(DispatchError::Conflict(
                    "This SOS request has already been claimed or closed".to_string(),
                ));
            }
            Ok(Transition {
                to: AlertStatus::Assigned,
                assign_garage: Some(garage_id),
            })
        }
        AlertStatus::Resolved => {
            if alert.assigned_garage != Some(garage_id) {
                return Err(DispatchError::Forbidden(
                    "You can only resolve SOS requests assigned to your garage".to_string(),
                ));
            }
            if alert.status != AlertStatus::Assigned {
                return Err(closed(alert.status));
            }
            Ok(Transition {
                to: AlertStatus::Resolved,
                assign_garage: None,
            })
        }
        other => Err(DispatchError::Forbidden(format!(
            "Garages cannot set SOS requests to {}",
            other
        ))),
    }
}

fn plan_requester(
    user_id: Uuid,
    alert: &Alert,
    requested: AlertStatus,
) -> Result<Transition, DispatchError> {
    if alert.user_id != user_id {
        return Err(DispatchError::Forbidden(
            "You can only update your own SOS requests".to_string(),
        ));
    }
    if requested != AlertStatus::Cancelled {
        return Err(DispatchError::Forbidden(
            "You can only cancel your SOS requests".to_string(),
        ));
    }
    if alert.status != AlertStatus::Pending {
        return Err(DispatchError::Conflict(format!(
            "Only pending SOS requests can be cancelled; this one is {}",
            alert.status
        )));
    }
    Ok(Transition {
        to: AlertStatus::Cancelled,
        assign_garage: None,
    })
}

fn closed(status: AlertStatus) -> DispatchError {
    DispatchError::Conflict(format!("SOS request is already {}", status))
}
