//! SOS request endpoints.
//!
//! One resource, three verbs: create (POST), role-scoped listing (GET) and
//! role-gated status changes (PATCH).

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use domain::models::{AlertResponse, CreateAlertRequest, ListAlertsQuery, UpdateAlertStatusRequest};
use serde::Serialize;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthenticatedActor;

/// Success envelope shared by every SOS response.
#[derive(Debug, Serialize)]
pub struct SosEnvelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> SosEnvelope<T> {
    fn new(data: T, message: Option<String>) -> Self {
        Self {
            success: true,
            data,
            message,
        }
    }
}

fn body_error(rejection: JsonRejection) -> ApiError {
    ApiError::Validation(format!("Invalid request body: {}", rejection.body_text()))
}

/// POST /api/v1/sos
///
/// Creates an SOS alert for the caller and notifies nearby garages.
pub async fn create_sos(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    payload: Result<Json<CreateAlertRequest>, JsonRejection>,
) -> Result<Json<SosEnvelope<AlertResponse>>, ApiError> {
    let Json(request) = payload.map_err(body_error)?;

    let created = state.dispatch.create_alert(actor, request).await?;

    info!(
        sos_id = %created.alert.id,
        user_id = %actor.user_id,
        responders_notified = created.responders_notified,
        "SOS request created"
    );

    Ok(Json(SosEnvelope::new(
        AlertResponse::from(created.alert),
        Some(created.message),
    )))
}

/// GET /api/v1/sos?status=pending,assigned
///
/// Lists the alerts visible to the caller, newest first.
pub async fn list_sos(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Query(query): Query<ListAlertsQuery>,
) -> Result<Json<SosEnvelope<Vec<AlertResponse>>>, ApiError> {
    let alerts = state.dispatch.list_alerts(actor, query).await?;
    Ok(Json(SosEnvelope::new(alerts, None)))
}

/// PATCH /api/v1/sos
///
/// Applies a status change (claim, resolve, cancel or admin assignment).
pub async fn update_sos(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    payload: Result<Json<UpdateAlertStatusRequest>, JsonRejection>,
) -> Result<Json<SosEnvelope<AlertResponse>>, ApiError> {
    let Json(request) = payload.map_err(body_error)?;

    let updated = state.dispatch.update_status(actor, request).await?;

    info!(
        sos_id = %updated.alert.id,
        user_id = %actor.user_id,
        role = %actor.role,
        status = %updated.alert.status,
        "SOS status updated"
    );

    Ok(Json(SosEnvelope::new(
        AlertResponse::from(updated.alert),
        Some(updated.message),
    )))
}
