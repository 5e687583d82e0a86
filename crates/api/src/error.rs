use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DispatchError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Plan quota used up; `action` points the client at the upgrade page.
    #[error("Quota exceeded: {message}")]
    QuotaExceeded { message: String, action: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<String>,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<String>) {
        match self {
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone(), None)
            }
            ApiError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone(), None)
            }
            ApiError::QuotaExceeded { message, action } => (
                StatusCode::FORBIDDEN,
                "quota_exceeded",
                message.clone(),
                Some(action.clone()),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone(), None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            ApiError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration_error",
                    "The service is not configured correctly".into(),
                    None,
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                    None,
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, action) = self.parts();

        let body = ErrorBody {
            success: false,
            error: error_code.into(),
            message,
            action,
        };

        (status, Json(body)).into_response()
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Validation(msg) => ApiError::Validation(msg),
            DispatchError::QuotaExceeded { message, action } => {
                ApiError::QuotaExceeded { message, action }
            }
            DispatchError::Configuration(msg) => ApiError::Configuration(msg),
            DispatchError::NotFound(msg) => ApiError::NotFound(msg),
            DispatchError::Conflict(msg) => ApiError::Conflict(msg),
            DispatchError::Forbidden(msg) => ApiError::Forbidden(msg),
            DispatchError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => ApiError::Conflict("Resource already exists".into()),
                Some("23503") => ApiError::NotFound("Referenced resource not found".into()),
                _ => ApiError::Internal(format!("Database error: {}", db_err)),
            },
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        match DispatchError::from_validation(&errors) {
            DispatchError::Validation(msg) => ApiError::Validation(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use domain::services::StoreError;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let (status, body) = body_json(ApiError::Unauthorized("Not authenticated".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "unauthorized");
        assert!(body.get("action").is_none());
    }

    #[tokio::test]
    async fn test_quota_exceeded_carries_action() {
        let err: ApiError = DispatchError::quota_exceeded("Upgrade your plan").into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "quota_exceeded");
        assert_eq!(body["message"], "Upgrade your plan");
        assert_eq!(body["action"], "/pricing");
    }

    #[tokio::test]
    async fn test_configuration_message_is_suppressed() {
        let err: ApiError = DispatchError::Configuration("no free plan seeded".into()).into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "configuration_error");
        assert!(!body["message"].as_str().unwrap().contains("seeded"));
    }

    #[tokio::test]
    async fn test_store_error_is_internal() {
        let err: ApiError =
            DispatchError::Store(StoreError::Database("connection reset".into())).into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[test]
    fn test_dispatch_error_status_mapping() {
        let cases = [
            (DispatchError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (DispatchError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (DispatchError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (DispatchError::Conflict("x".into()), StatusCode::CONFLICT),
        ];
        for (err, expected) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.into_response().status(), expected);
        }
    }

    #[test]
    fn test_sqlx_row_not_found() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
