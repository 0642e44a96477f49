use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use coffer_shared::error::{PasswordError, ValidationError};
use coffer_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payload too large: limit is {max} bytes")]
    PayloadTooLarge { max: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// The catch-all answer for a missing, unknown or expired session.
    pub fn unauthenticated() -> Self {
        ServerError::Forbidden("Invalid or expired session".into())
    }
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ServerError::NotFound("Record not found".into()),
            StoreError::SessionExpired => ServerError::unauthenticated(),
            StoreError::Conflict(msg) => ServerError::BadRequest(format!("Conflict: {msg}")),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationError> for ServerError {
    fn from(e: ValidationError) -> Self {
        ServerError::BadRequest(e.to_string())
    }
}

impl From<PasswordError> for ServerError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::Empty | PasswordError::TooLong { .. } => {
                ServerError::BadRequest(e.to_string())
            }
            PasswordError::Hashing(_) => ServerError::Internal(e.to_string()),
        }
    }
}

impl From<QueryRejection> for ServerError {
    fn from(e: QueryRejection) -> Self {
        ServerError::BadRequest(e.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::PayloadTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            ServerError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
