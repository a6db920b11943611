use agora_shared::FieldError;
use agora_store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid request body")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Replace a store-level "no such row" with a 404 carrying `msg`; every
    /// other error passes through.
    pub fn missing(msg: &'static str) -> impl Fn(ServerError) -> ServerError {
        move |e| match e {
            ServerError::Storage(StoreError::NotFound) => ServerError::NotFound(msg.to_string()),
            other => other,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) | ServerError::Conflict(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Unauthenticated(_) | ServerError::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::Storage(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ServerError::Validation(errors) => serde_json::json!({ "errors": errors }),
            ServerError::Storage(ref e) => {
                tracing::error!(error = %e, "storage failure");
                serde_json::json!({ "msg": "Server error" })
            }
            ServerError::Internal(ref e) => {
                tracing::error!(error = %e, "internal failure");
                serde_json::json!({ "msg": "Server error" })
            }
            other => serde_json::json!({ "msg": other.to_string() }),
        };

        (status, axum::Json(body)).into_response()
    }
}
