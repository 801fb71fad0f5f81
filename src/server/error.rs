//! Error taxonomy for the HTTP boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Request handling failures. Validation and not-found carry a message
/// safe to show the client; everything else collapses to a generic 500
/// with the cause logged server-side only.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServerError {
    pub fn not_found(what: &str) -> Self {
        ServerError::NotFound(format!("{} not found", what))
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::Validation(message) => {
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            ServerError::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),
            ServerError::Internal(err) => {
                error!("Unhandled error serving request: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
