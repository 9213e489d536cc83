//! Service error taxonomy and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use charter_db::DbError;
use charter_types::ErrorBody;
use tracing::error;

/// Errors surfaced by the query and mutation services.
///
/// None of these is fatal to the daemon, and none leaves a partial write.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed input. Carries the first offending field's message.
    #[error("{0}")]
    Validation(String),

    /// `(client, title)` already taken.
    #[error("A contract with this client and title already exists.")]
    DuplicateKey,

    /// Target contract does not exist.
    #[error("Contract record not found")]
    NotFound,

    /// Storage or other unexpected failure. The detail is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::DuplicateKey => StatusCode::BAD_REQUEST,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::DuplicateKey(_) => ServiceError::DuplicateKey,
            DbError::NotFound(_) => ServiceError::NotFound,
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if let ServiceError::Internal(ref detail) = self {
            error!("Request failed: {}", detail);
        }
        let body = ErrorBody {
            error: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}
