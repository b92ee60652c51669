use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// ApiError
///
/// The complete failure taxonomy of the API. Every handler converts its failures into
/// one of these variants; the `IntoResponse` implementation below is the single place
/// where a failure becomes an HTTP status and a `{"error": message}` JSON body.
/// Clients never see a raw database error or a stack trace.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required field was missing or empty (400).
    #[error("{0}")]
    Validation(String),
    /// A uniqueness rule was violated: duplicate email or an already-booked slot (400).
    #[error("{0}")]
    Conflict(String),
    /// The caller is not (or not correctly) logged in for this endpoint (401).
    #[error("{0}")]
    Authentication(String),
    /// The caller is logged in but lacks the required role (403).
    #[error("{0}")]
    Authorization(String),
    /// A referenced resource no longer exists where the handler distinguishes that (404).
    #[error("{0}")]
    NotFound(String),
    /// The storage layer failed. Details are logged server-side at the repository;
    /// only this generic message reaches the client (500).
    #[error("{0}")]
    Storage(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// StorageError
///
/// Opaque marker returned by the `Repository` trait when a connection or statement
/// fails. The underlying `sqlx::Error` is logged where it happens and deliberately
/// not carried along; handlers map this marker to `ApiError::Storage` with their own
/// operation-specific message. Crucially, this is distinct from an `Ok` result with
/// zero rows, which every handler treats as a normal outcome.
#[derive(Debug, thiserror::Error)]
#[error("database operation failed")]
pub struct StorageError;
