//! Error types for the link cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Link Error Enum ==
/// Unified error type for the link cache.
///
/// Inside the core, a missing or expired link is a normal
/// [`LookupOutcome`](crate::coordinator::LookupOutcome); the `NotFound` and
/// `Expired` variants only appear once the HTTP layer turns an outcome
/// into a response.
#[derive(Error, Debug)]
pub enum LinkError {
    /// Key absent from both cache and store
    #[error("Link not found: {0}")]
    NotFound(String),

    /// Key existed but its expiry policy was met
    #[error("Link expired: {0}")]
    Expired(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A call to the durable store failed
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for LinkError {
    fn into_response(self) -> Response {
        let status = match &self {
            LinkError::NotFound(_) => StatusCode::NOT_FOUND,
            LinkError::Expired(_) => StatusCode::GONE,
            LinkError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            LinkError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            LinkError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the link cache.
pub type Result<T> = std::result::Result<T, LinkError>;
