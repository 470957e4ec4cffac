//! Errors returned by calls against the Signatrust backend.

use thiserror::Error;

/// Convenience alias for backend call results.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of a single backend round trip.
///
/// The HTTP adapter is the only producer of these values; state containers and
/// views receive them unchanged.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered 401. The session has already been cleared and the
    /// login redirect issued by the time the caller sees this.
    #[error("Unauthorized: session is missing or expired")]
    Unauthorized,

    /// The server answered 500. A notification has already been emitted.
    #[error("Server error: {0}")]
    Server(String),

    /// Any other non-2xx answer.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Connection, TLS or timeout failure before a status was received.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The body did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The request could not be built (bad URL, unreadable upload, ...).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Server(_) => Some(500),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}
