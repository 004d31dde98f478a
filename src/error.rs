// src/error.rs
use thiserror::Error;

/// Everything that can go wrong between a form action and the scoring API.
///
/// Every variant is converted to one user-facing line through
/// [`ApiError::user_message`]; nothing here is meant to bubble past the
/// component that produced it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A required field is missing or blank. Raised before any request is built.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No response was received.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx response carrying a structured JSON error body.
    #[error("HTTP {status}: {message}")]
    HttpJson { status: u16, message: String },

    /// Non-2xx response with a body that is not JSON. The body is kept for
    /// diagnostics only.
    #[error("Server returned {status}: {status_text}")]
    HttpOpaque {
        status: u16,
        status_text: String,
        diagnostic: String,
    },

    /// Failure reported by the signup or login endpoint.
    #[error("Auth failed ({status}): {message}")]
    Auth { status: u16, message: String },

    /// 2xx response whose body does not have the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The session could not be persisted.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A request of the same kind is already in flight for this instance.
    #[error("A request is already in progress")]
    Busy,
}

/// Errors from the signup and login endpoints. Server-side causes are not
/// distinguished further on the client.
pub type AuthError = ApiError;

impl ApiError {
    /// The message shown to the end user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Transport(msg) => msg.clone(),
            ApiError::HttpJson { message, .. } => message.clone(),
            ApiError::HttpOpaque {
                status,
                status_text,
                ..
            } => format!("Server returned {}: {}", status, status_text),
            ApiError::Auth { message, .. } => message.clone(),
            ApiError::MalformedResponse(msg) => msg.clone(),
            ApiError::Storage(msg) => msg.clone(),
            ApiError::Busy => "A request is already in progress".to_string(),
        }
    }

    /// HTTP status of the failed response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpJson { status, .. }
            | ApiError::HttpOpaque { status, .. }
            | ApiError::Auth { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<crate::core::storage::StorageError> for ApiError {
    fn from(e: crate::core::storage::StorageError) -> Self {
        ApiError::Storage(e.to_string())
    }
}
