//! # API Errors
//!
//! Every failure the client core can observe, classified once at the
//! transport boundary so controllers and callers can decide display policy.

use serde_json::Value;
use shared::models::{ErrorBody, FieldErrors};
use thiserror::Error;

/// Result type alias for client operations.
pub type ApiResult<T> = Result<T, ApiError>;

const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// Classified failure of a request against the campus API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The request was superseded or its controller was torn down.
    /// Never surfaced to the user.
    #[error("request cancelled")]
    Cancelled,

    /// The server could not be reached or the connection failed.
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// The server rejected the payload with per-field errors (HTTP 422).
    #[error("validation failed: {message}")]
    Validation { message: String, errors: FieldErrors },

    /// The resource does not exist (HTTP 404).
    #[error("not found: {message}")]
    NotFound { message: String },

    /// The caller is not allowed to perform the request (HTTP 401/403).
    #[error("forbidden ({status}): {message}")]
    Forbidden { status: u16, message: String },

    /// Any other non-success status.
    #[error("server returned {status}: {message}")]
    Http { status: u16, message: String },

    /// The response body could not be read as JSON.
    #[error("invalid response body: {message}")]
    Decode { message: String },
}

impl ApiError {
    /// Create a transport failure.
    pub fn transport<T: Into<String>>(message: T) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a decode failure.
    pub fn decode<T: Into<String>>(message: T) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Classify a non-success HTTP response.
    ///
    /// The body is read as `{status, message, errors?}` when possible; a 422
    /// carrying a non-empty `errors` map becomes [`ApiError::Validation`].
    #[must_use]
    pub fn from_response(status: u16, body: Option<&Value>) -> Self {
        let body: ErrorBody = body
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or_default();
        let message = if body.message.trim().is_empty() {
            default_message(status).to_string()
        } else {
            body.message.clone()
        };

        match status {
            422 if body.has_field_errors() => Self::Validation {
                message,
                errors: body.errors.unwrap_or_default(),
            },
            401 | 403 => Self::Forbidden { status, message },
            404 => Self::NotFound { message },
            _ => Self::Http { status, message },
        }
    }

    /// `true` for the silent cancellation outcome.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// `true` when retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Http { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            _ => false,
        }
    }

    /// Per-field errors of a validation failure.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }

    /// Message suitable for display to the end user.
    ///
    /// Transport, server and decode failures collapse into one generic,
    /// retryable message; not-found and permission failures get a specific one.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::Cancelled => "The request was cancelled.".to_string(),
            Self::Transport { .. } | Self::Http { .. } | Self::Decode { .. } => {
                GENERIC_MESSAGE.to_string()
            }
            Self::Validation { message, .. } => message.clone(),
            Self::NotFound { .. } => "The requested item could not be found.".to_string(),
            Self::Forbidden { status: 401, .. } => {
                "Your session has expired. Please sign in again.".to_string()
            }
            Self::Forbidden { .. } => {
                "You do not have permission to perform this action.".to_string()
            }
        }
    }
}

fn default_message(status: u16) -> &'static str {
    match status {
        401 => "Unauthenticated.",
        403 => "This action is unauthorized.",
        404 => "Not found.",
        422 => "The given data was invalid.",
        500..=599 => "Server error.",
        _ => "Request failed.",
    }
}
