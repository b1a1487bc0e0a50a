//! Error types for waypost
//!
//! Two families live here:
//!
//! - [`RouteError`]: registration and reverse-routing failures. These are
//!   configuration errors and are returned to the startup code.
//! - [`ApiError`]: the error type of handlers and middleware. It travels
//!   outward through the middleware chain as `Err(ApiError)` until some
//!   middleware (or the dispatch entrypoint) turns it into a response.

use crate::path_validation::PathValidationError;
use http::{Method, StatusCode};
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Result type alias for waypost operations
pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Errors raised while building the route table or generating URLs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// A route with the same method and the same pattern shape (placeholders
    /// erased) is already registered.
    #[error("duplicate route: {method} {pattern} has the same shape as {method} {existing}")]
    DuplicateRoute {
        method: Method,
        pattern: String,
        existing: String,
    },

    /// The route name is already used by another route.
    #[error("duplicate route name '{name}' ({pattern})")]
    DuplicateName { name: String, pattern: String },

    /// A constraint tag is unknown, names a missing placeholder, or disagrees
    /// with the inline tag of its placeholder.
    #[error("invalid constraint on '{param}' in {pattern}: {reason}")]
    InvalidConstraint {
        pattern: String,
        param: String,
        reason: String,
    },

    /// The pattern itself is malformed.
    #[error(transparent)]
    InvalidPattern(#[from] PathValidationError),

    /// The generated matcher could not be compiled.
    #[error("failed to compile matcher for {pattern}: {reason}")]
    MatcherCompile { pattern: String, reason: String },

    /// Only GET, POST, PUT, DELETE, PATCH and OPTIONS routes can be registered.
    #[error("unsupported method {method} for route {pattern}")]
    UnsupportedMethod { method: Method, pattern: String },

    /// `url_for` was called with a name no route carries.
    #[error("unknown route name '{0}'")]
    UnknownRoute(String),

    /// `url_for` was called without a value for one of the placeholders.
    #[error("missing parameter '{param}' for route '{name}'")]
    MissingParameter { name: String, param: String },

    /// `url_for` was given a value its placeholder would never match.
    #[error("value '{value}' for parameter '{param}' of route '{name}' does not satisfy '{constraint}'")]
    InvalidParameterValue {
        name: String,
        param: String,
        value: String,
        constraint: &'static str,
    },
}

/// Standard API error type
///
/// Provides structured error responses following a consistent JSON format.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code
    pub status: StatusCode,
    /// Error type identifier
    pub error_type: String,
    /// Human-readable error message
    pub message: String,
    /// Internal details (logged, never serialized)
    pub(crate) internal: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error_type: error_type.into(),
            message: message.into(),
            internal: None,
        }
    }

    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    /// Create a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    /// Create a 403 Forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", message)
    }

    /// Create a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    /// Create a 405 Method Not Allowed error
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", message)
    }

    /// Create a 409 Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "conflict", message)
    }

    /// Create a 500 Internal Server Error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    /// Create a 503 Service Unavailable error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", message)
    }

    /// Add internal details (for logging, hidden from the response)
    pub fn with_internal(mut self, details: impl Into<String>) -> Self {
        self.internal = Some(details.into());
        self
    }

    /// Internal details attached with [`ApiError::with_internal`]
    pub fn internal_details(&self) -> Option<&str> {
        self.internal.as_deref()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Deployment environment, read once from `WAYPOST_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Full error messages in responses
    Development,
    /// Server error messages are masked
    Production,
}

impl Environment {
    /// Parse an environment name; anything but "production"/"prod" is development.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    /// Whether server error messages should be replaced with a generic one
    pub fn masks_server_errors(&self) -> bool {
        matches!(self, Self::Production)
    }
}

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

/// The current environment, detected from `WAYPOST_ENV` on first use.
pub fn get_environment() -> Environment {
    *ENVIRONMENT.get_or_init(|| {
        std::env::var("WAYPOST_ENV")
            .map(|v| Environment::from_name(&v))
            .unwrap_or(Environment::Development)
    })
}

/// JSON representation of API error response
#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub(crate) struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

impl ErrorResponse {
    pub(crate) fn from_error(err: ApiError, env: Environment) -> Self {
        let message = if err.status.is_server_error() && env.masks_server_errors() {
            "An internal error occurred".to_string()
        } else {
            err.message
        };
        Self {
            error: ErrorBody {
                error_type: err.error_type,
                message,
            },
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::bad_request(format!("Invalid JSON: {}", err))
    }
}

impl From<serde_urlencoded::de::Error> for ApiError {
    fn from(err: serde_urlencoded::de::Error) -> Self {
        ApiError::bad_request(format!("Invalid query string: {}", err))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::internal("I/O error").with_internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_only_server_errors_in_production() {
        let err = ApiError::internal("db exploded").with_internal("pool timeout");
        let body = ErrorResponse::from_error(err, Environment::Production);
        assert_eq!(body.error.message, "An internal error occurred");

        let err = ApiError::bad_request("missing field");
        let body = ErrorResponse::from_error(err, Environment::Production);
        assert_eq!(body.error.message, "missing field");

        let err = ApiError::internal("db exploded");
        let body = ErrorResponse::from_error(err, Environment::Development);
        assert_eq!(body.error.message, "db exploded");
    }

    #[test]
    fn environment_names() {
        assert_eq!(Environment::from_name("prod"), Environment::Production);
        assert_eq!(Environment::from_name(" Production "), Environment::Production);
        assert_eq!(Environment::from_name("staging"), Environment::Development);
    }

    #[test]
    fn internal_details_are_kept_out_of_display() {
        let err = ApiError::internal("boom").with_internal("secret");
        assert_eq!(err.to_string(), "internal_error: boom");
        assert_eq!(err.internal_details(), Some("secret"));
    }

    #[test]
    fn route_error_messages() {
        let err = RouteError::MissingParameter {
            name: "user.show".into(),
            param: "id".into(),
        };
        assert_eq!(err.to_string(), "missing parameter 'id' for route 'user.show'");
        assert_eq!(
            RouteError::UnknownRoute("nope".into()).to_string(),
            "unknown route name 'nope'"
        );
    }
}
