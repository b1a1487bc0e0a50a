//! Response types for waypost
//!
//! This module provides types for building HTTP responses. The core trait is
//! [`IntoResponse`], which lets handlers return plain values.
//!
//! | Type | Status | Content-Type |
//! |------|--------|--------------|
//! | `String` / `&'static str` | 200 | text/plain |
//! | `()` | 200 | - |
//! | `StatusCode` | given | - |
//! | [`Json<T>`] | 200 | application/json |
//! | [`Html<T>`] | 200 | text/html |
//! | [`Redirect`] | 3xx | - |
//! | `(StatusCode, R)` / `(StatusCode, HeaderMap, R)` | given | from `R` |
//! | [`ApiError`] | varies | application/json |

use crate::error::{get_environment, ApiError, ErrorResponse};
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use http_body_util::Full;
use serde::Serialize;

/// HTTP Response type
pub type Response = http::Response<Full<Bytes>>;

/// Trait for types that can be converted into an HTTP response
pub trait IntoResponse {
    /// Convert self into a Response
    fn into_response(self) -> Response;
}

pub(crate) fn build(status: StatusCode, content_type: Option<&'static str>, body: Bytes) -> Response {
    let mut response = http::Response::new(Full::new(body));
    *response.status_mut() = status;
    if let Some(ct) = content_type {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(ct));
    }
    response
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for () {
    fn into_response(self) -> Response {
        build(StatusCode::OK, None, Bytes::new())
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        build(StatusCode::OK, Some("text/plain; charset=utf-8"), Bytes::from_static(self.as_bytes()))
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        build(StatusCode::OK, Some("text/plain; charset=utf-8"), Bytes::from(self))
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        build(self, None, Bytes::new())
    }
}

impl<R: IntoResponse> IntoResponse for (StatusCode, R) {
    fn into_response(self) -> Response {
        let mut response = self.1.into_response();
        *response.status_mut() = self.0;
        response
    }
}

impl<R: IntoResponse> IntoResponse for (StatusCode, HeaderMap, R) {
    fn into_response(self) -> Response {
        let mut response = self.2.into_response();
        *response.status_mut() = self.0;
        response.headers_mut().extend(self.1);
        response
    }
}

// Environment-aware: 5xx messages are masked in production
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = serde_json::to_vec(&ErrorResponse::from_error(self, get_environment()))
            .unwrap_or_else(|_| {
                br#"{"error":{"type":"internal_error","message":"Failed to serialize error"}}"#.to_vec()
            });
        build(status, Some("application/json"), Bytes::from(body))
    }
}

/// JSON response wrapper
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(body) => build(StatusCode::OK, Some("application/json"), Bytes::from(body)),
            Err(err) => ApiError::internal("Failed to serialize response")
                .with_internal(err.to_string())
                .into_response(),
        }
    }
}

/// HTML response wrapper
#[derive(Debug, Clone)]
pub struct Html<T>(pub T);

impl<T: Into<String>> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        build(StatusCode::OK, Some("text/html; charset=utf-8"), Bytes::from(self.0.into()))
    }
}

/// Redirect response, typically built from `App::url_for`
#[derive(Debug, Clone)]
pub struct Redirect {
    status: StatusCode,
    location: HeaderValue,
}

impl Redirect {
    fn with_status(status: StatusCode, uri: &str) -> Result<Self, ApiError> {
        let location = HeaderValue::from_str(uri)
            .map_err(|_| ApiError::internal("Invalid redirect URI").with_internal(uri.to_string()))?;
        Ok(Self { status, location })
    }

    /// Create a 302 Found redirect
    pub fn to(uri: &str) -> Result<Self, ApiError> {
        Self::with_status(StatusCode::FOUND, uri)
    }

    /// Create a 301 Permanent redirect
    pub fn permanent(uri: &str) -> Result<Self, ApiError> {
        Self::with_status(StatusCode::MOVED_PERMANENTLY, uri)
    }

    /// Create a 307 Temporary redirect
    pub fn temporary(uri: &str) -> Result<Self, ApiError> {
        Self::with_status(StatusCode::TEMPORARY_REDIRECT, uri)
    }
}

impl IntoResponse for Redirect {
    fn into_response(self) -> Response {
        let mut response = build(self.status, None, Bytes::new());
        response.headers_mut().insert(header::LOCATION, self.location);
        response
    }
}
