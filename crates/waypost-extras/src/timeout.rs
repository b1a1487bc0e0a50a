//! Request timeout middleware
//!
//! Bounds the time spent in the rest of the chain. When the deadline passes
//! the inner future is dropped and a 408 response is returned instead.
//!
//! # Example
//!
//! ```rust,ignore
//! use waypost_extras::TimeoutLayer;
//!
//! App::builder()
//!     .layer(TimeoutLayer::from_secs(30))
//!     .route(Route::get("/", index))
//!     .build()?;
//! ```

use http::StatusCode;
use std::time::Duration;
use waypost_core::{
    middleware::{BoxedNext, MiddlewareFuture, MiddlewareLayer},
    ApiError, IntoResponse, Request,
};

/// Middleware that enforces request timeouts
#[derive(Clone, Debug)]
pub struct TimeoutLayer {
    timeout: Duration,
}

impl TimeoutLayer {
    /// Create a new timeout middleware with the given duration
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Create a timeout layer with seconds
    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// Create a timeout layer with milliseconds
    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// The configured deadline
    pub fn duration(&self) -> Duration {
        self.timeout
    }
}

impl MiddlewareLayer for TimeoutLayer {
    fn call(&self, req: Request, next: BoxedNext) -> MiddlewareFuture {
        let timeout = self.timeout;
        let path = req.path().to_string();

        Box::pin(async move {
            match tokio::time::timeout(timeout, next(req)).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        path = %path,
                        timeout_ms = timeout.as_millis() as u64,
                        "Request timed out"
                    );
                    Ok(ApiError::new(
                        StatusCode::REQUEST_TIMEOUT,
                        "request_timeout",
                        format!("Request exceeded timeout of {}ms", timeout.as_millis()),
                    )
                    .into_response())
                }
            }
        })
    }
}
