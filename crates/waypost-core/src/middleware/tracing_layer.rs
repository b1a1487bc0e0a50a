//! Tracing middleware
//!
//! Wraps each request in an `http_request` span carrying the method, path,
//! and request ID, and logs one completion line with the status and duration.

use super::layer::{BoxedNext, MiddlewareFuture, MiddlewareLayer};
use super::request_id::RequestId;
use crate::request::Request;
use http::StatusCode;
use std::time::Instant;
use tracing::{info_span, Instrument, Level};

/// Middleware layer that creates tracing spans for requests
///
/// # Example
///
/// ```rust,ignore
/// App::builder()
///     .layer(RequestIdLayer::new())
///     .layer(TracingLayer::new())
///     .route(Route::get("/", index))
/// ```
#[derive(Clone, Debug)]
pub struct TracingLayer {
    level: Level,
}

impl TracingLayer {
    /// Create a new TracingLayer with default INFO level
    pub fn new() -> Self {
        Self { level: Level::INFO }
    }

    /// Create a TracingLayer logging successful requests at `level`
    pub fn with_level(level: Level) -> Self {
        Self { level }
    }
}

impl Default for TracingLayer {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! completed {
    ($level:expr, $($fields:tt)*) => {
        match $level {
            Level::TRACE => tracing::trace!($($fields)*),
            Level::DEBUG => tracing::debug!($($fields)*),
            Level::INFO => tracing::info!($($fields)*),
            Level::WARN => tracing::warn!($($fields)*),
            _ => tracing::error!($($fields)*),
        }
    };
}

impl MiddlewareLayer for TracingLayer {
    fn call(&self, req: Request, next: BoxedNext) -> MiddlewareFuture {
        let level = self.level;
        let method = req.method().clone();
        let path = req.path().to_string();
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .map(|id| id.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let span = info_span!(
            "http_request",
            method = %method,
            path = %path,
            request_id = %request_id,
            status = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
        );

        Box::pin(async move {
            let start = Instant::now();
            let result = next(req).instrument(span.clone()).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let status = match &result {
                Ok(response) => response.status(),
                Err(err) => err.status,
            };
            span.record("status", status.as_u16());
            span.record("duration_ms", duration_ms);

            span.in_scope(|| {
                if result.is_err() || is_failure(status) {
                    tracing::warn!(
                        method = %method,
                        path = %path,
                        status = status.as_u16(),
                        duration_ms,
                        error = result.is_err(),
                        "Request failed"
                    );
                } else {
                    completed!(
                        level,
                        method = %method,
                        path = %path,
                        status = status.as_u16(),
                        duration_ms,
                        "Request completed"
                    );
                }
            });

            result
        })
    }
}

fn is_failure(status: StatusCode) -> bool {
    status.is_client_error() || status.is_server_error()
}
