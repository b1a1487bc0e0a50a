//! Structured request/response logging middleware
//!
//! Emits one event when a request enters the layer and one when the rest of
//! the chain returns, tagged with the request ID set by
//! [`RequestIdLayer`](waypost_core::RequestIdLayer) when it runs earlier.
//!
//! # Example
//!
//! ```rust,ignore
//! use waypost_extras::{LogFormat, LoggingLayer};
//!
//! App::builder()
//!     .layer(RequestIdLayer::new())
//!     .layer(LoggingLayer::new().format(LogFormat::Json))
//!     .route(Route::get("/", index))
//!     .build()?;
//! ```

use std::time::Instant;
use waypost_core::{
    middleware::{BoxedNext, MiddlewareFuture, MiddlewareLayer},
    Request, RequestId,
};

/// Logging format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One line per request and response
    #[default]
    Compact,
    /// Banner lines plus optional header dumps at debug level
    Detailed,
    /// A serialized JSON object per event
    Json,
}

/// Logging configuration
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Logging format
    pub format: LogFormat,
    /// Whether to log request headers
    pub log_request_headers: bool,
    /// Whether to log response headers
    pub log_response_headers: bool,
    /// Path prefixes to skip
    pub skip_paths: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            log_request_headers: false,
            log_response_headers: false,
            skip_paths: vec!["/health".to_string()],
        }
    }
}

/// Logging middleware layer
#[derive(Clone, Debug, Default)]
pub struct LoggingLayer {
    config: LoggingConfig,
}

impl LoggingLayer {
    /// Create a new logging layer with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new logging layer with custom configuration
    pub fn with_config(config: LoggingConfig) -> Self {
        Self { config }
    }

    /// Set the logging format
    pub fn format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Enable request header logging (detailed format only)
    pub fn log_request_headers(mut self, enabled: bool) -> Self {
        self.config.log_request_headers = enabled;
        self
    }

    /// Enable response header logging (detailed format only)
    pub fn log_response_headers(mut self, enabled: bool) -> Self {
        self.config.log_response_headers = enabled;
        self
    }

    /// Add a path prefix to skip
    pub fn skip_path(mut self, path: impl Into<String>) -> Self {
        self.config.skip_paths.push(path.into());
        self
    }
}

impl MiddlewareLayer for LoggingLayer {
    fn call(&self, req: Request, next: BoxedNext) -> MiddlewareFuture {
        if self
            .config
            .skip_paths
            .iter()
            .any(|p| req.path().starts_with(p.as_str()))
        {
            return next(req);
        }

        let config = self.config.clone();
        let method = req.method().to_string();
        let uri = req.uri().to_string();
        let version = format!("{:?}", req.version());
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .map(|id| id.as_str().to_string())
            .unwrap_or_else(|| "N/A".to_string());

        match config.format {
            LogFormat::Compact => {
                tracing::info!(
                    request_id = %request_id,
                    method = %method,
                    uri = %uri,
                    version = %version,
                    "incoming request"
                );
            }
            LogFormat::Detailed => {
                tracing::info!(
                    request_id = %request_id,
                    method = %method,
                    uri = %uri,
                    version = %version,
                    "=== Incoming Request ==="
                );
                if config.log_request_headers {
                    for (name, value) in req.headers() {
                        if let Ok(val) = value.to_str() {
                            tracing::debug!(request_id = %request_id, header = %name, value = %val, "request header");
                        }
                    }
                }
            }
            LogFormat::Json => {
                let json = serde_json::json!({
                    "type": "request",
                    "request_id": request_id,
                    "method": method,
                    "uri": uri,
                    "version": version,
                });
                tracing::info!("{}", json);
            }
        }

        let start = Instant::now();
        let fut = next(req);

        Box::pin(async move {
            let result = fut.await;
            let duration_ms = start.elapsed().as_millis() as u64;

            // An Err is rendered later by the dispatcher; log the status it will get.
            let (status, failed) = match &result {
                Ok(response) => (response.status().as_u16(), false),
                Err(err) => (err.status.as_u16(), true),
            };

            match config.format {
                LogFormat::Compact => {
                    if failed {
                        tracing::warn!(
                            request_id = %request_id,
                            method = %method,
                            uri = %uri,
                            status,
                            duration_ms,
                            "request failed"
                        );
                    } else {
                        tracing::info!(
                            request_id = %request_id,
                            method = %method,
                            uri = %uri,
                            status,
                            duration_ms,
                            "request completed"
                        );
                    }
                }
                LogFormat::Detailed => {
                    tracing::info!(
                        request_id = %request_id,
                        status,
                        duration_ms,
                        failed,
                        "=== Response Sent ==="
                    );
                    if let (true, Ok(response)) = (config.log_response_headers, &result) {
                        for (name, value) in response.headers() {
                            if let Ok(val) = value.to_str() {
                                tracing::debug!(request_id = %request_id, header = %name, value = %val, "response header");
                            }
                        }
                    }
                }
                LogFormat::Json => {
                    let json = serde_json::json!({
                        "type": "response",
                        "request_id": request_id,
                        "method": method,
                        "uri": uri,
                        "status": status,
                        "failed": failed,
                        "duration_ms": duration_ms,
                    });
                    tracing::info!("{}", json);
                }
            }

            result
        })
    }
}
