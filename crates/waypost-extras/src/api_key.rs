//! API Key check middleware
//!
//! Rejects requests that do not carry one of the configured keys with a 401
//! response, without calling the rest of the chain. Keys are read from a
//! header and, optionally, a query parameter.
//!
//! # Example
//!
//! ```rust,ignore
//! use waypost_extras::ApiKeyLayer;
//!
//! App::builder()
//!     .layer(ApiKeyLayer::new().header("X-API-Key").add_key("secret"))
//!     .route(Route::get("/reports", reports))
//!     .build()?;
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use waypost_core::{
    middleware::{BoxedNext, MiddlewareFuture, MiddlewareLayer},
    ApiError, IntoResponse, Request,
};

/// API Key configuration
#[derive(Clone, Debug)]
pub struct ApiKeyConfig {
    /// Valid API keys
    pub keys: Arc<HashSet<String>>,
    /// Header name to check for API key
    pub header_name: String,
    /// Query parameter name to check for API key
    pub query_param_name: Option<String>,
    /// Path prefixes that skip the check
    pub skip_paths: Vec<String>,
}

impl Default for ApiKeyConfig {
    fn default() -> Self {
        Self {
            keys: Arc::new(HashSet::new()),
            header_name: "X-API-Key".to_string(),
            query_param_name: None,
            skip_paths: vec!["/health".to_string()],
        }
    }
}

/// API Key middleware
#[derive(Clone, Debug, Default)]
pub struct ApiKeyLayer {
    config: ApiKeyConfig,
}

impl ApiKeyLayer {
    /// Create a new API key layer with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the header name to check for API key
    pub fn header(mut self, name: impl Into<String>) -> Self {
        self.config.header_name = name.into();
        self
    }

    /// Also accept the key in a query parameter
    pub fn query_param(mut self, name: impl Into<String>) -> Self {
        self.config.query_param_name = Some(name.into());
        self
    }

    /// Add a valid API key
    pub fn add_key(mut self, key: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config.keys).insert(key.into());
        self
    }

    /// Add multiple valid API keys
    pub fn add_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Arc::make_mut(&mut self.config.keys).extend(keys.into_iter().map(Into::into));
        self
    }

    /// Skip the check for paths starting with `path`
    pub fn skip_path(mut self, path: impl Into<String>) -> Self {
        self.config.skip_paths.push(path.into());
        self
    }

    fn extract_key(&self, req: &Request) -> Option<String> {
        if let Some(key) = req.header(&self.config.header_name) {
            return Some(key.to_string());
        }
        let param = self.config.query_param_name.as_ref()?;
        req.query_params().remove(param)
    }
}

impl MiddlewareLayer for ApiKeyLayer {
    fn call(&self, req: Request, next: BoxedNext) -> MiddlewareFuture {
        if self
            .config
            .skip_paths
            .iter()
            .any(|p| req.path().starts_with(p.as_str()))
        {
            return next(req);
        }

        let rejection = match self.extract_key(&req) {
            Some(key) if self.config.keys.contains(&key) => None,
            Some(_) => Some("Invalid API key"),
            None => Some("Missing API key"),
        };

        match rejection {
            None => next(req),
            Some(message) => {
                tracing::debug!(path = %req.path(), reason = message, "API key rejected");
                Box::pin(async move { Ok(ApiError::unauthorized(message).into_response()) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use waypost_core::{Pipeline, Response};

    async fn run(layer: ApiKeyLayer, uri: &str, key: Option<&str>) -> (u16, bool) {
        let reached = Arc::new(AtomicBool::new(false));
        let flag = reached.clone();
        let next: BoxedNext = Arc::new(move |_req: Request| {
            flag.store(true, Ordering::SeqCst);
            Box::pin(async { Ok::<Response, ApiError>("OK".into_response()) }) as MiddlewareFuture
        });

        let mut builder = http::Request::builder().uri(uri);
        if let Some(key) = key {
            builder = builder.header("X-API-Key", key);
        }
        let req: Request = builder.body("").unwrap().into();

        let mut pipeline = Pipeline::new();
        pipeline.push(layer);
        let response = pipeline.execute(req, next).await.unwrap();
        (response.status().as_u16(), reached.load(Ordering::SeqCst))
    }

    fn layer() -> ApiKeyLayer {
        ApiKeyLayer::new().header("X-API-Key").add_key("test-key-123")
    }

    #[tokio::test]
    async fn valid_header_passes() {
        assert_eq!(run(layer(), "/api/users", Some("test-key-123")).await, (200, true));
    }

    #[tokio::test]
    async fn invalid_or_missing_key_short_circuits() {
        assert_eq!(run(layer(), "/api/users", Some("wrong-key")).await, (401, false));
        assert_eq!(run(layer(), "/api/users", None).await, (401, false));
    }

    #[tokio::test]
    async fn skips_health_check() {
        assert_eq!(run(layer(), "/health", None).await, (200, true));
    }

    #[tokio::test]
    async fn query_param_key() {
        let layer = ApiKeyLayer::new().query_param("api_key").add_keys(["k1", "k2"]);
        assert_eq!(run(layer.clone(), "/api/users?api_key=k2", None).await, (200, true));
        assert_eq!(run(layer, "/api/users?api_key=k3", None).await, (401, false));
    }
}
