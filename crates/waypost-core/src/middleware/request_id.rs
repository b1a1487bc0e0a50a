//! Request ID middleware
//!
//! Gives every request an identifier, available to later middleware and
//! handlers through [`RequestId`] in the request extensions and echoed back in
//! the `x-request-id` response header.

use super::layer::{BoxedNext, MiddlewareFuture, MiddlewareLayer};
use crate::request::Request;
use http::HeaderValue;
use std::fmt;

/// Header used to carry the request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identifier of the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh random ID
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The ID as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Middleware that assigns request IDs.
///
/// An incoming `x-request-id` header is reused when `trust_incoming` is set
/// (the default) and the value is a reasonable token; otherwise a UUID v4 is
/// generated.
#[derive(Clone, Debug)]
pub struct RequestIdLayer {
    trust_incoming: bool,
}

impl RequestIdLayer {
    /// Create a layer that reuses incoming IDs
    pub fn new() -> Self {
        Self {
            trust_incoming: true,
        }
    }

    /// Always generate a new ID, ignoring any incoming header
    pub fn always_generate() -> Self {
        Self {
            trust_incoming: false,
        }
    }
}

impl Default for RequestIdLayer {
    fn default() -> Self {
        Self::new()
    }
}

fn acceptable(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

impl MiddlewareLayer for RequestIdLayer {
    fn call(&self, mut req: Request, next: BoxedNext) -> MiddlewareFuture {
        let id = req
            .header(REQUEST_ID_HEADER)
            .filter(|id| self.trust_incoming && acceptable(id))
            .map(|id| RequestId(id.to_string()))
            .unwrap_or_else(RequestId::generate);
        req.extensions_mut().insert(id.clone());

        Box::pin(async move {
            let mut response = next(req).await?;
            if let Ok(value) = HeaderValue::from_str(id.as_str()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Pipeline;
    use crate::response::IntoResponse;
    use std::sync::{Arc, Mutex};

    fn request(id: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/");
        if let Some(id) = id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        builder.body("").unwrap().into()
    }

    async fn run(layer: RequestIdLayer, req: Request) -> (String, Option<String>) {
        let seen = Arc::new(Mutex::new(None));
        let capture = seen.clone();
        let terminal: BoxedNext = Arc::new(move |req: Request| {
            *capture.lock().unwrap() = req.extensions().get::<RequestId>().cloned();
            Box::pin(async { Ok::<_, crate::error::ApiError>(().into_response()) }) as MiddlewareFuture
        });
        let mut pipeline = Pipeline::new();
        pipeline.push(layer);
        let response = pipeline.execute(req, terminal).await.unwrap();
        let header = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let seen = seen.lock().unwrap().clone().map(|id| id.to_string());
        (header, seen)
    }

    #[tokio::test]
    async fn generates_uuid_when_missing() {
        let (header, seen) = run(RequestIdLayer::new(), request(None)).await;
        assert!(uuid::Uuid::parse_str(&header).is_ok());
        assert_eq!(seen.as_deref(), Some(header.as_str()));
    }

    #[tokio::test]
    async fn reuses_incoming_id() {
        let (header, _) = run(RequestIdLayer::new(), request(Some("abc-123"))).await;
        assert_eq!(header, "abc-123");
    }

    #[tokio::test]
    async fn ignores_untrusted_or_odd_ids() {
        let (header, _) = run(RequestIdLayer::always_generate(), request(Some("abc-123"))).await;
        assert_ne!(header, "abc-123");

        let (header, _) = run(RequestIdLayer::new(), request(Some("has spaces"))).await;
        assert_ne!(header, "has spaces");
    }
}
