//! Request types for waypost

use crate::error::{ApiError, Result};
use crate::path_params::PathParams;
use bytes::Bytes;
use http::{request::Parts, Extensions, HeaderMap, Method, Uri, Version};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

/// HTTP Request wrapper
///
/// Carries the already-parsed request line, headers and body, the path
/// parameters filled in by the matcher, and per-request extensions that
/// middleware can use to hand data to later middleware and the handler.
pub struct Request {
    pub(crate) parts: Parts,
    pub(crate) body: Bytes,
    pub(crate) state: Arc<Extensions>,
    pub(crate) path_params: PathParams,
}

impl Request {
    /// Create a new request from parts
    pub fn from_parts(parts: Parts, body: Bytes) -> Self {
        Self {
            parts,
            body,
            state: Arc::new(Extensions::new()),
            path_params: PathParams::new(),
        }
    }

    /// Create a request from an `http::Request` with a buffered body
    pub fn from_http<B: Into<Bytes>>(req: http::Request<B>) -> Self {
        let (parts, body) = req.into_parts();
        Self::from_parts(parts, body.into())
    }

    /// Get the HTTP method
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Get the URI
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Get the HTTP version
    pub fn version(&self) -> Version {
        self.parts.version
    }

    /// Get the headers
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Get mutable headers
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.parts.headers
    }

    /// Get a header value as a string, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get request extensions
    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    /// Get mutable extensions
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.parts.extensions
    }

    /// Get the request path
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Get the query string
    pub fn query_string(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    /// Decoded query parameters. Repeated keys keep the last value.
    pub fn query_params(&self) -> HashMap<String, String> {
        self.query_string()
            .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
            .map(|pairs| pairs.into_iter().collect())
            .unwrap_or_default()
    }

    /// Deserialize the query string into `T`
    pub fn query<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_urlencoded::from_str(self.query_string().unwrap_or(""))?)
    }

    /// Get the body bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Take the body bytes, leaving an empty body behind
    pub fn take_body(&mut self) -> Bytes {
        std::mem::take(&mut self.body)
    }

    /// Replace the body
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Deserialize a JSON body into `T`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if self.body.is_empty() {
            return Err(ApiError::bad_request("Request body is empty"));
        }
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Get path parameters
    pub fn params(&self) -> &PathParams {
        &self.path_params
    }

    /// Get a specific path parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name)
    }

    pub(crate) fn set_params(&mut self, params: PathParams) {
        self.path_params = params;
    }

    /// Get a shared application state value registered with `AppBuilder::state`
    pub fn state<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.state.get::<T>()
    }

    pub(crate) fn set_state(&mut self, state: Arc<Extensions>) {
        self.state = state;
    }
}

impl<B: Into<Bytes>> From<http::Request<B>> for Request {
    fn from(req: http::Request<B>) -> Self {
        Self::from_http(req)
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("version", &self.parts.version)
            .field("params", &self.path_params)
            .finish()
    }
}
