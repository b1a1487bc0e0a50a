//! TestClient for driving an [`App`] in-process
//!
//! Requests go through the full matcher and middleware chain without binding
//! a socket.
//!
//! # Example
//!
//! ```rust,ignore
//! use waypost::prelude::*;
//!
//! async fn hello(_req: Request) -> Result<&'static str> {
//!     Ok("Hello, World!")
//! }
//!
//! #[tokio::test]
//! async fn test_hello() {
//!     let app = App::builder().route(Route::get("/", hello)).build().unwrap();
//!     let client = TestClient::new(app);
//!
//!     let response = client.get("/").await;
//!     response.assert_status(200);
//!     assert_eq!(response.text(), "Hello, World!");
//! }
//! ```

use crate::app::App;
use crate::request::Request;
use crate::response::Response;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use http_body_util::BodyExt;
use serde::{de::DeserializeOwned, Serialize};

/// Test client for integration testing without network binding
#[derive(Clone, Debug)]
pub struct TestClient {
    app: App,
}

impl TestClient {
    /// Create a new test client for `app`
    pub fn new(app: App) -> Self {
        Self { app }
    }

    /// The application under test
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Send a GET request
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(TestRequest::get(path)).await
    }

    /// Send a POST request with JSON body
    pub async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> TestResponse {
        self.request(TestRequest::post(path).json(body)).await
    }

    /// Send a request with full control
    ///
    /// # Panics
    ///
    /// Panics if the path is not a valid URI.
    pub async fn request(&self, req: TestRequest) -> TestResponse {
        let mut builder = http::Request::builder().method(req.method).uri(req.path.as_str());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(req.headers);
        }
        let http_req = builder
            .body(req.body.unwrap_or_default())
            .unwrap_or_else(|err| panic!("invalid test request {}: {}", req.path, err));

        let response = self.app.dispatch(Request::from_http(http_req)).await;
        TestResponse::from_response(response).await
    }
}

/// Test request builder
#[derive(Debug, Clone)]
pub struct TestRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl TestRequest {
    /// Create a request with any method
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Create a GET request
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    /// Create a POST request
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    /// Create a PUT request
    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Create a PATCH request
    pub fn patch(path: &str) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Create a DELETE request
    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a header. Invalid names or values are ignored.
    pub fn header(mut self, key: &str, value: &str) -> Self {
        if let (Ok(name), Ok(val)) = (key.parse::<HeaderName>(), HeaderValue::from_str(value)) {
            self.headers.insert(name, val);
        }
        self
    }

    /// Set the request body as JSON and the matching content type
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        if let Ok(bytes) = serde_json::to_vec(body) {
            self.body = Some(Bytes::from(bytes));
            self.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        self
    }

    /// Set the request body as raw bytes
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Test response with assertion helpers
#[derive(Debug)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    async fn from_response(response: Response) -> Self {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map(|b| b.to_bytes())
            .unwrap_or_default();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Get the response status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a header value as a string
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|v| v.to_str().ok())
    }

    /// Get the response body as bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Get the response body as a string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Assert the status code
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Assert a header value
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, key: &str, expected: &str) -> &Self {
        let actual = self.header(key).unwrap_or("");
        assert_eq!(
            actual, expected,
            "Expected header '{}' to be '{}', got '{}'",
            key, expected, actual
        );
        self
    }

    /// Assert the body text
    ///
    /// # Panics
    ///
    /// Panics if the body doesn't match.
    pub fn assert_text(&self, expected: &str) -> &Self {
        assert_eq!(self.text(), expected, "Body mismatch");
        self
    }

    /// Assert the `error.type` field of a JSON error body
    ///
    /// # Panics
    ///
    /// Panics if the body is not a JSON error or the type doesn't match.
    pub fn assert_error_type(&self, expected: &str) -> &Self {
        let body: serde_json::Value = self
            .json()
            .unwrap_or_else(|err| panic!("Response body is not JSON ({}): {}", err, self.text()));
        assert_eq!(
            body["error"]["type"].as_str(),
            Some(expected),
            "Unexpected error body: {}",
            body
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::response::Json;
    use crate::router::Route;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct NewUser {
        name: String,
    }

    async fn create(req: Request) -> Result<(StatusCode, Json<NewUser>)> {
        let user: NewUser = req.json()?;
        Ok((StatusCode::CREATED, Json(user)))
    }

    fn client() -> TestClient {
        TestClient::new(
            App::builder()
                .route(Route::post("/users", create))
                .build()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn round_trips_json() {
        let response = client()
            .post_json("/users", &NewUser { name: "ada".into() })
            .await;
        response
            .assert_status(201)
            .assert_header("content-type", "application/json");
        assert_eq!(response.json::<NewUser>().unwrap().name, "ada");
    }

    #[tokio::test]
    async fn reports_errors() {
        let client = client();
        client
            .request(TestRequest::post("/users").body("not json"))
            .await
            .assert_status(400)
            .assert_error_type("bad_request");
        client
            .get("/users")
            .await
            .assert_status(405)
            .assert_header("allow", "POST");
    }
}
