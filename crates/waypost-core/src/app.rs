//! Application builder and dispatch entrypoint

use crate::error::{ApiError, RouteError};
use crate::middleware::{BoxedNext, MiddlewareFuture, MiddlewareLayer, Pipeline};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::{Route, RouteMatch, Router};
use crate::server::{BoxError, Server};
use http::{header, HeaderValue, Method};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info,waypost=debug";

/// Install a fmt subscriber filtered by `RUST_LOG` (or
/// [`DEFAULT_LOG_FILTER`]). Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    init_tracing_with(None);
}

/// Like [`init_tracing`], but an explicit `filter` (e.g. from
/// `WAYPOST_LOG_FILTER`) takes precedence over `RUST_LOG`.
///
/// Call it before [`App::builder`], which installs the default subscriber.
pub fn init_tracing_with(filter: Option<&str>) {
    let _ = tracing_subscriber::registry()
        .with(log_filter(filter))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Explicit filter, then `RUST_LOG`, then [`DEFAULT_LOG_FILTER`]. An
/// unparsable explicit filter is skipped.
fn log_filter(filter: Option<&str>) -> EnvFilter {
    filter
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Builder for an [`App`]
///
/// # Example
///
/// ```rust,ignore
/// use waypost::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), BoxError> {
///     App::builder()
///         .state(Database::connect().await?)
///         .layer(RequestIdLayer::new())
///         .layer(TracingLayer::new())
///         .route(Route::get("/users/{id:int}", show_user).name("user.show"))
///         .build()?
///         .serve("127.0.0.1:8080")
///         .await
/// }
/// ```
pub struct AppBuilder {
    routes: Vec<Route>,
    pipeline: Pipeline,
    state: http::Extensions,
}

impl AppBuilder {
    /// Create a new builder and initialize tracing if not already done
    pub fn new() -> Self {
        init_tracing();
        Self {
            routes: Vec::new(),
            pipeline: Pipeline::new(),
            state: http::Extensions::new(),
        }
    }

    /// Add a route
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Add a middleware around every route.
    ///
    /// The first middleware added is the outermost.
    pub fn layer<L: MiddlewareLayer>(mut self, layer: L) -> Self {
        self.pipeline.push(layer);
        self
    }

    /// Add shared state, reachable from handlers via `Request::state::<S>()`
    pub fn state<S>(mut self, state: S) -> Self
    where
        S: Clone + Send + Sync + 'static,
    {
        self.state.insert(state);
        self
    }

    /// Register every route and compose the middleware chains.
    ///
    /// Returns the first registration error.
    pub fn build(self) -> Result<App, RouteError> {
        let mut router = Router::new();
        for route in self.routes {
            router.register(route)?;
        }

        let chains = router
            .routes()
            .map(|route| self.pipeline.compose(Arc::clone(&route.handler)))
            .collect();
        let fallback = self.pipeline.compose(Arc::new(unmatched));

        tracing::info!(
            routes = router.len(),
            middleware = self.pipeline.len(),
            "Route table built"
        );

        Ok(App {
            inner: Arc::new(AppInner {
                router,
                chains,
                fallback,
                state: Arc::new(self.state),
            }),
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct AppInner {
    router: Router,
    /// Composed chain per route id
    chains: Vec<BoxedNext>,
    /// Chain ending in the 404/405 responder
    fallback: BoxedNext,
    state: Arc<http::Extensions>,
}

/// Why the fallback chain was entered
#[derive(Clone, Debug)]
enum Unmatched {
    NotFound,
    MethodNotAllowed(Vec<Method>),
}

fn unmatched(req: Request) -> MiddlewareFuture {
    let outcome = req
        .extensions()
        .get::<Unmatched>()
        .cloned()
        .unwrap_or(Unmatched::NotFound);
    let method = req.method().clone();
    let path = req.path().to_string();

    Box::pin(async move {
        let response = match outcome {
            Unmatched::NotFound => {
                ApiError::not_found(format!("No route found for {} {}", method, path))
                    .into_response()
            }
            Unmatched::MethodNotAllowed(allowed) => {
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut response = ApiError::method_not_allowed(format!(
                    "Method {} not allowed for {}",
                    method, path
                ))
                .into_response();
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    response.headers_mut().insert(header::ALLOW, value);
                }
                response
            }
        };
        Ok(response)
    })
}

/// A built application: route table plus composed middleware chains.
///
/// Cheap to clone; all clones share the same immutable table.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

impl App {
    /// Start building an application
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    /// The route table
    pub fn router(&self) -> &Router {
        &self.inner.router
    }

    /// Build the path of a named route, see [`Router::url_for`]
    pub fn url_for<K, V>(&self, name: &str, params: &[(K, V)]) -> Result<String, RouteError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.inner.router.url_for(name, params)
    }

    /// Run a request through the matcher and the middleware chain.
    ///
    /// Unmatched requests still pass through the middleware and end in a 404
    /// or 405 (with `Allow`) response. An error no middleware handled is
    /// logged and rendered as a JSON error response.
    pub async fn dispatch(&self, mut req: Request) -> Response {
        req.set_state(Arc::clone(&self.inner.state));

        let chain = match self.inner.router.match_route(req.method(), req.path()) {
            RouteMatch::Found { route, params } => {
                req.set_params(params);
                &self.inner.chains[route.id()]
            }
            RouteMatch::NotFound => {
                req.extensions_mut().insert(Unmatched::NotFound);
                &self.inner.fallback
            }
            RouteMatch::MethodNotAllowed { allowed } => {
                req.extensions_mut().insert(Unmatched::MethodNotAllowed(allowed));
                &self.inner.fallback
            }
        };

        let method = req.method().clone();
        let path = req.path().to_string();
        match chain(req).await {
            Ok(response) => response,
            Err(err) => {
                if err.status.is_server_error() {
                    tracing::error!(
                        method = %method,
                        path = %path,
                        status = err.status.as_u16(),
                        error_type = %err.error_type,
                        message = %err.message,
                        internal = err.internal_details().unwrap_or("-"),
                        "Unhandled error"
                    );
                } else {
                    tracing::debug!(
                        method = %method,
                        path = %path,
                        status = err.status.as_u16(),
                        error_type = %err.error_type,
                        "Request rejected"
                    );
                }
                err.into_response()
            }
        }
    }

    /// Serve the application over HTTP/1 until the process exits
    pub async fn serve(self, addr: &str) -> Result<(), BoxError> {
        Server::bind(addr).await?.run(self).await
    }

    /// Serve the application until `shutdown` resolves
    pub async fn serve_with_shutdown<F>(
        self,
        addr: &str,
        shutdown: F,
    ) -> Result<(), BoxError>
    where
        F: Future<Output = ()> + Send,
    {
        Server::bind(addr).await?.run_until(self, shutdown).await
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("router", &self.inner.router)
            .finish()
    }
}

impl tower_service::Service<Request> for App {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let app = self.clone();
        Box::pin(async move { Ok(app.dispatch(req).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::middleware::from_fn;
    use http::StatusCode;
    use http_body_util::BodyExt;
    use std::sync::Mutex;

    async fn show_user(req: Request) -> Result<String> {
        Ok(format!("user {}", req.param("id").unwrap_or("?")))
    }

    async fn active(_req: Request) -> Result<&'static str> {
        Ok("active users")
    }

    async fn boom(_req: Request) -> Result<&'static str> {
        Err(ApiError::internal("database unavailable"))
    }

    fn request(method: Method, uri: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body("")
            .unwrap()
            .into()
    }

    async fn text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn app() -> App {
        App::builder()
            .route(Route::get("/users/{id:int}", show_user).name("user.show"))
            .route(Route::get("/users/active", active))
            .route(Route::get("/boom", boom))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn dispatches_to_matching_handler_with_params() {
        let app = app();
        let response = app.dispatch(request(Method::GET, "/users/42")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "user 42");

        let response = app.dispatch(request(Method::GET, "/users/active")).await;
        assert_eq!(text(response).await, "active users");
    }

    #[tokio::test]
    async fn not_found_and_method_not_allowed() {
        let app = app();
        let response = app.dispatch(request(Method::GET, "/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.dispatch(request(Method::POST, "/users/5")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET");
    }

    #[tokio::test]
    async fn unhandled_errors_become_json_responses() {
        let response = app().dispatch(request(Method::GET, "/boom")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_str(&text(response).await).unwrap();
        assert_eq!(body["error"]["type"], "internal_error");
    }

    #[tokio::test]
    async fn middleware_sees_unmatched_requests() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let app = App::builder()
            .layer(from_fn(move |req: Request, next: BoxedNext| {
                let log = log.clone();
                async move {
                    let path = req.path().to_string();
                    let result = next(req).await;
                    let status = match &result {
                        Ok(res) => res.status(),
                        Err(err) => err.status,
                    };
                    log.lock().unwrap().push((path, status.as_u16()));
                    result
                }
            }))
            .route(Route::get("/users/{id:int}", show_user))
            .build()
            .unwrap();

        app.dispatch(request(Method::GET, "/users/1")).await;
        app.dispatch(request(Method::GET, "/missing")).await;
        app.dispatch(request(Method::DELETE, "/users/1")).await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ("/users/1".to_string(), 200),
                ("/missing".to_string(), 404),
                ("/users/1".to_string(), 405),
            ]
        );
    }

    #[tokio::test]
    async fn state_is_reachable_from_handlers() {
        #[derive(Clone)]
        struct Greeting(&'static str);

        let app = App::builder()
            .state(Greeting("hi"))
            .route(Route::get("/", |req: Request| async move {
                let greeting = req
                    .state::<Greeting>()
                    .ok_or_else(|| ApiError::internal("missing state"))?;
                Ok::<_, ApiError>(greeting.0)
            }))
            .build()
            .unwrap();
        let response = app.dispatch(request(Method::GET, "/")).await;
        assert_eq!(text(response).await, "hi");
    }

    #[test]
    fn build_reports_registration_errors() {
        let err = App::builder()
            .route(Route::get("/users/{id}", active))
            .route(Route::get("/users/{name}", active))
            .build()
            .unwrap_err();
        assert!(matches!(err, RouteError::DuplicateRoute { .. }));
    }

    #[test]
    fn url_for_delegates_to_router() {
        assert_eq!(app().url_for("user.show", &[("id", "42")]).unwrap(), "/users/42");
    }

    #[test]
    fn configured_log_filter_takes_precedence() {
        assert_eq!(log_filter(Some("waypost=trace")).to_string(), "waypost=trace");
        let mut directives: Vec<String> = log_filter(Some("warn,waypost::router=debug"))
            .to_string()
            .split(',')
            .map(str::to_string)
            .collect();
        directives.sort();
        assert_eq!(directives, ["warn", "waypost::router=debug"]);
        // Unparsable directives fall back to RUST_LOG or the default.
        assert_eq!(
            log_filter(Some("waypost=notalevel")).to_string(),
            log_filter(None).to_string()
        );
    }

    #[tokio::test]
    async fn works_as_tower_service() {
        use tower::ServiceExt;
        let response = app()
            .oneshot(request(Method::GET, "/users/9"))
            .await
            .unwrap();
        assert_eq!(text(response).await, "user 9");
    }
}
