//! Onion-model middleware pipeline
//!
//! Middleware run in registration order on the way in and in reverse order on
//! the way out. Each one receives the request and a [`BoxedNext`] continuation
//! and either awaits `next(req)` (optionally rewriting the response) or returns
//! without calling it, which short-circuits everything further in.
//!
//! Errors are values: an `Err(ApiError)` from the handler or any middleware
//! travels outward through every `next(req).await` until a middleware chooses
//! to turn it into a response.

use crate::error::Result;
use crate::request::Request;
use crate::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by middleware, handlers and continuations
pub type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'static>>;

/// A boxed next function for middleware chains
pub type BoxedNext = Arc<dyn Fn(Request) -> MiddlewareFuture + Send + Sync>;

/// Trait for request/response interceptors
pub trait MiddlewareLayer: Send + Sync + 'static {
    /// Apply this middleware to a request, calling `next` to continue the chain
    fn call(&self, req: Request, next: BoxedNext) -> MiddlewareFuture;
}

impl<L: MiddlewareLayer + ?Sized> MiddlewareLayer for Arc<L> {
    fn call(&self, req: Request, next: BoxedNext) -> MiddlewareFuture {
        (**self).call(req, next)
    }
}

/// An ordered list of middleware
#[derive(Clone, Default)]
pub struct Pipeline {
    layers: Vec<Arc<dyn MiddlewareLayer>>,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Append a middleware.
    ///
    /// Middleware are executed in the order they are added (outermost first).
    pub fn push<L: MiddlewareLayer>(&mut self, layer: L) {
        self.layers.push(Arc::new(layer));
    }

    /// Add a middleware to the beginning of the pipeline, making it outermost.
    pub fn prepend<L: MiddlewareLayer>(&mut self, layer: L) {
        self.layers.insert(0, Arc::new(layer));
    }

    /// Check if the pipeline is empty
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Get the number of middleware
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Fold the middleware around `terminal` into a single continuation.
    ///
    /// The result can be called any number of times; the application composes
    /// each route once and reuses the chain for every request.
    pub fn compose(&self, terminal: BoxedNext) -> BoxedNext {
        // Build from the inside out so the first layer ends up outermost
        self.layers.iter().rev().fold(terminal, |next, layer| {
            let layer = Arc::clone(layer);
            let wrapped: BoxedNext =
                Arc::new(move |req: Request| layer.call(req, Arc::clone(&next)));
            wrapped
        })
    }

    /// Run `req` through the pipeline, ending at `terminal`
    pub fn execute(&self, req: Request, terminal: BoxedNext) -> MiddlewareFuture {
        self.compose(terminal)(req)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("layers", &self.layers.len())
            .finish()
    }
}

/// Middleware built from a closure, see [`from_fn`]
#[derive(Clone)]
pub struct FromFn<F> {
    f: F,
}

/// Create middleware from an async closure.
///
/// ```rust,ignore
/// let stamp = from_fn(|req, next| async move {
///     let mut res = next(req).await?;
///     res.headers_mut().insert("x-served-by", HeaderValue::from_static("waypost"));
///     Ok(res)
/// });
/// ```
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: Fn(Request, BoxedNext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    FromFn { f }
}

impl<F, Fut> MiddlewareLayer for FromFn<F>
where
    F: Fn(Request, BoxedNext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    fn call(&self, req: Request, next: BoxedNext) -> MiddlewareFuture {
        Box::pin((self.f)(req, next))
    }
}
