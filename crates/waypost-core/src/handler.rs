//! Handler trait and utilities
//!
//! A handler is any async function or closure taking the matched [`Request`]
//! and returning `Result<R, ApiError>` where `R: IntoResponse`:
//!
//! ```rust,ignore
//! async fn show_user(req: Request) -> Result<String> {
//!     let id = req.param("id").unwrap_or_default();
//!     Ok(format!("user {id}"))
//! }
//! ```

use crate::error::Result;
use crate::middleware::{BoxedNext, MiddlewareFuture};
use crate::request::Request;
use crate::response::IntoResponse;
use std::future::Future;
use std::sync::Arc;

/// Trait representing an async request handler.
///
/// `T` is the handler's response type; it only exists to keep the blanket
/// implementation coherent.
pub trait Handler<T>: Send + Sync + Sized + 'static {
    /// Call the handler with the request
    fn call(&self, req: Request) -> MiddlewareFuture;
}

impl<F, Fut, R> Handler<R> for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, req: Request) -> MiddlewareFuture {
        let fut = self(req);
        Box::pin(async move { fut.await.map(IntoResponse::into_response) })
    }
}

/// Erase a handler's type so it can sit at the end of a middleware chain.
pub(crate) fn into_boxed_handler<H, T>(handler: H) -> BoxedNext
where
    H: Handler<T>,
    T: 'static,
{
    Arc::new(move |req: Request| handler.call(req))
}
