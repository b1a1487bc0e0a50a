//! Middleware infrastructure for waypost
//!
//! Middleware are added with `AppBuilder::layer` and wrap every route's
//! handler, the first one added being the outermost.
//!
//! # Example
//!
//! ```rust,ignore
//! use waypost::prelude::*;
//!
//! App::builder()
//!     .layer(RequestIdLayer::new())
//!     .layer(TracingLayer::new())
//!     .route(Route::get("/", index))
//!     .build()?
//! ```

mod layer;
mod request_id;
mod tracing_layer;

pub use layer::{from_fn, BoxedNext, FromFn, MiddlewareFuture, MiddlewareLayer, Pipeline};
pub use request_id::{RequestId, RequestIdLayer, REQUEST_ID_HEADER};
pub use tracing_layer::TracingLayer;
