//! # waypost core
//!
//! Core library of waypost: a route table with typed path placeholders and an
//! onion-model middleware pipeline around the matched handler.
//!
//! This crate is not meant to be used directly. Use `waypost` instead.

mod app;
pub mod constraint;
mod error;
mod handler;
pub mod middleware;
mod path_params;
pub mod path_validation;
mod pattern;
mod request;
mod response;
mod router;
mod server;
#[cfg(any(test, feature = "test-utils"))]
mod test_client;

// Public API
pub use app::{init_tracing, init_tracing_with, App, AppBuilder, DEFAULT_LOG_FILTER};
pub use constraint::Constraint;
pub use error::{get_environment, ApiError, Environment, Result, RouteError};
pub use handler::Handler;
pub use middleware::{
    from_fn, BoxedNext, MiddlewareFuture, MiddlewareLayer, Pipeline, RequestId, RequestIdLayer,
    TracingLayer,
};
pub use path_params::PathParams;
pub use pattern::CompiledPattern;
pub use request::Request;
pub use response::{Html, IntoResponse, Json, Redirect, Response};
pub use router::{RegisteredRoute, Route, RouteMatch, Router, SUPPORTED_METHODS};
pub use server::{BoxError, Server};
#[cfg(any(test, feature = "test-utils"))]
pub use test_client::{TestClient, TestRequest, TestResponse};
