//! Panic and error recovery middleware
//!
//! Turns a panic anywhere inside the layer into a 500 response, and renders
//! errors returned by inner layers into responses so that outer layers only
//! ever see `Ok`.

use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use waypost_core::{
    middleware::{BoxedNext, MiddlewareFuture, MiddlewareLayer},
    ApiError, IntoResponse, Request,
};

/// Recovers from panics and renders errors
#[derive(Clone, Debug)]
pub struct RecoverLayer {
    render_errors: bool,
}

impl Default for RecoverLayer {
    fn default() -> Self {
        Self {
            render_errors: true,
        }
    }
}

impl RecoverLayer {
    /// Catch panics and render errors
    pub fn new() -> Self {
        Self::default()
    }

    /// Catch panics only; errors keep propagating outward
    pub fn panics_only() -> Self {
        Self {
            render_errors: false,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn panic_error(path: &str, payload: &(dyn Any + Send)) -> ApiError {
    let message = panic_message(payload);
    tracing::error!(path = %path, panic = %message, "Request handler panicked");
    ApiError::internal("Internal server error").with_internal(message)
}

impl MiddlewareLayer for RecoverLayer {
    fn call(&self, req: Request, next: BoxedNext) -> MiddlewareFuture {
        let render_errors = self.render_errors;
        let path = req.path().to_string();

        // Inner layers may panic before returning their future.
        let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| next(req))) {
            Ok(fut) => fut,
            Err(payload) => {
                let response = panic_error(&path, payload.as_ref()).into_response();
                return Box::pin(async move { Ok(response) });
            }
        };

        Box::pin(async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(err)) if render_errors => Ok(err.into_response()),
                Ok(Err(err)) => Err(err),
                Err(payload) => Ok(panic_error(&path, payload.as_ref()).into_response()),
            }
        })
    }
}
