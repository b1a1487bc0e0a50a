//! # waypost
//!
//! A request router with typed path placeholders and an onion-model
//! middleware pipeline.
//!
//! Routes are `(method, pattern)` pairs such as `GET /users/{id:int}`.
//! Literal routes win over parameterized ones, placeholders are checked
//! against their constraint (`int`, `slug`, `uuid`, `any`), a path that only
//! matches under other methods answers 405 with an `Allow` header, and named
//! routes can be turned back into URLs with `url_for`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use waypost::prelude::*;
//!
//! async fn show_user(req: Request) -> Result<String> {
//!     Ok(format!("user {}", req.param("id").unwrap_or_default()))
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), BoxError> {
//!     App::builder()
//!         .layer(RequestIdLayer::new())
//!         .layer(TracingLayer::new())
//!         .route(Route::get("/users/{id:int}", show_user).name("user.show"))
//!         .build()?
//!         .serve("127.0.0.1:8080")
//!         .await
//! }
//! ```
//!
//! ## Optional Features
//!
//! - `config` - `.env` loading and `ServerConfig` from `WAYPOST_*` variables
//! - `logging` - `LoggingLayer` request/response logging
//! - `api-key` - `ApiKeyLayer`, answering 401 without a valid key
//! - `timeout` - `TimeoutLayer`, answering 408 after a deadline
//! - `recover` - `RecoverLayer`, turning errors and panics into responses
//! - `test-utils` - `TestClient` for in-process tests
//! - `full` - everything above

// Re-export core functionality
pub use waypost_core::*;

#[cfg(feature = "config")]
pub use waypost_extras::config;
#[cfg(feature = "config")]
pub use waypost_extras::{load_dotenv, load_dotenv_from, Config, ConfigError, ServerConfig};

#[cfg(feature = "logging")]
pub use waypost_extras::logging;
#[cfg(feature = "logging")]
pub use waypost_extras::{LogFormat, LoggingConfig, LoggingLayer};

#[cfg(feature = "api-key")]
pub use waypost_extras::ApiKeyLayer;

#[cfg(feature = "timeout")]
pub use waypost_extras::TimeoutLayer;

#[cfg(feature = "recover")]
pub use waypost_extras::RecoverLayer;

/// Prelude module - import everything you need with `use waypost::prelude::*`
pub mod prelude {
    pub use waypost_core::{
        from_fn,
        init_tracing,
        init_tracing_with,
        // Error handling
        ApiError,
        // App
        App,
        AppBuilder,
        BoxError,
        // Middleware
        BoxedNext,
        Html,
        // Response types
        IntoResponse,
        Json,
        MiddlewareFuture,
        MiddlewareLayer,
        Redirect,
        // Request context
        Request,
        RequestId,
        RequestIdLayer,
        Response,
        Result,
        // Routing
        Route,
        RouteError,
        TracingLayer,
    };

    #[cfg(feature = "test-utils")]
    pub use waypost_core::{TestClient, TestRequest, TestResponse};

    // Re-export commonly used external types
    pub use serde::{Deserialize, Serialize};
    pub use tracing::{debug, error, info, trace, warn};

    #[cfg(feature = "config")]
    pub use waypost_extras::{load_dotenv, ServerConfig};

    #[cfg(feature = "logging")]
    pub use waypost_extras::{LogFormat, LoggingLayer};

    #[cfg(feature = "api-key")]
    pub use waypost_extras::ApiKeyLayer;

    #[cfg(feature = "timeout")]
    pub use waypost_extras::TimeoutLayer;

    #[cfg(feature = "recover")]
    pub use waypost_extras::RecoverLayer;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn prelude_imports_work() {
        let _: fn() -> Result<()> = || Ok(());
        let _ = Route::get("/", |_req: Request| async { Ok::<_, ApiError>("ok") });
    }
}
