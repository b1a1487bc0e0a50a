//! # waypost-extras
//!
//! Optional middleware and configuration for waypost, each behind a Cargo
//! feature.
//!
//! ## Features
//!
//! - `config` - `.env` loading and typed configuration from `WAYPOST_*` variables
//! - `logging` - Request/response logging middleware
//! - `api-key` - API key check that short-circuits with 401
//! - `timeout` - Deadline for the rest of the chain, answering 408
//! - `recover` - Turns errors and handler panics into error responses
//! - `full` - All of the above (also the default set)
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! waypost-extras = { version = "0.1", default-features = false, features = ["timeout"] }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// Configuration management module
#[cfg(feature = "config")]
pub mod config;

// Request timeout middleware
#[cfg(feature = "timeout")]
pub mod timeout;

// Request/Response logging middleware
#[cfg(feature = "logging")]
pub mod logging;

// API Key authentication
#[cfg(feature = "api-key")]
pub mod api_key;

// Error and panic recovery
#[cfg(feature = "recover")]
pub mod recover;

// Re-exports for convenience
#[cfg(feature = "config")]
pub use config::{load_dotenv, load_dotenv_from, Config, ConfigError, ServerConfig};

#[cfg(feature = "timeout")]
pub use timeout::TimeoutLayer;

#[cfg(feature = "logging")]
pub use logging::{LogFormat, LoggingConfig, LoggingLayer};

#[cfg(feature = "api-key")]
pub use api_key::ApiKeyLayer;

#[cfg(feature = "recover")]
pub use recover::RecoverLayer;
