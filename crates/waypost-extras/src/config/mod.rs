//! Configuration management with environment variable support.
//!
//! Loads `.env` files with `dotenvy` and deserializes typed configuration from
//! environment variables with `envy`.
//!
//! # Example
//!
//! ```ignore
//! use waypost_extras::config::{load_dotenv, ServerConfig};
//!
//! load_dotenv();
//! let config = ServerConfig::from_env()?;
//! App::builder()
//!     .layer(TimeoutLayer::new(config.request_timeout()))
//!     .route(Route::get("/", index))
//!     .build()?
//!     .serve(&config.addr())
//!     .await
//! ```

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

pub use waypost_core::Environment;

/// Prefix of every variable read by [`ServerConfig`]
pub const ENV_PREFIX: &str = "WAYPOST_";

/// Error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable deserialization failed.
    #[error("Configuration error: {0}")]
    Envy(#[from] envy::Error),
    /// A loaded value is out of range.
    #[error("Invalid value for {name}: {reason}")]
    Invalid {
        /// Variable name
        name: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Server settings read from `WAYPOST_*` variables.
///
/// | variable | default |
/// |----------|---------|
/// | `WAYPOST_HOST` | `127.0.0.1` |
/// | `WAYPOST_PORT` | `8080` |
/// | `WAYPOST_REQUEST_TIMEOUT_MS` | `30000` |
/// | `WAYPOST_LOG_FILTER` | unset (falls back to `RUST_LOG`) |
/// | `WAYPOST_ENV` | `development` |
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,
    /// Deadline for a single request, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
    /// `tracing_subscriber::EnvFilter` directives
    #[serde(default)]
    pub log_filter: Option<String>,
    /// Deployment environment name
    #[serde(default = "default_env")]
    pub env: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_env() -> String {
    "development".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_ms: default_timeout_ms(),
            log_filter: None,
            env: default_env(),
        }
    }
}

impl ServerConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or the timeout is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: Self = envy::prefixed(ENV_PREFIX).from_env()?;
        if config.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                name: format!("{}REQUEST_TIMEOUT_MS", ENV_PREFIX),
                reason: "must be greater than zero".to_string(),
            });
        }
        tracing::debug!(
            host = %config.host,
            port = config.port,
            request_timeout_ms = config.request_timeout_ms,
            env = %config.env,
            "Loaded server configuration"
        );
        Ok(config)
    }

    /// `host:port`, ready for `App::serve`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Request deadline as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// The deployment environment
    pub fn environment(&self) -> Environment {
        Environment::from_name(&self.env)
    }
}

/// Typed configuration deserialized from environment variables.
///
/// Field names are matched against variable names in SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone)]
pub struct Config<T>(pub T);

impl<T: DeserializeOwned> Config<T> {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        envy::from_env::<T>().map(Config).map_err(ConfigError::from)
    }

    /// Load configuration from variables starting with `prefix` and an
    /// underscore, e.g. `DB` reads `DB_URL` into `url`.
    pub fn from_env_prefixed(prefix: &str) -> Result<Self, ConfigError> {
        envy::prefixed(format!("{}_", prefix))
            .from_env::<T>()
            .map(Config)
            .map_err(ConfigError::from)
    }

    /// Get the inner configuration value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Config<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Load environment variables from a `.env` file in the current directory.
///
/// Existing variables take precedence; a missing file is not an error.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Load environment variables from a specific file path.
pub fn load_dotenv_from<P: AsRef<std::path::Path>>(path: P) {
    let _ = dotenvy::from_path(path);
}
