//! Coursegate - the HTTP edge of a course portal
//!
//! Coursegate sits in front of a learning portal whose sessions are owned by
//! a hosted identity provider and whose lesson videos are processed by a
//! video host. It handles the few requests that need a server:
//!
//! - **Webhooks**: HMAC-SHA256 verification of video host deliveries, with
//!   deduplication by event id
//! - **Sign-out**: revokes the provider session and clears every session
//!   cookie variant a browser might hold
//! - **Lesson videos**: tracks asset processing and lists playable videos
//! - **Feature flags**: parsed once from configuration
//! - **Health checks**: configuration-level component status
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use coursegate::{App, ConfigBuilder};
//!
//! #[tokio::main]
//! async fn main() -> coursegate::Result<()> {
//!     let config = ConfigBuilder::new().from_env().build()?;
//!     coursegate::init_tracing_with_config(&config);
//!
//!     App::new(config).serve().await
//! }
//! ```

mod app;
pub mod auth;
mod config;
mod core;
mod error;
pub mod flags;
pub mod health;
mod http;
pub mod identity;
pub mod lessons;
mod middleware;
pub mod session;
pub mod testing;
mod utils;
pub mod webhooks;

pub use app::{AppContext, AppContextBuilder};
pub use config::{Config, ConfigBuilder, LoggingConfig, ServerConfig};
pub use core::App;
pub use error::{PortalError, Result};
pub use flags::FeatureFlags;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use http::RouteModule;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing from the environment
///
/// # Environment Variables
///
/// - `RUST_LOG`: log filter (e.g. "info", "coursegate=debug")
/// - `COURSEGATE_LOG_JSON`: set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = utils::get_env_with_prefix("LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    install_subscriber(env_filter, json_logs);
}

/// Initialize tracing from a loaded configuration
///
/// `RUST_LOG` still wins over the configured level when it is set.
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    install_subscriber(env_filter, config.logging.json);
}

fn install_subscriber(env_filter: EnvFilter, json: bool) {
    // try_init: a subscriber may already be installed, e.g. by a test harness
    let result = if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Tracing subscriber already installed");
    }
}
