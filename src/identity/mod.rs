//! Identity provider integration.
//!
//! Sessions are owned by a hosted auth service; this module looks up who a
//! session belongs to and revokes it on sign-out.

mod config;
mod hosted;
mod provider;

pub use config::IdentityConfig;
pub use hosted::HostedIdentityProvider;
pub use provider::{DisabledIdentityProvider, Identity, IdentityProvider};

use std::sync::Arc;

/// Pick the provider for a configuration: hosted when a URL is set, disabled otherwise
pub fn provider_from_config(config: &IdentityConfig) -> Arc<dyn IdentityProvider> {
    match HostedIdentityProvider::from_config(config) {
        Some(provider) => {
            tracing::info!(base_url = ?config.url, "Using hosted identity provider");
            Arc::new(provider)
        }
        None => {
            tracing::warn!("No identity provider configured; sign-out will only clear cookies");
            Arc::new(DisabledIdentityProvider)
        }
    }
}
