use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::utils::get_env_with_prefix;

/// Identity provider connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IdentityConfig {
    /// Base URL of the hosted auth service, e.g. `https://abc.supabase.co`
    ///
    /// When unset, sign-out only clears cookies.
    #[serde(default)]
    pub url: Option<String>,

    /// Public (anon) API key sent as the `apikey` header
    #[serde(default, skip_serializing)]
    pub anon_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl IdentityConfig {
    /// Load identity provider configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(url) = get_env_with_prefix("IDENTITY_URL") {
            config.url = Some(url);
        }

        if let Some(key) = get_env_with_prefix("IDENTITY_ANON_KEY") {
            config.anon_key = Some(key);
        }

        if let Some(timeout) = get_env_with_prefix("IDENTITY_TIMEOUT_SECONDS") {
            if let Ok(seconds) = timeout.parse() {
                config.timeout_seconds = seconds;
            }
        }

        config
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn is_configured(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

fn default_timeout_seconds() -> u64 {
    5
}
