use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::error::PortalError;
use crate::flags::FeatureFlags;
use crate::identity::IdentityConfig;
use crate::session::{CookieVariants, SessionConfig, is_cookie_name};
use axum::http::HeaderValue;
use crate::utils::{get_env_with_prefix, parse_bool};
use crate::webhooks::WebhookConfig;

/// Main configuration for a coursegate server
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub flags: FeatureFlags,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size in bytes (default: 1MB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.config.server.max_body_size = max_body_size;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.webhook.secret = Some(secret.into());
        self
    }

    pub fn with_webhook(mut self, webhook: WebhookConfig) -> Self {
        self.config.webhook = webhook;
        self
    }

    pub fn with_identity(mut self, identity: IdentityConfig) -> Self {
        self.config.identity = identity;
        self
    }

    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.config.session = session;
        self
    }

    pub fn with_flags(mut self, flags: FeatureFlags) -> Self {
        self.config.flags = flags;
        self
    }

    /// Load configuration from environment variables with the `COURSEGATE_` prefix
    pub fn from_env(mut self) -> Self {
        if let Some(host) = get_env_with_prefix("HOST") {
            self.config.server.host = host;
        }
        // COURSEGATE_PORT first, then PORT as set by most hosting platforms
        if let Some(port) = get_env_with_prefix("PORT") {
            if let Ok(p) = port.parse() {
                self.config.server.port = p;
            }
        }
        if let Some(max_body_size) = get_env_with_prefix("MAX_BODY_SIZE") {
            if let Ok(size) = max_body_size.parse() {
                self.config.server.max_body_size = size;
            }
        }
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            self.config.logging.json = parse_bool("LOG_JSON", &json, false);
        }

        self.config.webhook = WebhookConfig::from_env();
        self.config.identity = IdentityConfig::from_env();
        self.config.session = SessionConfig::from_env();

        if let Some(flags) = get_env_with_prefix("FEATURE_FLAGS") {
            self.config.flags = FeatureFlags::parse(&flags);
        }

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the server address (host:port) does not parse, or the port is 0
    /// - the log level is not one of trace/debug/info/warn/error
    /// - the maximum body size is 0
    /// - the sign-out redirect is not a relative path or http(s) URL, or is not
    ///   a valid header value
    /// - no session cookie name or path is configured, or a cookie variant
    ///   cannot be written as a `Set-Cookie` header
    /// - the identity provider URL is not http(s)
    pub fn build(self) -> crate::error::Result<Config> {
        let config = self.config;

        config.server.addr().map_err(|e| {
            PortalError::bad_request(format!(
                "Invalid server address {}:{} - {}",
                config.server.host, config.server.port, e
            ))
        })?;

        if config.server.port == 0 {
            return Err(PortalError::bad_request("Server port must be greater than 0"));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(PortalError::bad_request(format!(
                "Invalid log level: {}. Must be one of: {}",
                config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        if config.server.max_body_size == 0 {
            return Err(PortalError::bad_request(
                "Maximum body size must be greater than 0",
            ));
        }

        let redirect = config.session.signout_redirect.as_str();
        let redirect_ok = (redirect.starts_with('/') && !redirect.starts_with("//"))
            || redirect.starts_with("https://")
            || redirect.starts_with("http://");
        if !redirect_ok || HeaderValue::from_str(redirect).is_err() {
            return Err(PortalError::bad_request(format!(
                "Sign-out redirect must be a path or http(s) URL usable as a Location header, got: {:?}",
                redirect
            )));
        }

        if config.session.session_cookie.trim().is_empty() {
            return Err(PortalError::bad_request("Session cookie name must not be empty"));
        }

        if config.session.cookie_paths.is_empty() {
            return Err(PortalError::bad_request(
                "At least one session cookie path is required",
            ));
        }

        // Every clearing cookie must be sendable, or sign-out would leave it behind
        for variant in CookieVariants::from_config(&config.session).iter() {
            if !is_cookie_name(&variant.name) {
                return Err(PortalError::bad_request(format!(
                    "Invalid session cookie name: {:?}",
                    variant.name
                )));
            }
            let attributes_ok = !variant.path.contains(';')
                && !variant.domain.as_deref().is_some_and(|d| d.contains(';'));
            let header = variant.clearing_cookie(config.session.cookie_secure).to_string();
            if !attributes_ok || HeaderValue::from_str(&header).is_err() {
                return Err(PortalError::bad_request(format!(
                    "Session cookie variant cannot be sent as Set-Cookie: {:?}",
                    variant
                )));
            }
        }

        if let Some(url) = config.identity.url.as_deref() {
            if !url.trim().is_empty() && !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(PortalError::bad_request(format!(
                    "Identity provider URL must be http(s), got: {}",
                    url
                )));
            }
        }

        if !config.webhook.has_secret() {
            tracing::warn!("No webhook secret configured; all webhooks will be rejected");
        }

        Ok(config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
