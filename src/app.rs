use std::sync::Arc;

use crate::config::Config;
use crate::flags::FeatureFlags;
use crate::identity::{DisabledIdentityProvider, IdentityProvider, provider_from_config};
use crate::lessons::VideoCatalog;
use crate::session::{CookieVariants, SessionConfig};
use crate::webhooks::{
    HmacSha256Verifier, IdempotencyStore, MemoryIdempotencyStore, WebhookConfig, WebhookVerifier,
};

/// Application context shared by all handlers
///
/// Cheap to clone; every dependency sits behind an `Arc`.
#[derive(Clone)]
pub struct AppContext {
    pub identity: Arc<dyn IdentityProvider>,
    pub webhook_verifier: Arc<dyn WebhookVerifier>,
    /// Lowercase name of the request header carrying webhook signatures
    pub signature_header: Arc<str>,
    pub idempotency: Arc<dyn IdempotencyStore>,
    pub session: Arc<SessionConfig>,
    pub cookie_variants: Arc<CookieVariants>,
    pub flags: Arc<FeatureFlags>,
    pub videos: Arc<VideoCatalog>,
}

impl AppContext {
    /// Build the context for a validated configuration
    pub fn from_config(config: &Config) -> Self {
        Self::builder()
            .with_webhook_config(&config.webhook)
            .with_identity_provider(provider_from_config(&config.identity))
            .with_session_config(config.session.clone())
            .with_flags(config.flags.clone())
            .build()
    }

    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::new()
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for AppContext
///
/// Unset dependencies default to: no identity provider, a verifier with no
/// secret (rejects everything), default session cookies, no flags, and an
/// empty video catalog.
#[must_use = "builder does nothing until you call build()"]
pub struct AppContextBuilder {
    identity: Arc<dyn IdentityProvider>,
    webhook_verifier: Arc<dyn WebhookVerifier>,
    signature_header: String,
    idempotency: Arc<dyn IdempotencyStore>,
    session: SessionConfig,
    flags: FeatureFlags,
    videos: Arc<VideoCatalog>,
}

impl AppContextBuilder {
    pub fn new() -> Self {
        let webhook = WebhookConfig::default();
        Self {
            identity: Arc::new(DisabledIdentityProvider),
            webhook_verifier: Arc::new(HmacSha256Verifier::new("")),
            signature_header: webhook.signature_header,
            idempotency: Arc::new(MemoryIdempotencyStore::new(webhook.idempotency_capacity)),
            session: SessionConfig::default(),
            flags: FeatureFlags::default(),
            videos: Arc::new(VideoCatalog::new()),
        }
    }

    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity = provider;
        self
    }

    pub fn with_webhook_verifier(mut self, verifier: Arc<dyn WebhookVerifier>) -> Self {
        self.webhook_verifier = verifier;
        self
    }

    /// Verifier, signature header, and dedup store from webhook configuration
    pub fn with_webhook_config(mut self, config: &WebhookConfig) -> Self {
        self.webhook_verifier = Arc::new(HmacSha256Verifier::new(
            config.secret.clone().unwrap_or_default(),
        ));
        self.signature_header = config.signature_header.clone();
        self.idempotency = Arc::new(MemoryIdempotencyStore::new(config.idempotency_capacity));
        self
    }

    pub fn with_signature_header(mut self, header: impl Into<String>) -> Self {
        self.signature_header = header.into();
        self
    }

    pub fn with_idempotency_store(mut self, store: Arc<dyn IdempotencyStore>) -> Self {
        self.idempotency = store;
        self
    }

    pub fn with_session_config(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    pub fn with_flags(mut self, flags: FeatureFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_video_catalog(mut self, videos: Arc<VideoCatalog>) -> Self {
        self.videos = videos;
        self
    }

    pub fn build(self) -> AppContext {
        let cookie_variants = CookieVariants::from_config(&self.session);
        tracing::debug!(
            variants = cookie_variants.len(),
            "Session cookie variants configured"
        );

        AppContext {
            identity: self.identity,
            webhook_verifier: self.webhook_verifier,
            signature_header: Arc::from(self.signature_header.to_ascii_lowercase()),
            idempotency: self.idempotency,
            session: Arc::new(self.session),
            cookie_variants: Arc::new(cookie_variants),
            flags: Arc::new(self.flags),
            videos: self.videos,
        }
    }
}

impl Default for AppContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
