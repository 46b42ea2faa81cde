use serde::{Deserialize, Serialize};
use crate::utils::get_env_with_prefix;

/// Webhook endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookConfig {
    /// Shared secret for HMAC-SHA256 signatures
    ///
    /// When unset every inbound webhook is rejected.
    #[serde(default, skip_serializing)]
    pub secret: Option<String>,

    /// Request header carrying `sha256=<hex-digest>`
    #[serde(default = "default_signature_header")]
    pub signature_header: String,

    /// Maximum number of delivered event ids remembered for deduplication
    #[serde(default = "default_idempotency_capacity")]
    pub idempotency_capacity: usize,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: None,
            signature_header: default_signature_header(),
            idempotency_capacity: default_idempotency_capacity(),
        }
    }
}

impl WebhookConfig {
    /// Load webhook configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secret) = get_env_with_prefix("WEBHOOK_SECRET") {
            config.secret = Some(secret);
        }

        if let Some(header) = get_env_with_prefix("WEBHOOK_SIGNATURE_HEADER") {
            config.signature_header = header.to_ascii_lowercase();
        }

        if let Some(capacity) = get_env_with_prefix("WEBHOOK_IDEMPOTENCY_CAPACITY") {
            if let Ok(capacity) = capacity.parse() {
                config.idempotency_capacity = capacity;
            }
        }

        config
    }

    pub fn has_secret(&self) -> bool {
        self.secret.as_deref().is_some_and(|s| !s.is_empty())
    }
}

fn default_signature_header() -> String {
    "x-signature".to_string()
}

fn default_idempotency_capacity() -> usize {
    10_000
}
