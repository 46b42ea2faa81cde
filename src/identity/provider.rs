use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An authenticated user as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// The hosted auth service that owns sessions
///
/// Implementations make at most one request per call and never retry.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve an access token to the identity it belongs to
    ///
    /// Returns `Ok(None)` when the token is not (or no longer) valid.
    async fn current_identity(&self, access_token: &str) -> Result<Option<Identity>>;

    /// End the session the access token belongs to
    async fn revoke(&self, access_token: &str) -> Result<()>;

    /// Whether this provider talks to a real backend
    fn is_configured(&self) -> bool {
        true
    }
}

/// Provider used when no identity backend is configured
///
/// Reports no identity for any token, so sign-out only clears cookies.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledIdentityProvider;

#[async_trait]
impl IdentityProvider for DisabledIdentityProvider {
    async fn current_identity(&self, _access_token: &str) -> Result<Option<Identity>> {
        tracing::debug!("Identity provider not configured, treating request as anonymous");
        Ok(None)
    }

    async fn revoke(&self, _access_token: &str) -> Result<()> {
        tracing::debug!("Identity provider not configured, nothing to revoke");
        Ok(())
    }

    fn is_configured(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_provider() {
        let provider = DisabledIdentityProvider;
        assert!(provider.current_identity("token").await.unwrap().is_none());
        assert!(provider.revoke("token").await.is_ok());
        assert!(!provider.is_configured());
    }

    #[test]
    fn test_identity_deserializes_without_email() {
        let identity: Identity = serde_json::from_str(r#"{"id":"u1","role":"authenticated"}"#).unwrap();
        assert_eq!(identity.id, "u1");
        assert!(identity.email.is_none());
    }
}
