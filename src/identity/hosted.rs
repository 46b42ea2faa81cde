//! Client for the hosted auth service's REST API.
//!
//! Uses two endpoints:
//! - `GET {base}/auth/v1/user` resolves an access token to a user
//! - `POST {base}/auth/v1/logout` revokes the session behind a token
//!
//! Both take the project key in an `apikey` header and the user's token as a
//! bearer credential.

use crate::error::{PortalError, Result};
use crate::identity::{Identity, IdentityConfig, IdentityProvider};
use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

const USER_PATH: &str = "/auth/v1/user";
const LOGOUT_PATH: &str = "/auth/v1/logout";

/// Identity provider backed by the hosted auth REST API
#[derive(Clone)]
pub struct HostedIdentityProvider {
    base_url: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl HostedIdentityProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: SecretString::from(api_key.into()),
            client: Self::build_client(timeout),
        }
    }

    /// Build from configuration, or `None` when no URL is configured
    pub fn from_config(config: &IdentityConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }
        let url = config.url.clone()?;
        Some(Self::new(
            url,
            config.anon_key.clone().unwrap_or_default(),
            config.timeout(),
        ))
    }

    fn build_client(timeout: Duration) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("coursegate/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder, access_token: &str) -> reqwest::RequestBuilder {
        request
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(access_token)
    }
}

impl std::fmt::Debug for HostedIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedIdentityProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IdentityProvider for HostedIdentityProvider {
    async fn current_identity(&self, access_token: &str) -> Result<Option<Identity>> {
        let response = self
            .authorized(self.client.get(self.url(USER_PATH)), access_token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(Some(response.json::<Identity>().await?)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => Err(PortalError::service_unavailable(format!(
                "identity provider returned {} for user lookup",
                status
            ))),
        }
    }

    async fn revoke(&self, access_token: &str) -> Result<()> {
        let response = self
            .authorized(self.client.post(self.url(LOGOUT_PATH)), access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(PortalError::service_unavailable(format!(
                "identity provider returned {} for logout",
                status
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::{get, post},
    };
    use serde_json::json;

    async fn user(headers: HeaderMap) -> std::result::Result<Json<serde_json::Value>, AxumStatus> {
        let api_key_ok = headers.get("apikey").and_then(|v| v.to_str().ok()) == Some("anon");
        let auth = headers.get("authorization").and_then(|v| v.to_str().ok());
        match auth {
            Some("Bearer good") if api_key_ok => {
                Ok(Json(json!({"id": "user-1", "email": "learner@example.com"})))
            }
            Some("Bearer broken") => Err(AxumStatus::INTERNAL_SERVER_ERROR),
            _ => Err(AxumStatus::UNAUTHORIZED),
        }
    }

    async fn logout(headers: HeaderMap) -> AxumStatus {
        match headers.get("authorization").and_then(|v| v.to_str().ok()) {
            Some("Bearer good") => AxumStatus::NO_CONTENT,
            _ => AxumStatus::UNAUTHORIZED,
        }
    }

    async fn spawn_stub() -> String {
        let app = Router::new()
            .route(USER_PATH, get(user))
            .route(LOGOUT_PATH, post(logout));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    fn provider(base: &str) -> HostedIdentityProvider {
        HostedIdentityProvider::new(base, "anon", Duration::from_secs(2))
    }

    #[test]
    fn test_from_config_requires_url() {
        assert!(HostedIdentityProvider::from_config(&IdentityConfig::default()).is_none());

        let config = IdentityConfig {
            url: Some("https://auth.example.com/".to_string()),
            anon_key: Some("anon".to_string()),
            ..Default::default()
        };
        let provider = HostedIdentityProvider::from_config(&config).unwrap();
        assert_eq!(provider.url(USER_PATH), "https://auth.example.com/auth/v1/user");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let provider = HostedIdentityProvider::new("https://auth.example.com", "very-secret-key", Duration::from_secs(1));
        assert!(!format!("{:?}", provider).contains("very-secret-key"));
    }

    #[tokio::test]
    async fn test_current_identity() {
        let base = spawn_stub().await;
        let identity = provider(&base).current_identity("good").await.unwrap().unwrap();
        assert_eq!(identity.id, "user-1");
        assert_eq!(identity.email.as_deref(), Some("learner@example.com"));
    }

    #[tokio::test]
    async fn test_invalid_token_has_no_identity() {
        let base = spawn_stub().await;
        assert!(provider(&base).current_identity("expired").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upstream_failure_is_error() {
        let base = spawn_stub().await;
        let err = provider(&base).current_identity("broken").await.unwrap_err();
        assert!(matches!(err, PortalError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_revoke() {
        let base = spawn_stub().await;
        assert!(provider(&base).revoke("good").await.is_ok());
        assert!(provider(&base).revoke("expired").await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = provider(&format!("http://{}", addr)).revoke("good").await;
        assert!(result.is_err());
    }
}
