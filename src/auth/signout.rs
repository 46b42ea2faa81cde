//! Sign-out.
//!
//! Ends the session with the identity provider when there is one, then clears
//! every known session cookie variant and redirects to the sign-in page. The
//! provider calls are best effort: a failure is logged and the cookies are
//! cleared regardless.

use crate::app::AppContext;
use crate::identity::IdentityProvider;
use crate::session::{self, CookieVariants, SessionConfig};
use axum::{
    extract::State,
    http::{
        HeaderMap, HeaderValue,
        header::{CACHE_CONTROL, SET_COOKIE},
    },
    response::{IntoResponse, Redirect, Response},
};
use cookie::Cookie;

/// A single sign-out against the configured provider and cookie list
pub struct SignOut<'a> {
    identity: &'a dyn IdentityProvider,
    session: &'a SessionConfig,
    variants: &'a CookieVariants,
}

/// Result of a sign-out: where to send the browser and what to clear
#[derive(Debug)]
pub struct SignOutResponse {
    pub redirect_to: String,
    pub cleared: Vec<Cookie<'static>>,
    /// Whether the provider confirmed the session was revoked
    pub revoked: bool,
}

impl<'a> SignOut<'a> {
    pub fn new(
        identity: &'a dyn IdentityProvider,
        session: &'a SessionConfig,
        variants: &'a CookieVariants,
    ) -> Self {
        Self {
            identity,
            session,
            variants,
        }
    }

    /// Sign out the session carried by the request's cookies, if any
    pub async fn run(&self, headers: &HeaderMap) -> SignOutResponse {
        let revoked = match session::access_token(headers, &self.session.session_cookie) {
            Some(token) => self.end_session(&token).await,
            None => {
                tracing::debug!("Sign-out without a session cookie");
                false
            }
        };

        let cleared = self.variants.clearing_cookies(self.session.cookie_secure);

        tracing::info!(
            revoked,
            cleared_cookies = cleared.len(),
            "Signed out"
        );

        SignOutResponse {
            redirect_to: self.session.signout_redirect.clone(),
            cleared,
            revoked,
        }
    }

    async fn end_session(&self, access_token: &str) -> bool {
        let identity = match self.identity.current_identity(access_token).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                tracing::debug!("Session cookie did not resolve to an identity");
                return false;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Identity lookup failed during sign-out");
                return false;
            }
        };

        match self.identity.revoke(access_token).await {
            Ok(()) => {
                tracing::info!(user_id = %identity.id, "Session revoked");
                true
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %identity.id,
                    error = %e,
                    "Session revoke failed; clearing cookies anyway"
                );
                false
            }
        }
    }
}

impl IntoResponse for SignOutResponse {
    fn into_response(self) -> Response {
        let mut response = Redirect::to(&self.redirect_to).into_response();
        let headers = response.headers_mut();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

        for cookie in &self.cleared {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                }
                Err(e) => {
                    tracing::warn!(cookie = cookie.name(), error = %e, "Skipping unencodable cookie");
                }
            }
        }

        response
    }
}

/// `POST /auth/signout`
pub async fn sign_out(State(ctx): State<AppContext>, headers: HeaderMap) -> SignOutResponse {
    SignOut::new(ctx.identity.as_ref(), &ctx.session, &ctx.cookie_variants)
        .run(&headers)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PortalError, Result};
    use crate::identity::{DisabledIdentityProvider, Identity};
    use async_trait::async_trait;
    use axum::http::{StatusCode, header::{COOKIE, LOCATION}};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct StubProvider {
        fail_revoke: bool,
        fail_lookup: bool,
        revokes: AtomicUsize,
    }

    #[async_trait]
    impl IdentityProvider for StubProvider {
        async fn current_identity(&self, access_token: &str) -> Result<Option<Identity>> {
            if self.fail_lookup {
                return Err(PortalError::service_unavailable("down"));
            }
            Ok((access_token == "valid").then(|| Identity {
                id: "user-1".to_string(),
                email: None,
            }))
        }

        async fn revoke(&self, _access_token: &str) -> Result<()> {
            self.revokes.fetch_add(1, Ordering::SeqCst);
            if self.fail_revoke {
                Err(PortalError::service_unavailable("down"))
            } else {
                Ok(())
            }
        }
    }

    fn session_config() -> SessionConfig {
        SessionConfig {
            cookie_domains: vec!["example.com".to_string()],
            chunk_count: 1,
            ..Default::default()
        }
    }

    fn with_cookie(raw: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, raw.parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn test_revokes_valid_session() {
        let provider = StubProvider::default();
        let config = session_config();
        let variants = CookieVariants::from_config(&config);

        let outcome = SignOut::new(&provider, &config, &variants)
            .run(&with_cookie("sb-auth-token=valid"))
            .await;

        assert!(outcome.revoked);
        assert_eq!(provider.revokes.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.cleared.len(), variants.len());
        assert_eq!(outcome.redirect_to, "/login");
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_revoked() {
        let provider = StubProvider::default();
        let config = session_config();
        let variants = CookieVariants::from_config(&config);

        let outcome = SignOut::new(&provider, &config, &variants)
            .run(&with_cookie("sb-auth-token=stale"))
            .await;

        assert!(!outcome.revoked);
        assert_eq!(provider.revokes.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.cleared.len(), variants.len());
    }

    #[tokio::test]
    async fn test_revoke_failure_still_clears() {
        let provider = StubProvider {
            fail_revoke: true,
            ..Default::default()
        };
        let config = session_config();
        let variants = CookieVariants::from_config(&config);

        let outcome = SignOut::new(&provider, &config, &variants)
            .run(&with_cookie("sb-auth-token=valid"))
            .await;

        assert!(!outcome.revoked);
        assert_eq!(provider.revokes.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.cleared.len(), variants.len());
    }

    #[tokio::test]
    async fn test_lookup_failure_still_clears() {
        let provider = StubProvider {
            fail_lookup: true,
            ..Default::default()
        };
        let config = session_config();
        let variants = CookieVariants::from_config(&config);

        let outcome = SignOut::new(&provider, &config, &variants)
            .run(&with_cookie("sb-auth-token=valid"))
            .await;

        assert!(!outcome.revoked);
        assert_eq!(provider.revokes.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.cleared.len(), variants.len());
    }

    #[tokio::test]
    async fn test_no_session_response() {
        let config = session_config();
        let variants = CookieVariants::from_config(&config);

        let response = SignOut::new(&DisabledIdentityProvider, &config, &variants)
            .run(&HeaderMap::new())
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/login");
        assert_eq!(response.headers().get(CACHE_CONTROL).unwrap(), "no-store");

        let set_cookies: Vec<_> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        // sb-auth-token, sb-access-token, sb-refresh-token, each with one chunk,
        // host-only and example.com, on "/"
        assert_eq!(set_cookies.len(), 12);
        assert_eq!(set_cookies.len(), variants.len());
        for (header, variant) in set_cookies.iter().zip(variants.iter()) {
            assert!(header.starts_with(&format!("{}=;", variant.name)));
            assert!(header.contains("Max-Age=0"));
        }
    }
}
