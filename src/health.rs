use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::app::AppContext;

/// Health check status
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health check result for a single component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    fn new(name: &str, status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: Some(message.into()),
        }
    }
}

/// Overall health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: Vec<ComponentHealth>,
}

impl HealthResponse {
    /// Combine component results; the worst status wins
    pub fn from_checks(checks: Vec<ComponentHealth>) -> Self {
        let mut status = HealthStatus::Healthy;
        for check in &checks {
            match check.status {
                HealthStatus::Unhealthy => status = HealthStatus::Unhealthy,
                HealthStatus::Degraded if status == HealthStatus::Healthy => {
                    status = HealthStatus::Degraded
                }
                _ => {}
            }
        }
        Self { status, checks }
    }
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        let status_code = match self.status {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        };

        (status_code, Json(self)).into_response()
    }
}

/// Configuration-level checks: nothing here makes network calls
pub fn check_context(ctx: &AppContext) -> HealthResponse {
    let application = ComponentHealth::new(
        "application",
        HealthStatus::Healthy,
        "Application is running",
    );

    let identity = if ctx.identity.is_configured() {
        ComponentHealth::new("identity", HealthStatus::Healthy, "Identity provider configured")
    } else {
        ComponentHealth::new(
            "identity",
            HealthStatus::Degraded,
            "Identity provider not configured; sign-out only clears cookies",
        )
    };

    let webhooks = if ctx.webhook_verifier.is_configured() {
        ComponentHealth::new("webhooks", HealthStatus::Healthy, "Webhook secret configured")
    } else {
        ComponentHealth::new(
            "webhooks",
            HealthStatus::Degraded,
            "Webhook secret not configured; all webhooks are rejected",
        )
    };

    HealthResponse::from_checks(vec![application, identity, webhooks])
}

/// Handler for the health endpoint
pub async fn health_handler(State(ctx): State<AppContext>) -> HealthResponse {
    check_context(&ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhooks::HmacSha256Verifier;
    use std::sync::Arc;

    #[test]
    fn test_worst_status_wins() {
        let response = HealthResponse::from_checks(vec![
            ComponentHealth::new("a", HealthStatus::Healthy, "ok"),
            ComponentHealth::new("b", HealthStatus::Degraded, "meh"),
        ]);
        assert_eq!(response.status, HealthStatus::Degraded);

        let response = HealthResponse::from_checks(vec![
            ComponentHealth::new("a", HealthStatus::Unhealthy, "down"),
            ComponentHealth::new("b", HealthStatus::Degraded, "meh"),
        ]);
        assert_eq!(response.status, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_unconfigured_context_is_degraded() {
        let response = check_context(&AppContext::default());
        assert_eq!(response.status, HealthStatus::Degraded);
        assert_eq!(response.checks.len(), 3);
        assert_eq!(response.into_response().status(), StatusCode::OK);
    }

    #[test]
    fn test_webhook_secret_reported() {
        let ctx = AppContext::builder()
            .with_webhook_verifier(Arc::new(HmacSha256Verifier::new("s3cr3t")))
            .build();
        let response = check_context(&ctx);
        let webhooks = response.checks.iter().find(|c| c.name == "webhooks").unwrap();
        assert_eq!(webhooks.status, HealthStatus::Healthy);
    }
}
