use crate::error::{PortalError, Result};
use crate::webhooks::{IdempotencyStore, WebhookVerifier};
use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Trait representing a webhook event
pub trait WebhookEvent: DeserializeOwned + Send + Sync {
    /// Unique event ID used for deduplication
    fn event_id(&self) -> &str;

    /// Event type, e.g. `video.asset.ready`
    fn event_type(&self) -> &str;
}

/// What happened to a delivered webhook event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookOutcome {
    /// The event changed application state
    Processed,
    /// The event id was already delivered
    Duplicate,
    /// The event type is not one this handler acts on
    Ignored,
}

/// Trait for handling webhook events
#[async_trait]
pub trait WebhookHandler<E: WebhookEvent>: Send + Sync {
    /// Apply the event, reporting whether it was acted on
    async fn handle(&self, event: &E) -> Result<WebhookOutcome>;

    /// Called when [`handle`](WebhookHandler::handle) fails
    async fn on_error(&self, event: &E, error: &PortalError) {
        tracing::error!(
            event_id = event.event_id(),
            event_type = event.event_type(),
            error = %error,
            "Webhook processing failed"
        );
    }
}

/// Dispatches verified events to a handler exactly once per event id
pub struct WebhookRouter<'a> {
    idempotency: &'a dyn IdempotencyStore,
}

impl<'a> WebhookRouter<'a> {
    pub fn new(idempotency: &'a dyn IdempotencyStore) -> Self {
        Self { idempotency }
    }

    /// Process an event with the given handler
    ///
    /// A failed event is forgotten again so the provider's retry is handled.
    pub async fn process<E, H>(&self, event: &E, handler: &H) -> Result<WebhookOutcome>
    where
        E: WebhookEvent,
        H: WebhookHandler<E> + ?Sized,
    {
        if !self.idempotency.first_delivery(event.event_id()).await? {
            tracing::debug!(
                event_id = event.event_id(),
                "Skipping already delivered webhook event"
            );
            return Ok(WebhookOutcome::Duplicate);
        }

        match handler.handle(event).await {
            Ok(outcome) => {
                tracing::info!(
                    event_id = event.event_id(),
                    event_type = event.event_type(),
                    outcome = ?outcome,
                    "Webhook handled"
                );
                Ok(outcome)
            }
            Err(e) => {
                self.idempotency.forget(event.event_id()).await?;
                handler.on_error(event, &e).await;
                Err(e)
            }
        }
    }
}

/// Check an inbound request's signature header against its raw body
///
/// Returns `Unauthorized` without detail; the verifier logs the reason.
pub fn verify_request(
    verifier: &dyn WebhookVerifier,
    signature_header: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<()> {
    let signature = headers
        .get(signature_header)
        .and_then(|value| value.to_str().ok());

    if verifier.verify(body, signature) {
        Ok(())
    } else {
        Err(PortalError::unauthorized("invalid webhook signature"))
    }
}

/// Verify then deserialize a webhook body
pub fn verified_event<E: WebhookEvent>(
    verifier: &dyn WebhookVerifier,
    signature_header: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<E> {
    verify_request(verifier, signature_header, headers, body)?;
    serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(
            target: "coursegate::webhooks",
            error = %e,
            "Failed to parse verified webhook payload"
        );
        PortalError::bad_request("malformed webhook payload")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhooks::{HmacSha256Verifier, MemoryIdempotencyStore};
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Deserialize)]
    struct PingEvent {
        id: String,
        #[serde(rename = "type")]
        kind: String,
    }

    impl WebhookEvent for PingEvent {
        fn event_id(&self) -> &str {
            &self.id
        }

        fn event_type(&self) -> &str {
            &self.kind
        }
    }

    #[derive(Default)]
    struct CountingHandler {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl WebhookHandler<PingEvent> for CountingHandler {
        async fn handle(&self, _event: &PingEvent) -> Result<WebhookOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(PortalError::internal("boom"))
            } else {
                Ok(WebhookOutcome::Processed)
            }
        }
    }

    fn ping(id: &str) -> PingEvent {
        PingEvent {
            id: id.to_string(),
            kind: "ping".to_string(),
        }
    }

    #[tokio::test]
    async fn test_router_deduplicates() {
        let store = MemoryIdempotencyStore::default();
        let router = WebhookRouter::new(&store);
        let handler = CountingHandler::default();

        let first = router.process(&ping("evt_1"), &handler).await.unwrap();
        let second = router.process(&ping("evt_1"), &handler).await.unwrap();

        assert_eq!(first, WebhookOutcome::Processed);
        assert_eq!(second, WebhookOutcome::Duplicate);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_router_forgets_failed_events() {
        let store = MemoryIdempotencyStore::default();
        let router = WebhookRouter::new(&store);
        let handler = CountingHandler {
            fail: true,
            ..Default::default()
        };

        assert!(router.process(&ping("evt_1"), &handler).await.is_err());
        assert!(!store.is_processed("evt_1").await.unwrap());
        assert!(router.process(&ping("evt_1"), &handler).await.is_err());
        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_verified_event() {
        let verifier = HmacSha256Verifier::new("secret");
        let body = br#"{"id":"evt_1","type":"ping"}"#;

        let mut headers = HeaderMap::new();
        headers.insert("x-signature", verifier.sign(body).unwrap().parse().unwrap());

        let event: PingEvent = verified_event(&verifier, "x-signature", &headers, body).unwrap();
        assert_eq!(event.event_id(), "evt_1");
    }

    #[test]
    fn test_verified_event_rejects_bad_signature() {
        let verifier = HmacSha256Verifier::new("secret");
        let mut headers = HeaderMap::new();
        headers.insert("x-signature", "sha256=00".parse().unwrap());

        let err = verified_event::<PingEvent>(&verifier, "x-signature", &headers, b"{}").unwrap_err();
        assert!(matches!(err, PortalError::Unauthorized(_)));
    }

    #[test]
    fn test_verified_event_rejects_missing_header() {
        let verifier = HmacSha256Verifier::new("secret");
        let err = verified_event::<PingEvent>(&verifier, "x-signature", &HeaderMap::new(), b"{}")
            .unwrap_err();
        assert!(matches!(err, PortalError::Unauthorized(_)));
    }

    #[test]
    fn test_verified_event_rejects_malformed_json() {
        let verifier = HmacSha256Verifier::new("secret");
        let body = b"not json";
        let mut headers = HeaderMap::new();
        headers.insert("x-signature", verifier.sign(body).unwrap().parse().unwrap());

        let err = verified_event::<PingEvent>(&verifier, "x-signature", &headers, body).unwrap_err();
        assert!(matches!(err, PortalError::BadRequest(_)));
    }
}
