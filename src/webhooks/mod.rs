//! Webhook handling utilities.
//!
//! Signature verification, delivery deduplication, and event dispatch for
//! inbound webhooks from the video host.

mod config;
pub mod handler;
pub mod idempotency;
pub mod verification;

pub use config::WebhookConfig;
pub use handler::{
    WebhookEvent, WebhookHandler, WebhookOutcome, WebhookRouter, verified_event, verify_request,
};
pub use idempotency::{IdempotencyStore, MemoryIdempotencyStore};
pub use verification::{
    HmacSha256Verifier, SUPPORTED_METHOD, SignatureHeader, VerificationFailure, WebhookVerifier,
};
