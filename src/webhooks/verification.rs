use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// The only signature method accepted in the `<method>=<hex-digest>` header.
pub const SUPPORTED_METHOD: &str = "sha256";

/// Why a webhook signature was rejected
///
/// Verification never errors out of the verifier: every failure is one of
/// these values, logged by [`WebhookVerifier::verify`] and turned into `false`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationFailure {
    #[error("webhook secret is not configured")]
    MissingSecret,

    #[error("signature header is missing")]
    MissingHeader,

    #[error("signature header is malformed")]
    MalformedHeader,

    #[error("unsupported signature method `{0}`")]
    UnsupportedMethod(String),

    #[error("signature digest is not valid hex")]
    InvalidDigest,

    #[error("signature does not match payload")]
    Mismatch,
}

/// A parsed `<method>=<hex-digest>` signature header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureHeader<'a> {
    pub method: &'a str,
    pub digest: &'a str,
}

impl<'a> SignatureHeader<'a> {
    /// Split a header value on its first `=`.
    ///
    /// Both halves must be non-empty. The method is not checked here.
    pub fn parse(raw: &'a str) -> Result<Self, VerificationFailure> {
        let (method, digest) = raw
            .trim()
            .split_once('=')
            .ok_or(VerificationFailure::MalformedHeader)?;

        if method.is_empty() || digest.is_empty() {
            return Err(VerificationFailure::MalformedHeader);
        }

        Ok(Self { method, digest })
    }
}

/// Trait for verifying webhook signatures
///
/// Implement [`check`](WebhookVerifier::check); callers normally use
/// [`verify`](WebhookVerifier::verify), which logs the failure reason and
/// collapses the result to a boolean verdict.
pub trait WebhookVerifier: Send + Sync {
    /// Check a payload against the signature header value, if one was sent
    fn check(&self, payload: &[u8], signature: Option<&str>) -> Result<(), VerificationFailure>;

    /// Whether this verifier can accept anything at all
    fn is_configured(&self) -> bool {
        true
    }

    /// Boolean verdict for a payload and signature header value
    fn verify(&self, payload: &[u8], signature: Option<&str>) -> bool {
        match self.check(payload, signature) {
            Ok(()) => true,
            Err(reason) => {
                tracing::warn!(
                    target: "coursegate::webhooks",
                    reason = %reason,
                    payload_len = payload.len(),
                    "Webhook signature verification failed"
                );
                false
            }
        }
    }
}

/// HMAC-SHA256 verifier for `sha256=<hex-digest>` signature headers
///
/// The secret is held as a [`SecretString`] so it never shows up in debug
/// output. An empty secret fails closed: every signature is rejected rather
/// than checked against an HMAC keyed with nothing.
///
/// # Example
///
/// ```rust
/// use coursegate::webhooks::{HmacSha256Verifier, WebhookVerifier};
///
/// let verifier = HmacSha256Verifier::new("s3cr3t");
/// let payload = br#"{"a":1}"#;
/// let header = verifier.sign(payload).unwrap();
///
/// assert!(header.starts_with("sha256="));
/// assert!(verifier.verify(payload, Some(&header)));
/// ```
pub struct HmacSha256Verifier {
    secret: SecretString,
}

impl HmacSha256Verifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::from(secret.into()),
        }
    }

    /// Whether a usable secret is configured
    pub fn has_secret(&self) -> bool {
        !self.secret.expose_secret().is_empty()
    }

    /// Produce the header value a sender would attach to `payload`
    pub fn sign(&self, payload: &[u8]) -> Result<String, VerificationFailure> {
        if !self.has_secret() {
            return Err(VerificationFailure::MissingSecret);
        }
        Ok(format!(
            "{}={}",
            SUPPORTED_METHOD,
            hex::encode(self.compute_digest(payload))
        ))
    }

    fn compute_digest(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

impl std::fmt::Debug for HmacSha256Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSha256Verifier")
            .field("has_secret", &self.has_secret())
            .finish_non_exhaustive()
    }
}

impl WebhookVerifier for HmacSha256Verifier {
    fn is_configured(&self) -> bool {
        self.has_secret()
    }

    fn check(&self, payload: &[u8], signature: Option<&str>) -> Result<(), VerificationFailure> {
        if !self.has_secret() {
            return Err(VerificationFailure::MissingSecret);
        }

        let header = SignatureHeader::parse(signature.ok_or(VerificationFailure::MissingHeader)?)?;
        if header.method != SUPPORTED_METHOD {
            return Err(VerificationFailure::UnsupportedMethod(header.method.to_string()));
        }

        let provided = hex::decode(header.digest).map_err(|_| VerificationFailure::InvalidDigest)?;
        let expected = self.compute_digest(payload);

        if constant_time_compare(&expected, &provided) {
            Ok(())
        } else {
            Err(VerificationFailure::Mismatch)
        }
    }
}

/// Constant-time comparison of two digests
///
/// A length mismatch returns `false` straight away; digest length is public.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
