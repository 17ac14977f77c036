//! Webhook authentication.
//!
//! Inbound webhook payloads are verified before any event is
//! attributed to a tenant: an Ed25519 signature over the exact byte
//! concatenation `timestamp ‖ raw_body`, plus a freshness check on the
//! timestamp. The raw body must reach the verifier untouched —
//! re-serializing the JSON changes the bytes and breaks verification.
//!
//! Downstream processing still re-derives the tenant from the internal
//! user record the event references; the payload's own claimed tenant
//! id is never trusted for attribution.

use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use cordon_core::error::CordonError;

use crate::error::WebhookError;

/// Deployment environment. Only `Development` may run without a
/// verification key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// The provider's Ed25519 public key. Required in production.
    pub verifying_key: Option<VerifyingKey>,
    /// Maximum tolerated clock skew/age in seconds (default: 600).
    pub replay_window_secs: i64,
    pub environment: Environment,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            verifying_key: None,
            replay_window_secs: 600,
            environment: Environment::Production,
        }
    }
}

/// Decode a base64-encoded 32-byte Ed25519 public key.
pub fn parse_verifying_key(encoded: &str) -> Result<VerifyingKey, CordonError> {
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| CordonError::Crypto(format!("webhook key is not base64: {e}")))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CordonError::Crypto("webhook key must be 32 bytes".into()))?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|e| CordonError::Crypto(format!("invalid webhook key: {e}")))
}

/// State-free webhook signature and freshness verification.
pub struct WebhookVerifier {
    config: WebhookConfig,
}

impl WebhookVerifier {
    pub fn new(config: WebhookConfig) -> Self {
        Self { config }
    }

    /// Verify an inbound event. `signature` and `timestamp` come from
    /// headers; `raw_body` is the unparsed request body.
    ///
    /// Rejections are typed and logged by the caller with full
    /// context; the event must never be processed after a failure.
    pub fn verify(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        raw_body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<(), WebhookError> {
        let Some(key) = self.config.verifying_key.as_ref() else {
            if self.config.environment == Environment::Development {
                tracing::warn!("webhook verification skipped: no key configured (development)");
                return Ok(());
            }
            return Err(WebhookError::KeyNotConfigured);
        };

        let signature = signature.ok_or(WebhookError::MissingSignature)?;
        let timestamp = timestamp.ok_or(WebhookError::MissingTimestamp)?;

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| WebhookError::MalformedTimestamp(timestamp.to_string()))?;
        let skew = (now.timestamp() - ts).abs();
        if skew > self.config.replay_window_secs {
            return Err(WebhookError::StaleTimestamp {
                skew_secs: skew,
                window_secs: self.config.replay_window_secs,
            });
        }

        let sig_bytes = BASE64
            .decode(signature)
            .map_err(|e| WebhookError::MalformedSignature(e.to_string()))?;
        let sig = Signature::from_slice(&sig_bytes)
            .map_err(|e| WebhookError::MalformedSignature(e.to_string()))?;

        // The signed message is the exact concatenation of the
        // timestamp's ASCII bytes and the raw body.
        let mut message = Vec::with_capacity(timestamp.len() + raw_body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(raw_body);

        key.verify(&message, &sig)
            .map_err(|_| WebhookError::BadSignature)
    }
}

/// TTL-bounded set of provider event ids, making duplicate webhook
/// delivery idempotent at the calling layer.
pub struct EventDeduper {
    seen: DashMap<String, Instant>,
    ttl: Duration,
}

impl EventDeduper {
    pub fn new(ttl: Duration) -> Self {
        Self {
            seen: DashMap::new(),
            ttl,
        }
    }

    /// Record an event id. Returns `true` the first time an id is seen
    /// within the TTL; `false` for a redelivery.
    pub fn observe(&self, event_id: &str) -> bool {
        let now = Instant::now();

        if self.seen.len() >= 65_536 {
            self.seen.retain(|_, first_seen| now.duration_since(*first_seen) < self.ttl);
        }

        match self.seen.entry(event_id.to_string()) {
            Entry::Occupied(mut entry) => {
                if now.duration_since(*entry.get()) < self.ttl {
                    false
                } else {
                    entry.insert(now);
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn keypair() -> (SigningKey, VerifyingKey) {
        let signing = SigningKey::from_bytes(&[7u8; 32]);
        let verifying = signing.verifying_key();
        (signing, verifying)
    }

    fn verifier(key: VerifyingKey) -> WebhookVerifier {
        WebhookVerifier::new(WebhookConfig {
            verifying_key: Some(key),
            replay_window_secs: 600,
            environment: Environment::Production,
        })
    }

    fn sign(signing: &SigningKey, timestamp: &str, body: &[u8]) -> String {
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        BASE64.encode(signing.sign(&message).to_bytes())
    }

    #[test]
    fn valid_event_is_accepted() {
        let (signing, key) = keypair();
        let now = Utc::now();
        let ts = now.timestamp().to_string();
        let body = br#"{"event_id":"evt_1","user_id":"u1"}"#;
        let sig = sign(&signing, &ts, body);

        assert_eq!(
            verifier(key).verify(Some(&sig), Some(&ts), body, now),
            Ok(())
        );
    }

    #[test]
    fn one_second_inside_the_window_is_accepted() {
        let (signing, key) = keypair();
        let now = Utc::now();
        let ts = (now.timestamp() - 599).to_string();
        let body = b"payload";
        let sig = sign(&signing, &ts, body);

        assert_eq!(
            verifier(key).verify(Some(&sig), Some(&ts), body, now),
            Ok(())
        );
    }

    #[test]
    fn one_second_outside_the_window_is_rejected() {
        let (signing, key) = keypair();
        let now = Utc::now();
        let ts = (now.timestamp() - 601).to_string();
        let body = b"payload";
        let sig = sign(&signing, &ts, body);

        assert!(matches!(
            verifier(key).verify(Some(&sig), Some(&ts), body, now),
            Err(WebhookError::StaleTimestamp { .. })
        ));
    }

    #[test]
    fn future_timestamps_are_bounded_too() {
        let (signing, key) = keypair();
        let now = Utc::now();
        let ts = (now.timestamp() + 601).to_string();
        let sig = sign(&signing, &ts, b"x");

        assert!(matches!(
            verifier(key).verify(Some(&sig), Some(&ts), b"x", now),
            Err(WebhookError::StaleTimestamp { .. })
        ));
    }

    #[test]
    fn flipping_a_body_byte_breaks_verification() {
        let (signing, key) = keypair();
        let now = Utc::now();
        let ts = now.timestamp().to_string();
        let body = b"important payload".to_vec();
        let sig = sign(&signing, &ts, &body);

        for index in 0..body.len() {
            let mut tampered = body.clone();
            tampered[index] ^= 0x01;
            assert_eq!(
                verifier(key).verify(Some(&sig), Some(&ts), &tampered, now),
                Err(WebhookError::BadSignature),
                "tampered byte {index} was accepted"
            );
        }
    }

    #[test]
    fn reserialized_body_is_not_equivalent() {
        let (signing, key) = keypair();
        let now = Utc::now();
        let ts = now.timestamp().to_string();
        let sig = sign(&signing, &ts, br#"{"a":1,"b":2}"#);

        // Same JSON value, different bytes.
        assert_eq!(
            verifier(key).verify(Some(&sig), Some(&ts), br#"{"b":2,"a":1}"#, now),
            Err(WebhookError::BadSignature)
        );
    }

    #[test]
    fn missing_headers_are_rejected() {
        let (_, key) = keypair();
        let now = Utc::now();
        let v = verifier(key);
        assert_eq!(
            v.verify(None, Some("0"), b"x", now),
            Err(WebhookError::MissingSignature)
        );
        assert_eq!(
            v.verify(Some("sig"), None, b"x", now),
            Err(WebhookError::MissingTimestamp)
        );
    }

    #[test]
    fn missing_key_fails_closed_in_production() {
        let v = WebhookVerifier::new(WebhookConfig::default());
        assert_eq!(
            v.verify(Some("sig"), Some("0"), b"x", Utc::now()),
            Err(WebhookError::KeyNotConfigured)
        );
    }

    #[test]
    fn missing_key_is_tolerated_in_development() {
        let v = WebhookVerifier::new(WebhookConfig {
            verifying_key: None,
            replay_window_secs: 600,
            environment: Environment::Development,
        });
        assert_eq!(v.verify(None, None, b"x", Utc::now()), Ok(()));
    }

    #[test]
    fn deduper_flags_redelivery() {
        let deduper = EventDeduper::new(Duration::from_secs(60));
        assert!(deduper.observe("evt_1"));
        assert!(!deduper.observe("evt_1"));
        assert!(deduper.observe("evt_2"));
    }
}
