//! Standard Webhooks signature verification.
//!
//! Dodo signs deliveries following the Standard Webhooks scheme:
//! `base64(HMAC-SHA256(key, "{webhook-id}.{webhook-timestamp}.{body}"))`
//! where the key is the base64 payload of the `whsec_` secret. The
//! `webhook-signature` header may carry several space separated
//! `v1,<signature>` entries during secret rotation.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::ports::{PaymentError, WebhookHeaders};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for webhook deliveries (5 minutes).
const TOLERANCE_SECS: i64 = 300;

const SECRET_PREFIX: &str = "whsec_";

/// Verifies `webhook-signature` headers against the shared secret.
pub struct WebhookVerifier {
    key: Secret<Vec<u8>>,
}

impl WebhookVerifier {
    /// Build a verifier from a `whsec_<base64>` secret.
    pub fn new(secret: &SecretString) -> Result<Self, PaymentError> {
        let encoded = secret
            .expose_secret()
            .strip_prefix(SECRET_PREFIX)
            .unwrap_or(secret.expose_secret());
        let key = STANDARD
            .decode(encoded)
            .map_err(|_| PaymentError::invalid_webhook("Webhook secret is not valid base64"))?;
        Ok(Self {
            key: Secret::new(key),
        })
    }

    /// Check a delivery's signature and timestamp.
    pub fn verify(
        &self,
        headers: &WebhookHeaders,
        payload: &[u8],
        now_secs: i64,
    ) -> Result<(), PaymentError> {
        if headers.id.is_empty() || headers.timestamp.is_empty() || headers.signature.is_empty() {
            return Err(PaymentError::invalid_webhook("Missing webhook headers"));
        }

        let timestamp: i64 = headers
            .timestamp
            .trim()
            .parse()
            .map_err(|_| PaymentError::invalid_webhook("Invalid webhook timestamp"))?;

        if (now_secs - timestamp).abs() > TOLERANCE_SECS {
            tracing::warn!(
                event_timestamp = timestamp,
                current_time = now_secs,
                "Webhook timestamp outside tolerance - possible replay"
            );
            return Err(PaymentError::invalid_webhook("Webhook timestamp outside tolerance"));
        }

        let expected = self.compute(&headers.id, &headers.timestamp, payload)?;

        let matched = headers
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == "v1")
            .filter_map(|(_, sig)| STANDARD.decode(sig).ok())
            .any(|provided| expected.as_slice().ct_eq(&provided).into());

        if !matched {
            tracing::warn!(webhook_id = %headers.id, "Invalid webhook signature");
            return Err(PaymentError::invalid_webhook("Invalid signature"));
        }

        Ok(())
    }

    /// Produce a `v1,<base64>` signature for a payload.
    pub fn sign(&self, id: &str, timestamp: &str, payload: &[u8]) -> Result<String, PaymentError> {
        let mac = self.compute(id, timestamp, payload)?;
        Ok(format!("v1,{}", STANDARD.encode(mac)))
    }

    fn compute(&self, id: &str, timestamp: &str, payload: &[u8]) -> Result<Vec<u8>, PaymentError> {
        let mut mac = HmacSha256::new_from_slice(self.key.expose_secret())
            .map_err(|e| PaymentError::invalid_webhook(format!("Invalid webhook key: {}", e)))?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}
