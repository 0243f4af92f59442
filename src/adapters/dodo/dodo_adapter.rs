//! Dodo Payments provider adapter.
//!
//! Implements the `PaymentProvider` trait against the Dodo REST API.
//!
//! # Security
//!
//! - Bearer API key held in `secrecy::SecretString`
//! - Webhooks verified with the Standard Webhooks scheme
//!   (see [`WebhookVerifier`])
//!
//! # Configuration
//!
//! ```ignore
//! let config = DodoConfig::new(api_key, webhook_secret)
//!     .with_base_url("https://live.dodopayments.com");
//! let adapter = DodoPaymentAdapter::new(config)?;
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::ports::{
    CheckoutSession, CheckoutSessionDetails, CreateCheckoutRequest, PaymentError,
    PaymentErrorCode, PaymentProvider, VendorPayment, VendorSubscription, WebhookEvent,
    WebhookEventData, WebhookHeaders,
};

use super::api_types::{
    DodoCartItem, DodoCheckoutRequest, DodoCheckoutResponse, DodoCheckoutStatus,
    DodoCustomerRequest, DodoErrorBody, DodoPayment, DodoSubscription, DodoSubscriptionPatch,
    DodoWebhookEnvelope,
};
use super::webhook_verifier::WebhookVerifier;

/// Dodo Payments API configuration.
#[derive(Clone)]
pub struct DodoConfig {
    /// Bearer API key.
    api_key: SecretString,

    /// Standard Webhooks secret (`whsec_...`).
    webhook_secret: SecretString,

    /// Base URL (test or live environment).
    api_base_url: String,

    /// Per-request timeout.
    request_timeout: std::time::Duration,
}

impl DodoConfig {
    /// Create a configuration pointing at the test environment.
    pub fn new(api_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: "https://test.dodopayments.com".to_string(),
            request_timeout: std::time::Duration::from_secs(30),
        }
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Dodo Payments provider adapter.
pub struct DodoPaymentAdapter {
    config: DodoConfig,
    verifier: WebhookVerifier,
    http_client: reqwest::Client,
}

impl DodoPaymentAdapter {
    /// Create a new adapter. Fails if the webhook secret cannot be decoded.
    pub fn new(config: DodoConfig) -> Result<Self, PaymentError> {
        let verifier = WebhookVerifier::new(&config.webhook_secret)?;
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PaymentError::network(e.to_string()))?;
        Ok(Self {
            config,
            verifier,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Send a request and decode the body; `Ok(None)` on 404.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        operation: &'static str,
    ) -> Result<Option<T>, PaymentError> {
        let response = request
            .bearer_auth(self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PaymentError::timeout(format!("Dodo {} timed out", operation))
                } else {
                    PaymentError::network(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body: DodoErrorBody = serde_json::from_str(&text).unwrap_or_default();
            tracing::error!(
                operation,
                status = status.as_u16(),
                error = %text,
                "Dodo API request failed"
            );
            let code = match status.as_u16() {
                401 | 403 => PaymentErrorCode::AuthenticationError,
                400 | 422 => PaymentErrorCode::InvalidRequest,
                429 => PaymentErrorCode::RateLimitExceeded,
                _ => PaymentErrorCode::ProviderError,
            };
            let message = body.message.unwrap_or_else(|| {
                if text.is_empty() {
                    format!("Dodo {} failed with status {}", operation, status.as_u16())
                } else {
                    text.clone()
                }
            });
            let mut err = PaymentError::new(code, message).with_status(status.as_u16());
            if let Some(provider_code) = body.code {
                err = err.with_provider_code(provider_code);
            }
            return Err(err);
        }

        let parsed = response.json::<T>().await.map_err(|e| {
            PaymentError::new(
                PaymentErrorCode::ProviderError,
                format!("Failed to parse Dodo response: {}", e),
            )
        })?;
        Ok(Some(parsed))
    }

    /// Decode a verified webhook body into a domain event.
    fn parse_event(&self, id: &str, payload: &[u8]) -> Result<WebhookEvent, PaymentError> {
        let raw: serde_json::Value = serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse webhook payload");
            PaymentError::invalid_webhook(format!("Invalid JSON: {}", e))
        })?;
        let envelope: DodoWebhookEnvelope = serde_json::from_value(raw.clone())
            .map_err(|e| PaymentError::invalid_webhook(format!("Invalid envelope: {}", e)))?;

        let data = if envelope.event_type.starts_with("subscription.") {
            let sub: DodoSubscription = serde_json::from_value(envelope.data)
                .map_err(|e| PaymentError::invalid_webhook(format!("Invalid subscription: {}", e)))?;
            WebhookEventData::Subscription(sub.into())
        } else if envelope.event_type.starts_with("payment.") {
            let payment: DodoPayment = serde_json::from_value(envelope.data)
                .map_err(|e| PaymentError::invalid_webhook(format!("Invalid payment: {}", e)))?;
            WebhookEventData::Payment(payment.into())
        } else {
            WebhookEventData::Other
        };

        Ok(WebhookEvent {
            id: id.to_string(),
            event_type: envelope.event_type,
            data,
            payload: raw,
        })
    }
}

#[async_trait]
impl PaymentProvider for DodoPaymentAdapter {
    async fn create_checkout(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let body = DodoCheckoutRequest {
            product_cart: vec![DodoCartItem {
                product_id: request.product_id.clone(),
                quantity: request.quantity,
            }],
            customer: DodoCustomerRequest {
                email: request.customer_email,
                name: request.customer_name,
            },
            return_url: request.return_url,
            metadata: request.metadata,
        };

        let created: Option<DodoCheckoutResponse> = self
            .send(self.http_client.post(self.url("/checkouts")).json(&body), "create_checkout")
            .await?;

        created
            .map(CheckoutSession::from)
            .ok_or_else(|| PaymentError::not_found(&format!("Product {}", request.product_id)))
    }

    async fn get_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CheckoutSessionDetails>, PaymentError> {
        let url = self.url(&format!("/checkouts/{}", session_id));
        let status: Option<DodoCheckoutStatus> =
            self.send(self.http_client.get(url), "get_checkout_session").await?;
        Ok(status.map(CheckoutSessionDetails::from))
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<VendorSubscription>, PaymentError> {
        let url = self.url(&format!("/subscriptions/{}", subscription_id));
        let sub: Option<DodoSubscription> =
            self.send(self.http_client.get(url), "get_subscription").await?;
        Ok(sub.map(VendorSubscription::from))
    }

    async fn get_payment(&self, payment_id: &str) -> Result<Option<VendorPayment>, PaymentError> {
        let url = self.url(&format!("/payments/{}", payment_id));
        let payment: Option<DodoPayment> =
            self.send(self.http_client.get(url), "get_payment").await?;
        Ok(payment.map(VendorPayment::from))
    }

    async fn cancel_at_period_end(
        &self,
        subscription_id: &str,
    ) -> Result<VendorSubscription, PaymentError> {
        let url = self.url(&format!("/subscriptions/{}", subscription_id));
        let body = DodoSubscriptionPatch {
            cancel_at_next_billing_date: true,
        };
        let sub: Option<DodoSubscription> = self
            .send(self.http_client.patch(url).json(&body), "cancel_subscription")
            .await?;
        sub.map(VendorSubscription::from)
            .ok_or_else(|| PaymentError::not_found("Subscription"))
    }

    async fn verify_webhook(
        &self,
        headers: &WebhookHeaders,
        payload: &[u8],
    ) -> Result<WebhookEvent, PaymentError> {
        self.verifier
            .verify(headers, payload, chrono::Utc::now().timestamp())?;
        self.parse_event(&headers.id, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    fn adapter() -> DodoPaymentAdapter {
        let secret = format!("whsec_{}", STANDARD.encode(b"dodo-test-key"));
        DodoPaymentAdapter::new(DodoConfig::new("dodo_test", secret)).unwrap()
    }

    #[test]
    fn base_url_is_trimmed() {
        let config = DodoConfig::new("k", "whsec_AAAA").with_base_url("http://localhost:1/");
        assert_eq!(config.api_base_url, "http://localhost:1");
    }

    #[test]
    fn invalid_secret_fails_construction() {
        assert!(DodoPaymentAdapter::new(DodoConfig::new("k", "whsec_!!")).is_err());
    }

    #[test]
    fn parses_subscription_event() {
        let body = br#"{
            "business_id": "bus_1",
            "type": "subscription.active",
            "timestamp": "2026-10-19T10:00:00Z",
            "data": {
                "payload_type": "Subscription",
                "subscription_id": "sub_1",
                "status": "active",
                "product_id": "pdt_creator",
                "metadata": {"user_id": "user-1"}
            }
        }"#;
        let event = adapter().parse_event("msg_1", body).unwrap();
        assert_eq!(event.id, "msg_1");
        assert_eq!(event.event_type, "subscription.active");
        match event.data {
            WebhookEventData::Subscription(sub) => assert_eq!(sub.id, "sub_1"),
            other => panic!("unexpected data: {:?}", other),
        }
    }

    #[test]
    fn parses_payment_event() {
        let body = br#"{
            "type": "payment.succeeded",
            "data": {"payment_id": "pay_1", "status": "succeeded", "total_amount": 1000, "currency": "USD"}
        }"#;
        let event = adapter().parse_event("msg_2", body).unwrap();
        assert!(matches!(event.data, WebhookEventData::Payment(ref p) if p.is_succeeded()));
    }

    #[test]
    fn unknown_event_types_are_other() {
        let body = br#"{"type": "refund.succeeded", "data": {}}"#;
        let event = adapter().parse_event("msg_3", body).unwrap();
        assert_eq!(event.data, WebhookEventData::Other);
    }

    #[tokio::test]
    async fn verify_webhook_rejects_unsigned_delivery() {
        let err = adapter()
            .verify_webhook(&WebhookHeaders::default(), b"{}")
            .await
            .unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::InvalidWebhook);
    }
}
