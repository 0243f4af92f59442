//! Hosted-checkout payments vendor (Dodo Payments).
//!
//! The vendor owns subscription and payment state; sharpii reads it back
//! and mirrors it locally.
//!
//! Lookups return `Ok(None)` when the vendor reports the object does not
//! exist, so callers can tell "not found" apart from vendor failures.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use thiserror::Error;

use crate::domain::billing::BillingError;
use crate::domain::foundation::Timestamp;

/// Port for payment provider integrations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a hosted checkout session for one product.
    async fn create_checkout(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError>;

    /// Read back a checkout session to find what it produced.
    async fn get_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CheckoutSessionDetails>, PaymentError>;

    /// Get subscription by provider ID.
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<VendorSubscription>, PaymentError>;

    /// Get payment by provider ID.
    async fn get_payment(&self, payment_id: &str) -> Result<Option<VendorPayment>, PaymentError>;

    /// Stop renewal; access continues until the next billing date.
    async fn cancel_at_period_end(
        &self,
        subscription_id: &str,
    ) -> Result<VendorSubscription, PaymentError>;

    /// Verify a webhook signature and parse the event.
    async fn verify_webhook(
        &self,
        headers: &WebhookHeaders,
        payload: &[u8],
    ) -> Result<WebhookEvent, PaymentError>;
}

/// Request to create a checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCheckoutRequest {
    /// Vendor product to sell.
    pub product_id: String,

    pub quantity: u32,

    /// Customer email for pre-fill.
    pub customer_email: String,

    pub customer_name: Option<String>,

    /// Where the vendor sends the browser afterwards.
    pub return_url: String,

    /// Copied onto the resulting subscription/payment; carries `user_id`.
    pub metadata: HashMap<String, String>,
}

/// Created checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub checkout_url: String,
}

/// What a checkout session resolved to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSessionDetails {
    pub session_id: String,
    pub payment_id: Option<String>,
    pub subscription_id: Option<String>,
    pub metadata: HashMap<String, String>,
}

/// Subscription status as reported by the vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorSubscriptionStatus {
    Pending,
    Active,
    OnHold,
    Cancelled,
    Failed,
    Expired,
    #[serde(other)]
    Unknown,
}

impl VendorSubscriptionStatus {
    pub fn is_active(&self) -> bool {
        *self == Self::Active
    }
}

/// Subscription in the payment system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorSubscription {
    pub id: String,
    pub status: VendorSubscriptionStatus,
    pub product_id: String,
    pub customer_email: Option<String>,
    pub metadata: HashMap<String, String>,
    pub next_billing_date: Option<Timestamp>,
    pub cancel_at_next_billing_date: bool,
}

impl VendorSubscription {
    pub fn metadata_user_id(&self) -> Option<&str> {
        self.metadata.get("user_id").map(String::as_str)
    }
}

/// Payment status as reported by the vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorPaymentStatus {
    Succeeded,
    Processing,
    Failed,
    Cancelled,
    RequiresPaymentMethod,
    #[serde(other)]
    Unknown,
}

impl VendorPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorPaymentStatus::Succeeded => "succeeded",
            VendorPaymentStatus::Processing => "processing",
            VendorPaymentStatus::Failed => "failed",
            VendorPaymentStatus::Cancelled => "cancelled",
            VendorPaymentStatus::RequiresPaymentMethod => "requires_payment_method",
            VendorPaymentStatus::Unknown => "unknown",
        }
    }
}

/// Payment in the payment system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorPayment {
    pub id: String,
    pub status: VendorPaymentStatus,
    pub subscription_id: Option<String>,
    /// Smallest currency unit.
    pub total_amount: i64,
    pub currency: String,
    pub customer_email: Option<String>,
    pub metadata: HashMap<String, String>,
    pub created_at: Option<Timestamp>,
}

impl VendorPayment {
    pub fn is_succeeded(&self) -> bool {
        self.status == VendorPaymentStatus::Succeeded
    }

    pub fn metadata_user_id(&self) -> Option<&str> {
        self.metadata.get("user_id").map(String::as_str)
    }
}

/// Standard Webhooks signature headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookHeaders {
    /// `webhook-id`, unique per delivery and stable across retries.
    pub id: String,
    /// `webhook-timestamp`, Unix seconds.
    pub timestamp: String,
    /// `webhook-signature`, space separated `v1,<base64>` entries.
    pub signature: String,
}

/// Verified webhook event.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    /// Delivery id, used for deduplication.
    pub id: String,
    /// Vendor event type, e.g. `subscription.active`.
    pub event_type: String,
    pub data: WebhookEventData,
    /// Original payload for auditing.
    pub payload: serde_json::Value,
}

/// Typed event payload.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEventData {
    Subscription(VendorSubscription),
    Payment(VendorPayment),
    Other,
}

/// What went wrong talking to the vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentErrorCode {
    /// Connection refused, reset or DNS failure.
    NetworkError,
    Timeout,
    /// Our API key was refused.
    AuthenticationError,
    /// The vendor rejected the request body (400/422).
    InvalidRequest,
    NotFound,
    RateLimitExceeded,
    InvalidWebhook,
    ProviderError,
}

impl PaymentErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkError => "network_error",
            Self::Timeout => "timeout",
            Self::AuthenticationError => "authentication_error",
            Self::InvalidRequest => "invalid_request",
            Self::NotFound => "not_found",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::InvalidWebhook => "invalid_webhook",
            Self::ProviderError => "provider_error",
        }
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vendor failure; the message is the vendor's own when it sent one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct PaymentError {
    pub code: PaymentErrorCode,
    pub message: String,
    /// Vendor-specific error code from the response body.
    pub provider_code: Option<String>,
    /// HTTP status the vendor answered with.
    pub status: Option<u16>,
}

impl PaymentError {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            status: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::Timeout, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    pub fn invalid_webhook(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidWebhook, message)
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Timeouts surface as 408, bad signatures as 401, the rest as 502.
impl From<PaymentError> for BillingError {
    fn from(err: PaymentError) -> Self {
        match err.code {
            PaymentErrorCode::Timeout => BillingError::VendorTimeout,
            PaymentErrorCode::InvalidWebhook => BillingError::InvalidWebhookSignature,
            _ => BillingError::vendor_failure(err.message, err.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn PaymentProvider) {}
    }

    #[test]
    fn unrecognized_vendor_statuses_do_not_fail_parsing() {
        let status: VendorSubscriptionStatus = serde_json::from_str("\"paused\"").unwrap();
        assert_eq!(status, VendorSubscriptionStatus::Unknown);
        let status: VendorSubscriptionStatus = serde_json::from_str("\"on_hold\"").unwrap();
        assert_eq!(status, VendorSubscriptionStatus::OnHold);
        let status: VendorPaymentStatus = serde_json::from_str("\"refunded\"").unwrap();
        assert_eq!(status, VendorPaymentStatus::Unknown);
    }

    #[test]
    fn metadata_user_id_is_read_from_metadata() {
        let payment = VendorPayment {
            id: "pay_1".to_string(),
            status: VendorPaymentStatus::Succeeded,
            subscription_id: None,
            total_amount: 900,
            currency: "USD".to_string(),
            customer_email: None,
            metadata: HashMap::from([("user_id".to_string(), "alice".to_string())]),
            created_at: None,
        };
        assert!(payment.is_succeeded());
        assert_eq!(payment.metadata_user_id(), Some("alice"));
    }

    #[test]
    fn error_display_leads_with_code() {
        let err = PaymentError::new(PaymentErrorCode::AuthenticationError, "bad key");
        assert_eq!(err.to_string(), "authentication_error: bad key");
    }

    #[test]
    fn vendor_timeout_maps_to_billing_timeout() {
        let err: BillingError = PaymentError::timeout("slow").into();
        assert_eq!(err, BillingError::VendorTimeout);

        let err: BillingError = PaymentError::invalid_webhook("bad sig").into();
        assert_eq!(err, BillingError::InvalidWebhookSignature);
    }

    #[test]
    fn other_vendor_errors_keep_message_and_status() {
        let err: BillingError = PaymentError::new(PaymentErrorCode::ProviderError, "product archived")
            .with_status(422)
            .into();
        assert_eq!(err, BillingError::vendor_failure("product archived", Some(422)));
    }
}
