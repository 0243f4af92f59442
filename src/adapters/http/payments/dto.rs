//! HTTP DTOs for payment endpoints.
//!
//! JSON bodies use camelCase keys. Completion identifiers also accept the
//! snake_case spelling the vendor puts in return URL query strings.

use serde::{Deserialize, Serialize};

use crate::application::handlers::payments::{CompletePaymentResult, CreateCheckoutResult};
use crate::domain::billing::{BillingPeriod, PaymentRecord, Plan, Subscription};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub plan: String,
    pub billing_period: String,
}

/// Any one identifier is enough.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletePaymentRequest {
    #[serde(default, alias = "subscription_id")]
    pub subscription_id: Option<String>,
    #[serde(default, alias = "payment_id")]
    pub payment_id: Option<String>,
    #[serde(default, alias = "session_id", alias = "checkoutSessionId")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentHistoryParams {
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanChangePreviewRequest {
    pub target_plan: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub checkout_url: String,
    pub session_id: String,
    pub plan: Plan,
    pub billing_period: BillingPeriod,
}

impl From<CreateCheckoutResult> for CheckoutResponse {
    fn from(result: CreateCheckoutResult) -> Self {
        Self {
            checkout_url: result.checkout_url,
            session_id: result.session_id,
            plan: result.plan,
            billing_period: result.billing_period,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletePaymentResponse {
    /// False while the vendor has not confirmed; the client polls again.
    pub confirmed: bool,
    pub subscription: Option<Subscription>,
    pub credits_allocated: i64,
    pub already_processed: bool,
    pub message: String,
}

impl From<CompletePaymentResult> for CompletePaymentResponse {
    fn from(result: CompletePaymentResult) -> Self {
        let message = if !result.confirmed {
            "Payment is still being processed"
        } else if result.already_processed {
            "Subscription already active"
        } else {
            "Subscription activated"
        };
        Self {
            confirmed: result.confirmed,
            subscription: result.subscription,
            credits_allocated: result.credits_allocated,
            already_processed: result.already_processed,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub subscription: Option<Subscription>,
    pub has_access: bool,
}

impl From<Option<Subscription>> for SubscriptionResponse {
    fn from(subscription: Option<Subscription>) -> Self {
        let has_access = subscription
            .as_ref()
            .map_or(false, |s| s.status.grants_access());
        Self {
            subscription,
            has_access,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentHistoryResponse {
    pub payments: Vec<PaymentRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelSubscriptionResponse {
    pub subscription: Subscription,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookResponse {
    pub received: bool,
    pub status: &'static str,
}
