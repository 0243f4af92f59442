//! Dodo Payments API wire types.
//!
//! Only the fields the application reads are modelled. Everything is
//! lenient (`default`) because the vendor adds fields and omits nulls.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::ports::{
    CheckoutSession, CheckoutSessionDetails, VendorPayment, VendorPaymentStatus,
    VendorSubscription, VendorSubscriptionStatus,
};

/// `POST /checkouts` body.
#[derive(Debug, Serialize)]
pub struct DodoCheckoutRequest {
    pub product_cart: Vec<DodoCartItem>,
    pub customer: DodoCustomerRequest,
    pub return_url: String,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct DodoCartItem {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct DodoCustomerRequest {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// `POST /checkouts` response.
#[derive(Debug, Deserialize)]
pub struct DodoCheckoutResponse {
    pub session_id: String,
    pub checkout_url: String,
}

impl From<DodoCheckoutResponse> for CheckoutSession {
    fn from(r: DodoCheckoutResponse) -> Self {
        Self {
            session_id: r.session_id,
            checkout_url: r.checkout_url,
        }
    }
}

/// `GET /checkouts/{id}` response.
#[derive(Debug, Deserialize)]
pub struct DodoCheckoutStatus {
    #[serde(alias = "session_id")]
    pub id: String,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

impl From<DodoCheckoutStatus> for CheckoutSessionDetails {
    fn from(r: DodoCheckoutStatus) -> Self {
        Self {
            session_id: r.id,
            payment_id: r.payment_id,
            subscription_id: r.subscription_id,
            metadata: r.metadata.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DodoCustomer {
    #[serde(default)]
    pub email: Option<String>,
}

/// Subscription object from the API and from webhook payloads.
#[derive(Debug, Deserialize)]
pub struct DodoSubscription {
    pub subscription_id: String,
    pub status: VendorSubscriptionStatus,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub customer: DodoCustomer,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(default)]
    pub next_billing_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancel_at_next_billing_date: bool,
}

impl From<DodoSubscription> for VendorSubscription {
    fn from(s: DodoSubscription) -> Self {
        Self {
            id: s.subscription_id,
            status: s.status,
            product_id: s.product_id,
            customer_email: s.customer.email,
            metadata: s.metadata.unwrap_or_default(),
            next_billing_date: s.next_billing_date.map(Timestamp::from_datetime),
            cancel_at_next_billing_date: s.cancel_at_next_billing_date,
        }
    }
}

/// Payment object from the API and from webhook payloads.
#[derive(Debug, Deserialize)]
pub struct DodoPayment {
    pub payment_id: String,
    /// Null while the customer is still on the checkout page.
    #[serde(default)]
    pub status: Option<VendorPaymentStatus>,
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub total_amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub customer: DodoCustomer,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl From<DodoPayment> for VendorPayment {
    fn from(p: DodoPayment) -> Self {
        Self {
            id: p.payment_id,
            status: p.status.unwrap_or(VendorPaymentStatus::Processing),
            subscription_id: p.subscription_id,
            total_amount: p.total_amount,
            currency: p.currency,
            customer_email: p.customer.email,
            metadata: p.metadata.unwrap_or_default(),
            created_at: p.created_at.map(Timestamp::from_datetime),
        }
    }
}

/// `PATCH /subscriptions/{id}` body.
#[derive(Debug, Serialize)]
pub struct DodoSubscriptionPatch {
    pub cancel_at_next_billing_date: bool,
}

/// Webhook envelope.
#[derive(Debug, Deserialize)]
pub struct DodoWebhookEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// API error body.
#[derive(Debug, Default, Deserialize)]
pub struct DodoErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
