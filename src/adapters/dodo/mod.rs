//! Dodo Payments adapter.
//!
//! Implements the `PaymentProvider` port:
//! - Hosted checkout sessions
//! - Subscription and payment lookups
//! - Cancel at period end
//! - Standard Webhooks signature verification
//!
//! # Configuration
//!
//! - `SHARPII__PAYMENT__DODO_API_KEY`: API key (bearer)
//! - `SHARPII__PAYMENT__DODO_WEBHOOK_SECRET`: `whsec_...` signing secret
//! - `SHARPII__PAYMENT__MODE`: `test` or `live`

mod api_types;
mod dodo_adapter;
mod mock_payment_provider;
mod webhook_verifier;

pub use dodo_adapter::{DodoConfig, DodoPaymentAdapter};
pub use mock_payment_provider::MockPaymentProvider;
pub use webhook_verifier::WebhookVerifier;
