//! Payment handlers.
//!
//! Subscription checkout and reconciliation against Dodo Payments.
//!
//! ## Commands
//! - Creating subscription checkouts
//! - Completing a checkout from the browser return
//! - Processing payment webhooks
//! - Cancelling at period end
//!
//! ## Queries
//! - Current subscription
//! - Payment history
//! - Plan change preview
//!
//! The browser return and the webhook both go through
//! `SubscriptionActivator`, so credits land once per billing period
//! whichever arrives first.

mod cancel_subscription;
mod complete_payment;
mod create_checkout;
mod get_payment_history;
mod get_subscription;
mod handle_payment_webhook;
mod preview_plan_change;
mod products;
mod subscription_activator;

pub use products::ProductCatalog;
pub use subscription_activator::{Activation, ActivationOutcome, SubscriptionActivator};

// Commands
pub use cancel_subscription::{CancelSubscriptionCommand, CancelSubscriptionHandler};
pub use complete_payment::{CompletePaymentCommand, CompletePaymentHandler, CompletePaymentResult};
pub use create_checkout::{CreateCheckoutCommand, CreateCheckoutHandler, CreateCheckoutResult};
pub use handle_payment_webhook::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, HandlePaymentWebhookResult,
};

// Queries
pub use get_payment_history::{
    GetPaymentHistoryHandler, GetPaymentHistoryQuery, DEFAULT_PAYMENT_HISTORY_LIMIT,
    MAX_PAYMENT_HISTORY_LIMIT,
};
pub use get_subscription::{GetSubscriptionHandler, GetSubscriptionQuery};
pub use preview_plan_change::{PreviewPlanChangeHandler, PreviewPlanChangeQuery};
