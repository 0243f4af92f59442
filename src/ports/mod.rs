//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application and the outside world. Adapters implement these ports.
//!
//! ## Vendor Ports
//!
//! - `PaymentProvider` - Checkout, subscriptions, payments, webhooks
//! - `EnhancementProvider` - Image inference jobs
//! - `SessionValidator` - Caller identity from tokens/cookies
//!
//! ## Storage Ports
//!
//! - `CreditRepository` - Append-only credit ledger
//! - `SubscriptionRepository` - One subscription row per user
//! - `PaymentRepository` - Vendor payment log
//! - `CheckoutSessionRepository` - Checkout session → plan mapping
//! - `CreditPurchaseRepository` - One-time purchases
//! - `TaskRepository` - Enhancement tasks
//! - `WebhookEventRepository` - Webhook delivery idempotency

mod checkout_session_repository;
mod credit_purchase_repository;
mod credit_repository;
mod enhancement_provider;
mod payment_provider;
mod payment_repository;
mod session_validator;
mod subscription_repository;
mod task_repository;
mod webhook_event_repository;

pub use checkout_session_repository::{CheckoutSessionRecord, CheckoutSessionRepository};
pub use credit_purchase_repository::CreditPurchaseRepository;
pub use credit_repository::CreditRepository;
pub use enhancement_provider::{EnhancementProvider, SubmissionRequest};
pub use payment_provider::{
    CheckoutSession, CheckoutSessionDetails, CreateCheckoutRequest, PaymentError,
    PaymentErrorCode, PaymentProvider, VendorPayment, VendorPaymentStatus, VendorSubscription,
    VendorSubscriptionStatus, WebhookEvent, WebhookEventData, WebhookHeaders,
};
pub use payment_repository::PaymentRepository;
pub use session_validator::SessionValidator;
pub use subscription_repository::SubscriptionRepository;
pub use task_repository::{TaskPage, TaskQuery, TaskRepository};
pub use webhook_event_repository::{WebhookEventRecord, WebhookEventRepository, WebhookOutcome};

/// Result of an insert guarded by a unique key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Row was written.
    Inserted,
    /// A row with the same key already existed; nothing was written.
    AlreadyExists,
}

impl SaveResult {
    pub fn is_inserted(&self) -> bool {
        matches!(self, SaveResult::Inserted)
    }
}
