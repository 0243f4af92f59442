//! In-memory adapters for the storage ports.
//!
//! Thread-safe via internal `Mutex`. Used by tests and local runs without
//! a database. Nothing persists across restarts.

mod checkout_session_repository;
mod credit_purchase_repository;
mod credit_repository;
mod payment_repository;
mod subscription_repository;
mod task_repository;
mod webhook_event_repository;

pub use checkout_session_repository::InMemoryCheckoutSessionRepository;
pub use credit_purchase_repository::InMemoryCreditPurchaseRepository;
pub use credit_repository::InMemoryCreditRepository;
pub use payment_repository::InMemoryPaymentRepository;
pub use subscription_repository::InMemorySubscriptionRepository;
pub use task_repository::InMemoryTaskRepository;
pub use webhook_event_repository::InMemoryWebhookEventRepository;
