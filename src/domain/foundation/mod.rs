//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps, authentication types and the error vocabulary
//! shared by the billing and enhancement domains.

mod auth;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{PaymentId, PurchaseId, SubscriptionId, TaskId, TransactionId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
