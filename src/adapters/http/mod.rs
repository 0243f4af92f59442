//! HTTP adapters - REST API implementations.
//!
//! Each API area has its own module with DTOs, handlers and routes:
//!
//! - `payments` - Subscription checkout, reconciliation and webhooks
//! - `credits` - Balance, history and credit purchases
//! - `tasks` - Enhancement submission and polling
//!
//! `router` assembles them under `/api` behind the auth middleware.

pub mod credits;
pub mod error;
pub mod middleware;
pub mod origin;
pub mod payments;
pub mod router;
pub mod state;
pub mod tasks;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{BillingApiError, ErrorResponse, TaskApiError};
pub use middleware::{auth_middleware, AuthState, RequireAuth};
pub use router::{api_routes, app_router, RouterOptions};
pub use state::AppState;
