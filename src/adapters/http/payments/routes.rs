//! Axum router configuration for payment endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    cancel_subscription, complete_payment, create_checkout, get_payment_history,
    get_subscription, handle_webhook, preview_plan_change,
};
use crate::adapters::http::state::AppState;

/// Create the payments router, mounted at `/api/payments`.
///
/// # Routes
///
/// ## User Endpoints (require authentication)
/// - `POST /checkout` - Start a subscription checkout
/// - `POST /complete` - Reconcile a returned checkout (200 or 202)
/// - `POST /cancel` - Cancel at period end
/// - `GET /subscription` - Current subscription
/// - `GET /history` - Payment history
/// - `POST /change-plan/preview` - Plan change proration
///
/// ## Webhook Endpoints (no auth, signature verified)
/// - `POST /webhook` - Dodo Payments deliveries
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/complete", post(complete_payment))
        .route("/cancel", post(cancel_subscription))
        .route("/subscription", get(get_subscription))
        .route("/history", get(get_payment_history))
        .route("/change-plan/preview", post(preview_plan_change))
        .route("/webhook", post(handle_webhook))
}
