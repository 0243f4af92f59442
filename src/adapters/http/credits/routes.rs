//! Axum router configuration for credit endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{complete_purchase, get_balance, get_history, list_packages, purchase_credits};
use crate::adapters::http::state::AppState;

/// Create the credits router, mounted at `/api/credits`.
///
/// # Routes
/// - `GET /balance` - Current balance
/// - `GET /history?limit` - Ledger history
/// - `GET /purchase` - Package catalog (public)
/// - `POST /purchase` - Buy a package or a custom amount
/// - `POST /purchase/complete` - Settle a purchase (200 or 202)
pub fn credit_routes() -> Router<AppState> {
    Router::new()
        .route("/balance", get(get_balance))
        .route("/history", get(get_history))
        .route("/purchase", get(list_packages).post(purchase_credits))
        .route("/purchase/complete", post(complete_purchase))
}
