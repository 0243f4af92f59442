//! HTTP handlers for credit endpoints.

use axum::extract::{Json, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::adapters::http::error::BillingApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::origin::return_base_url;
use crate::adapters::http::state::AppState;
use crate::application::handlers::credits::{
    CompleteCreditPurchaseCommand, GetCreditBalanceQuery, GetCreditHistoryQuery,
    PurchaseCreditsCommand,
};

use super::dto::{
    CompleteCreditPurchaseRequest, CompleteCreditPurchaseResponse, CreditHistoryParams,
    CreditHistoryResponse, CreditPackagesResponse, PurchaseCreditsRequest,
    PurchaseCreditsResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/credits/balance - Live balance; zero when the ledger is unreadable
pub async fn get_balance(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> impl IntoResponse {
    let handler = state.credit_balance_handler();
    let balance = handler
        .handle(GetCreditBalanceQuery { user_id: user.id })
        .await;

    Json(balance)
}

/// GET /api/credits/history - Recent ledger entries
pub async fn get_history(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<CreditHistoryParams>,
) -> impl IntoResponse {
    let handler = state.credit_history_handler();
    let query = GetCreditHistoryQuery {
        user_id: user.id,
        limit: params.limit,
    };

    let transactions = handler.handle(query).await;

    Json(CreditHistoryResponse { transactions })
}

/// GET /api/credits/purchase - Package catalog
pub async fn list_packages(State(state): State<AppState>) -> impl IntoResponse {
    let handler = state.credit_packages_handler();
    Json(CreditPackagesResponse::from(handler.handle()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/credits/purchase - Start a one-time credit checkout
pub async fn purchase_credits(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Json(request): Json<PurchaseCreditsRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.purchase_credits_handler();
    let cmd = PurchaseCreditsCommand {
        user,
        package_type: request.package_type,
        custom_amount: request.custom_amount,
        return_base_url: return_base_url(&headers, state.app_url.as_deref())?,
    };

    let result = handler.handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(PurchaseCreditsResponse::from(result))))
}

/// POST /api/credits/purchase/complete - Settle a purchase after the browser returns
///
/// Responds 202 while the payment is still pending.
pub async fn complete_purchase(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CompleteCreditPurchaseRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.complete_credit_purchase_handler();
    let cmd = CompleteCreditPurchaseCommand {
        user,
        purchase_id: request.purchase_id,
        session_id: request.session_id,
        payment_id: request.payment_id,
    };

    let result = handler.handle(cmd).await?;

    let status = if result.confirmed {
        StatusCode::OK
    } else {
        StatusCode::ACCEPTED
    };
    Ok((status, Json(CompleteCreditPurchaseResponse::from(result))))
}
