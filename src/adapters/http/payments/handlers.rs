//! HTTP handlers for payment endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use axum::body::Bytes;
use axum::extract::{Json, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::adapters::http::error::BillingApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::origin::return_base_url;
use crate::adapters::http::state::AppState;
use crate::application::handlers::payments::{
    CancelSubscriptionCommand, CompletePaymentCommand, CreateCheckoutCommand,
    GetPaymentHistoryQuery, GetSubscriptionQuery, HandlePaymentWebhookCommand,
    HandlePaymentWebhookResult, PreviewPlanChangeQuery,
};
use crate::domain::billing::BillingError;
use crate::ports::WebhookHeaders;

use super::dto::{
    CancelSubscriptionResponse, CheckoutRequest, CheckoutResponse, CompletePaymentRequest,
    CompletePaymentResponse, PaymentHistoryParams, PaymentHistoryResponse,
    PlanChangePreviewRequest, SubscriptionResponse, WebhookResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/payments/subscription - Current user's subscription
pub async fn get_subscription(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.get_subscription_handler();
    let query = GetSubscriptionQuery { user_id: user.id };

    let subscription = handler.handle(query).await?;

    Ok(Json(SubscriptionResponse::from(subscription)))
}

/// GET /api/payments/history - Recent payments, newest first
pub async fn get_payment_history(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<PaymentHistoryParams>,
) -> impl IntoResponse {
    let handler = state.payment_history_handler();
    let query = GetPaymentHistoryQuery {
        user_id: user.id,
        limit: params.limit,
    };

    let payments = handler.handle(query).await;

    Json(PaymentHistoryResponse { payments })
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments/checkout - Start a subscription checkout
pub async fn create_checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.create_checkout_handler();
    let cmd = CreateCheckoutCommand {
        user,
        plan: request.plan,
        billing_period: request.billing_period,
        return_base_url: return_base_url(&headers, state.app_url.as_deref())?,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(CheckoutResponse::from(result)))
}

/// POST /api/payments/complete - Reconcile a checkout after the browser returns
///
/// Responds 202 while the vendor has not confirmed; the client polls again.
pub async fn complete_payment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CompletePaymentRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.complete_payment_handler();
    let cmd = CompletePaymentCommand {
        user,
        subscription_id: request.subscription_id,
        payment_id: request.payment_id,
        session_id: request.session_id,
    };

    let result = handler.handle(cmd).await?;

    let status = if result.confirmed {
        StatusCode::OK
    } else {
        StatusCode::ACCEPTED
    };
    Ok((status, Json(CompletePaymentResponse::from(result))))
}

/// POST /api/payments/cancel - Cancel at the end of the current period
pub async fn cancel_subscription(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.cancel_subscription_handler();
    let cmd = CancelSubscriptionCommand { user_id: user.id };

    let subscription = handler.handle(cmd).await?;

    Ok(Json(CancelSubscriptionResponse { subscription }))
}

/// POST /api/payments/change-plan/preview - Price a plan switch
pub async fn preview_plan_change(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<PlanChangePreviewRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.preview_plan_change_handler();
    let query = PreviewPlanChangeQuery {
        user_id: user.id,
        target_plan: request.target_plan,
    };

    let preview = handler.handle(query).await?;

    Ok(Json(preview))
}

/// POST /api/payments/webhook - Dodo Payments webhook deliveries
///
/// Unauthenticated; the Standard Webhooks signature is verified instead.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, BillingApiError> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| BillingError::validation(name, format!("Missing {} header", name)))
    };
    let webhook_headers = WebhookHeaders {
        id: header("webhook-id")?,
        timestamp: header("webhook-timestamp")?,
        signature: header("webhook-signature")?,
    };

    let handler = state.webhook_handler();
    let cmd = HandlePaymentWebhookCommand {
        headers: webhook_headers,
        payload: body.to_vec(),
    };

    let status = match handler.handle(cmd).await? {
        HandlePaymentWebhookResult::Processed { .. } => "processed",
        HandlePaymentWebhookResult::Ignored { .. } => "ignored",
        HandlePaymentWebhookResult::Duplicate => "duplicate",
    };

    Ok(Json(WebhookResponse {
        received: true,
        status,
    }))
}
