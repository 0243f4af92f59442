//! Error responses for the HTTP API.
//!
//! Every failure leaves the API as `{error_code, message, details?}` with
//! the status taken from the domain error.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::billing::BillingError;
use crate::domain::enhancement::TaskError;
use crate::domain::foundation::{DomainError, ErrorCode};

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Billing
// ════════════════════════════════════════════════════════════════════════════════

/// API error for payment and credit endpoints.
#[derive(Debug)]
pub struct BillingApiError(pub BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for BillingApiError {
    fn from(err: DomainError) -> Self {
        Self(BillingError::from(err))
    }
}

impl BillingApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BillingError::InvalidPlan(_)
            | BillingError::InvalidBillingPeriod(_)
            | BillingError::MissingIdentifier
            | BillingError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            BillingError::InvalidWebhookSignature => StatusCode::UNAUTHORIZED,
            BillingError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
            BillingError::OwnershipMismatch | BillingError::OwnershipUnverifiable => {
                StatusCode::FORBIDDEN
            }
            BillingError::SubscriptionNotFound(_)
            | BillingError::PaymentNotFound(_)
            | BillingError::PurchaseNotFound(_) => StatusCode::NOT_FOUND,
            BillingError::VendorTimeout => StatusCode::REQUEST_TIMEOUT,
            BillingError::InvalidState { .. } => StatusCode::CONFLICT,
            BillingError::VendorFailure { .. } => StatusCode::BAD_GATEWAY,
            BillingError::ProductNotConfigured { .. } | BillingError::Infrastructure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match &self.0 {
            BillingError::ValidationFailed { field, .. } => {
                Some(serde_json::json!({ "field": field }))
            }
            BillingError::InsufficientCredits {
                required,
                available,
            } => Some(serde_json::json!({ "required": required, "available": available })),
            BillingError::ProductNotConfigured {
                plan,
                billing_period,
            } => Some(serde_json::json!({
                "plan": plan,
                "billingPeriod": billing_period,
            })),
            BillingError::VendorFailure {
                status: Some(status),
                ..
            } => Some(serde_json::json!({ "upstreamStatus": status })),
            _ => None,
        }
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error_code = %self.0.code(), error = %self.0.message(), "Billing request failed");
        }

        // Storage failures are not echoed to the caller.
        let message = match &self.0 {
            BillingError::Infrastructure(_) => "An internal error occurred".to_string(),
            other => other.message(),
        };
        let code = self.0.code().to_string();
        let body = match self.details() {
            Some(details) => ErrorResponse::with_details(code, message, details),
            None => ErrorResponse::new(code, message),
        };
        body.into_response_with(status)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Tasks
// ════════════════════════════════════════════════════════════════════════════════

/// API error for enhancement task endpoints.
#[derive(Debug)]
pub struct TaskApiError(pub TaskError);

impl From<TaskError> for TaskApiError {
    fn from(err: TaskError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for TaskApiError {
    fn from(err: DomainError) -> Self {
        Self(TaskError::from(err))
    }
}

impl TaskApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            TaskError::UnknownModel(_)
            | TaskError::InvalidImageUrl(_)
            | TaskError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            TaskError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
            TaskError::NotFound(_) => StatusCode::NOT_FOUND,
            TaskError::InvalidState { .. } => StatusCode::CONFLICT,
            TaskError::Provider(_) => StatusCode::BAD_GATEWAY,
            TaskError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TaskApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error_code = %self.0.code(), error = %self.0.message(), "Task request failed");
        }

        let message = match &self.0 {
            TaskError::Infrastructure(_) => "An internal error occurred".to_string(),
            other => other.message(),
        };
        let code = self.0.code().to_string();
        let body = match &self.0 {
            TaskError::InsufficientCredits {
                required,
                available,
            } => ErrorResponse::with_details(
                code,
                message,
                serde_json::json!({ "required": required, "available": available }),
            ),
            _ => ErrorResponse::new(code, message),
        };
        body.into_response_with(status)
    }
}

/// 401 body shared by the auth middleware and extractors.
pub fn unauthorized(message: &str) -> Response {
    ErrorResponse::new(ErrorCode::Unauthorized.to_string(), message)
        .into_response_with(StatusCode::UNAUTHORIZED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::TaskId;

    fn billing_status(err: BillingError) -> StatusCode {
        BillingApiError(err).into_response().status()
    }

    fn task_status(err: TaskError) -> StatusCode {
        TaskApiError(err).into_response().status()
    }

    #[test]
    fn billing_errors_map_to_documented_statuses() {
        assert_eq!(billing_status(BillingError::invalid_plan("gold")), StatusCode::BAD_REQUEST);
        assert_eq!(billing_status(BillingError::MissingIdentifier), StatusCode::BAD_REQUEST);
        assert_eq!(billing_status(BillingError::InvalidWebhookSignature), StatusCode::UNAUTHORIZED);
        assert_eq!(billing_status(BillingError::OwnershipMismatch), StatusCode::FORBIDDEN);
        assert_eq!(billing_status(BillingError::OwnershipUnverifiable), StatusCode::FORBIDDEN);
        assert_eq!(
            billing_status(BillingError::subscription_not_found("sub_1")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(billing_status(BillingError::VendorTimeout), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            billing_status(BillingError::vendor_failure("boom", Some(500))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            billing_status(BillingError::product_not_configured("creator", "daily")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            billing_status(BillingError::insufficient_credits(10, 2)),
            StatusCode::PAYMENT_REQUIRED
        );
    }

    #[test]
    fn task_errors_map_to_documented_statuses() {
        assert_eq!(task_status(TaskError::unknown_model("x")), StatusCode::BAD_REQUEST);
        assert_eq!(task_status(TaskError::not_found(TaskId::new())), StatusCode::NOT_FOUND);
        assert_eq!(task_status(TaskError::provider("down")), StatusCode::BAD_GATEWAY);
        assert_eq!(
            task_status(TaskError::infrastructure("db")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn vendor_failure_body_carries_upstream_message() {
        let response = BillingApiError(BillingError::vendor_failure(
            "Product is archived",
            Some(422),
        ))
        .into_response();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error_code, "PAYMENT_PROVIDER_ERROR");
        assert!(body.message.contains("Product is archived"));
        assert_eq!(body.details.unwrap()["upstreamStatus"], 422);
    }

    #[tokio::test]
    async fn infrastructure_message_is_not_leaked() {
        let response =
            BillingApiError(BillingError::infrastructure("connection refused on 10.0.0.3"))
                .into_response();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!body.message.contains("10.0.0.3"));
    }

    #[test]
    fn error_response_serializes_without_details_when_none() {
        let json = serde_json::to_string(&ErrorResponse::new("NOT_FOUND", "Not found")).unwrap();
        assert!(!json.contains("details"));
    }
}
