//! Billing-specific error types.
//!
//! Covers credits, subscriptions, payments, checkout and purchases.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | InvalidPlan / InvalidBillingPeriod / MissingIdentifier / ValidationFailed | 400 |
//! | InvalidWebhookSignature | 401 |
//! | InsufficientCredits | 402 |
//! | OwnershipMismatch / OwnershipUnverifiable | 403 |
//! | SubscriptionNotFound / PaymentNotFound / PurchaseNotFound | 404 |
//! | VendorTimeout | 408 |
//! | InvalidState | 409 |
//! | ProductNotConfigured / Infrastructure | 500 |
//! | VendorFailure | 502 |

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Billing-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// Unknown plan name.
    InvalidPlan(String),

    /// Unknown billing period.
    InvalidBillingPeriod(String),

    /// No vendor product id is configured for the plan/period pair.
    ProductNotConfigured { plan: String, billing_period: String },

    /// A completion request carried none of the accepted identifiers.
    MissingIdentifier,

    /// The subscription does not exist locally or at the vendor.
    SubscriptionNotFound(String),

    /// The payment does not exist at the vendor.
    PaymentNotFound(String),

    /// The credit purchase does not exist.
    PurchaseNotFound(String),

    /// Vendor metadata names a different user.
    OwnershipMismatch,

    /// Neither metadata user id nor email could be checked.
    OwnershipUnverifiable,

    /// Balance is below what the operation costs.
    InsufficientCredits { required: i64, available: i64 },

    /// The vendor did not answer within the configured timeout.
    VendorTimeout,

    /// The vendor answered with an error.
    VendorFailure { message: String, status: Option<u16> },

    /// Webhook signature verification failed.
    InvalidWebhookSignature,

    /// Invalid state for the requested operation.
    InvalidState { current: String, attempted: String },

    /// Validation failed.
    ValidationFailed { field: String, message: String },

    /// Infrastructure error.
    Infrastructure(String),
}

impl BillingError {
    pub fn invalid_plan(plan: impl Into<String>) -> Self {
        BillingError::InvalidPlan(plan.into())
    }

    pub fn invalid_billing_period(period: impl Into<String>) -> Self {
        BillingError::InvalidBillingPeriod(period.into())
    }

    pub fn product_not_configured(plan: impl Into<String>, billing_period: impl Into<String>) -> Self {
        BillingError::ProductNotConfigured {
            plan: plan.into(),
            billing_period: billing_period.into(),
        }
    }

    pub fn subscription_not_found(id: impl Into<String>) -> Self {
        BillingError::SubscriptionNotFound(id.into())
    }

    pub fn payment_not_found(id: impl Into<String>) -> Self {
        BillingError::PaymentNotFound(id.into())
    }

    pub fn purchase_not_found(id: impl Into<String>) -> Self {
        BillingError::PurchaseNotFound(id.into())
    }

    pub fn insufficient_credits(required: i64, available: i64) -> Self {
        BillingError::InsufficientCredits { required, available }
    }

    pub fn vendor_failure(message: impl Into<String>, status: Option<u16>) -> Self {
        BillingError::VendorFailure {
            message: message.into(),
            status,
        }
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        BillingError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BillingError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        BillingError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BillingError::InvalidPlan(_)
            | BillingError::InvalidBillingPeriod(_)
            | BillingError::MissingIdentifier
            | BillingError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            BillingError::ProductNotConfigured { .. } => ErrorCode::ProductNotConfigured,
            BillingError::SubscriptionNotFound(_) => ErrorCode::SubscriptionNotFound,
            BillingError::PaymentNotFound(_) => ErrorCode::PaymentNotFound,
            BillingError::PurchaseNotFound(_) => ErrorCode::PurchaseNotFound,
            BillingError::OwnershipMismatch | BillingError::OwnershipUnverifiable => {
                ErrorCode::Forbidden
            }
            BillingError::InsufficientCredits { .. } => ErrorCode::InsufficientCredits,
            BillingError::VendorTimeout => ErrorCode::UpstreamTimeout,
            BillingError::VendorFailure { .. } => ErrorCode::PaymentProviderError,
            BillingError::InvalidWebhookSignature => ErrorCode::InvalidWebhookSignature,
            BillingError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            BillingError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-facing error message.
    pub fn message(&self) -> String {
        match self {
            BillingError::InvalidPlan(plan) => format!("Invalid plan: {}", plan),
            BillingError::InvalidBillingPeriod(period) => {
                format!("Invalid billing period: {}", period)
            }
            BillingError::ProductNotConfigured {
                plan,
                billing_period,
            } => format!(
                "No product configured for {} {} plan. Set SHARPII__PAYMENT__PRODUCTS__{}_{}",
                plan,
                billing_period,
                plan.to_ascii_uppercase(),
                billing_period.to_ascii_uppercase()
            ),
            BillingError::MissingIdentifier => {
                "One of subscriptionId, paymentId or sessionId is required".to_string()
            }
            BillingError::SubscriptionNotFound(id) => format!("Subscription not found: {}", id),
            BillingError::PaymentNotFound(id) => format!("Payment not found: {}", id),
            BillingError::PurchaseNotFound(id) => format!("Credit purchase not found: {}", id),
            BillingError::OwnershipMismatch => {
                "Subscription does not belong to the current user".to_string()
            }
            BillingError::OwnershipUnverifiable => {
                "Unable to verify subscription ownership".to_string()
            }
            BillingError::InsufficientCredits {
                required,
                available,
            } => format!(
                "Insufficient credits: {} required, {} available",
                required, available
            ),
            BillingError::VendorTimeout => {
                "Payment provider did not respond in time, please retry".to_string()
            }
            BillingError::VendorFailure { message, .. } => {
                format!("Payment provider error: {}", message)
            }
            BillingError::InvalidWebhookSignature => "Invalid webhook signature".to_string(),
            BillingError::InvalidState { current, attempted } => {
                format!("Cannot {} a subscription that is {}", attempted, current)
            }
            BillingError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            BillingError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for BillingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for BillingError {}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::SubscriptionNotFound => BillingError::SubscriptionNotFound(err.message),
            ErrorCode::PaymentNotFound => BillingError::PaymentNotFound(err.message),
            ErrorCode::PurchaseNotFound => BillingError::PurchaseNotFound(err.message),
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => BillingError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            ErrorCode::InvalidStateTransition => BillingError::InvalidState {
                current: "unknown".to_string(),
                attempted: err.message,
            },
            _ => BillingError::Infrastructure(err.to_string()),
        }
    }
}

impl From<ValidationError> for BillingError {
    fn from(err: ValidationError) -> Self {
        BillingError::validation(err.field(), err.to_string())
    }
}

impl From<BillingError> for DomainError {
    fn from(err: BillingError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ════════════════════════════════════════════════════════════════════════════
    // Codes
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn ownership_errors_are_forbidden() {
        assert_eq!(BillingError::OwnershipMismatch.code(), ErrorCode::Forbidden);
        assert_eq!(BillingError::OwnershipUnverifiable.code(), ErrorCode::Forbidden);
    }

    #[test]
    fn vendor_errors_have_distinct_codes() {
        assert_eq!(BillingError::VendorTimeout.code(), ErrorCode::UpstreamTimeout);
        assert_eq!(
            BillingError::vendor_failure("boom", Some(500)).code(),
            ErrorCode::PaymentProviderError
        );
    }

    #[test]
    fn request_shape_errors_are_validation() {
        assert_eq!(BillingError::MissingIdentifier.code(), ErrorCode::ValidationFailed);
        assert_eq!(BillingError::invalid_plan("gold").code(), ErrorCode::ValidationFailed);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Messages
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn product_not_configured_names_the_setting() {
        let err = BillingError::product_not_configured("creator", "daily");
        assert!(err.message().contains("SHARPII__PAYMENT__PRODUCTS__CREATOR_DAILY"));
    }

    #[test]
    fn insufficient_credits_reports_both_numbers() {
        let err = BillingError::insufficient_credits(10, 3);
        assert_eq!(err.to_string(), "Insufficient credits: 10 required, 3 available");
    }

    #[test]
    fn vendor_failure_carries_upstream_message() {
        let err = BillingError::vendor_failure("card declined", Some(402));
        assert_eq!(err.to_string(), "Payment provider error: card declined");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Conversions
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn domain_validation_error_keeps_field() {
        let err: BillingError = DomainError::validation("limit", "too big").into();
        assert_eq!(err, BillingError::validation("limit", "too big"));
    }

    #[test]
    fn domain_database_error_becomes_infrastructure() {
        let err: BillingError = DomainError::database("connection reset").into();
        assert!(matches!(err, BillingError::Infrastructure(_)));
    }

    #[test]
    fn billing_error_converts_back_to_domain_error() {
        let err: DomainError = BillingError::subscription_not_found("sub_1").into();
        assert_eq!(err.code, ErrorCode::SubscriptionNotFound);
        assert_eq!(err.message, "Subscription not found: sub_1");
    }
}
