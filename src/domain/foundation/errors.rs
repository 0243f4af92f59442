//! Shared error vocabulary.
//!
//! [`ValidationError`] comes out of value-object constructors.
//! [`DomainError`] is what repositories and other ports return; each
//! bounded context folds it into its own error enum.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: impl Into<String>) -> Self {
        Self::EmptyField { field: field.into() }
    }

    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        Self::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::EmptyField { field }
            | Self::OutOfRange { field, .. }
            | Self::InvalidFormat { field, .. } => field,
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            Self::EmptyField { .. } => ErrorCode::EmptyField,
            Self::OutOfRange { .. } => ErrorCode::OutOfRange,
            Self::InvalidFormat { .. } => ErrorCode::InvalidFormat,
        }
    }
}

/// Machine-readable error codes, rendered in SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ValidationFailed,
    EmptyField,
    OutOfRange,
    InvalidFormat,

    SubscriptionNotFound,
    PaymentNotFound,
    PurchaseNotFound,
    TaskNotFound,

    InvalidStateTransition,
    InsufficientCredits,
    ProductNotConfigured,

    Unauthorized,
    Forbidden,
    InvalidWebhookSignature,

    PaymentProviderError,
    EnhancementProviderError,
    UpstreamTimeout,

    DatabaseError,
    InternalError,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::EmptyField => "EMPTY_FIELD",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
            Self::PaymentNotFound => "PAYMENT_NOT_FOUND",
            Self::PurchaseNotFound => "PURCHASE_NOT_FOUND",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            Self::InsufficientCredits => "INSUFFICIENT_CREDITS",
            Self::ProductNotConfigured => "PRODUCT_NOT_CONFIGURED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::InvalidWebhookSignature => "INVALID_WEBHOOK_SIGNATURE",
            Self::PaymentProviderError => "PAYMENT_PROVIDER_ERROR",
            Self::EnhancementProviderError => "ENHANCEMENT_PROVIDER_ERROR",
            Self::UpstreamTimeout => "UPSTREAM_TIMEOUT",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Port-level failure: a code, a human message and string details.
#[derive(Debug, Clone, Error)]
#[error("[{code}] {message}")]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: BTreeMap<String, String>,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    /// `ValidationFailed` with the offending field under `details["field"]`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message).with_detail("field", field)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        let field = err.field().to_string();
        Self::new(err.code(), err.to_string()).with_detail("field", field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_names_bounds_and_value() {
        let err = ValidationError::out_of_range("limit", 1, 50, 80);
        assert_eq!(err.to_string(), "Field 'limit' must be between 1 and 50, got 80");
        assert_eq!(err.field(), "limit");
    }

    #[test]
    fn domain_error_renders_code_prefix() {
        let err = DomainError::new(ErrorCode::TaskNotFound, "Task not found");
        assert_eq!(err.to_string(), "[TASK_NOT_FOUND] Task not found");
    }

    #[test]
    fn validation_helper_records_field() {
        let err = DomainError::validation("billingPeriod", "Unknown billing period");
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.details.get("field").map(String::as_str), Some("billingPeriod"));
    }

    #[test]
    fn converted_validation_error_keeps_code_and_field() {
        let err: DomainError = ValidationError::invalid_format("returnUrl", "must be http(s)").into();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
        assert_eq!(err.details.get("field").map(String::as_str), Some("returnUrl"));
    }

    #[test]
    fn codes_render_screaming_snake() {
        assert_eq!(ErrorCode::InsufficientCredits.to_string(), "INSUFFICIENT_CREDITS");
        assert_eq!(ErrorCode::UpstreamTimeout.as_str(), "UPSTREAM_TIMEOUT");
    }
}
