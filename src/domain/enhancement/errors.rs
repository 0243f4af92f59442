//! Enhancement task error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | ValidationFailed / UnknownModel / InvalidImageUrl | 400 |
//! | InsufficientCredits | 402 |
//! | NotFound | 404 |
//! | InvalidState | 409 |
//! | Provider | 502 |
//! | Infrastructure | 500 |

use crate::domain::billing::BillingError;
use crate::domain::foundation::{DomainError, ErrorCode, TaskId, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task does not exist or belongs to someone else.
    NotFound(TaskId),

    /// Model id is not in the catalog.
    UnknownModel(String),

    /// Source image URL is not an absolute http(s) URL.
    InvalidImageUrl(String),

    /// Balance does not cover the model's cost.
    InsufficientCredits { required: i64, available: i64 },

    /// Transition not allowed from the current status.
    InvalidState { current: String, attempted: String },

    /// The inference provider rejected or failed the request.
    Provider(String),

    ValidationFailed { field: String, message: String },

    Infrastructure(String),
}

impl TaskError {
    pub fn not_found(id: TaskId) -> Self {
        TaskError::NotFound(id)
    }

    pub fn unknown_model(model: impl Into<String>) -> Self {
        TaskError::UnknownModel(model.into())
    }

    pub fn invalid_image_url(url: impl Into<String>) -> Self {
        TaskError::InvalidImageUrl(url.into())
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        TaskError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn provider(message: impl Into<String>) -> Self {
        TaskError::Provider(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        TaskError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        TaskError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            TaskError::NotFound(_) => ErrorCode::TaskNotFound,
            TaskError::UnknownModel(_)
            | TaskError::InvalidImageUrl(_)
            | TaskError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            TaskError::InsufficientCredits { .. } => ErrorCode::InsufficientCredits,
            TaskError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            TaskError::Provider(_) => ErrorCode::EnhancementProviderError,
            TaskError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            TaskError::NotFound(id) => format!("Task not found: {}", id),
            TaskError::UnknownModel(model) => format!("Unknown enhancement model: {}", model),
            TaskError::InvalidImageUrl(url) => format!("Invalid image URL: {}", url),
            TaskError::InsufficientCredits {
                required,
                available,
            } => format!(
                "Insufficient credits: {} required, {} available",
                required, available
            ),
            TaskError::InvalidState { current, attempted } => {
                format!("Cannot move task from {} to {}", current, attempted)
            }
            TaskError::Provider(msg) => format!("Enhancement provider error: {}", msg),
            TaskError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            TaskError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for TaskError {}

impl From<DomainError> for TaskError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => TaskError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            ErrorCode::EnhancementProviderError => TaskError::Provider(err.message),
            _ => TaskError::Infrastructure(err.to_string()),
        }
    }
}

impl From<BillingError> for TaskError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::InsufficientCredits {
                required,
                available,
            } => TaskError::InsufficientCredits {
                required,
                available,
            },
            BillingError::ValidationFailed { field, message } => {
                TaskError::ValidationFailed { field, message }
            }
            other => TaskError::Infrastructure(other.message()),
        }
    }
}

impl From<ValidationError> for TaskError {
    fn from(err: ValidationError) -> Self {
        TaskError::validation(err.field(), err.to_string())
    }
}

impl From<TaskError> for DomainError {
    fn from(err: TaskError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
