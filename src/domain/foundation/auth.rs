//! Caller identity.
//!
//! A request is authenticated either by a Supabase access token or by an
//! application session token. Both resolve to an [`AuthenticatedUser`].

use super::UserId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    /// Fallback ownership key when vendor metadata has no user id.
    pub email: String,
    pub display_name: Option<String>,
}

impl AuthenticatedUser {
    pub fn new(id: UserId, email: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            id,
            email: email.into(),
            display_name,
        }
    }

    /// Compares against a vendor-supplied email, ignoring case and
    /// surrounding whitespace. A caller without an email owns nothing.
    pub fn email_matches(&self, candidate: &str) -> bool {
        if self.email.is_empty() {
            return false;
        }
        self.email.eq_ignore_ascii_case(candidate.trim())
    }
}

/// Why a credential was not accepted.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    /// The credential verified but names no usable account.
    #[error("User not found")]
    UserNotFound,

    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }
}
