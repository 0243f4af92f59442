//! Session validation port.
//!
//! Resolves the caller behind a bearer token or session cookie. Two
//! credential shapes exist: Supabase access tokens (JWT) and opaque
//! application session tokens. Middleware does not care which one it holds.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates a credential and returns the caller.
///
/// # Contract
///
/// - `AuthError::InvalidToken` for malformed, unknown or badly signed tokens
/// - `AuthError::TokenExpired` for expired tokens
/// - `AuthError::ServiceUnavailable` for transient backend errors
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// `token` is the raw credential without any `Bearer ` prefix.
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
