//! Caller resolution for the HTTP layer.
//!
//! [`auth_middleware`] looks for a credential, resolves it through the
//! [`SessionValidator`] port and stores the [`AuthenticatedUser`] in the
//! request extensions. Handlers that need a caller take [`RequireAuth`].
//!
//! Credentials are read in this order, first non-empty wins:
//!
//! 1. `Authorization: Bearer <token>`
//! 2. the Supabase access token cookie
//! 3. the application session cookie
//!
//! A request without any credential passes through untouched, so public
//! routes share the same layer.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::adapters::http::error::{unauthorized, ErrorResponse};
use crate::config::AuthConfig;
use crate::domain::foundation::{AuthError, AuthenticatedUser};
use crate::ports::SessionValidator;

/// Auth middleware state: the validator plus the cookies to look in.
#[derive(Clone)]
pub struct AuthState {
    validator: Arc<dyn SessionValidator>,
    cookie_names: Vec<String>,
}

impl AuthState {
    pub fn new(validator: Arc<dyn SessionValidator>, cookie_names: Vec<String>) -> Self {
        Self {
            validator,
            cookie_names,
        }
    }

    /// Access token cookie first, then the session cookie.
    pub fn from_config(validator: Arc<dyn SessionValidator>, config: &AuthConfig) -> Self {
        Self::new(
            validator,
            vec![
                config.access_token_cookie_name.clone(),
                config.session_cookie_name.clone(),
            ],
        )
    }

    /// Finds the caller's credential in the request headers.
    pub fn credential(&self, headers: &HeaderMap) -> Option<String> {
        let bearer = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());
        if let Some(token) = bearer {
            return Some(token.to_string());
        }

        let jar = CookieJar::from_headers(headers);
        self.cookie_names
            .iter()
            .filter_map(|name| jar.get(name))
            .map(|cookie| cookie.value().trim())
            .find(|value| !value.is_empty())
            .map(str::to_string)
    }
}

/// Resolves the caller, if any.
///
/// A credential that fails validation is a 401 here rather than an
/// anonymous request; an unreachable auth backend is a 500.
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = auth.credential(request.headers()) else {
        return next.run(request).await;
    };

    match auth.validator.validate(&token).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(AuthError::ServiceUnavailable(msg)) => {
            tracing::error!(error = %msg, "Auth service unavailable");
            ErrorResponse::new("INTERNAL_ERROR", "Authentication service unavailable")
                .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(AuthError::TokenExpired) => unauthorized("Session expired"),
        Err(e) => {
            tracing::debug!(error = %e, "Rejected credential");
            unauthorized("Invalid session")
        }
    }
}

/// The resolved caller; rejects with 401 when there is none.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(RequireAuth)
            .ok_or(AuthRejection::Unauthenticated)
    }
}

/// Rejection type for authentication failures.
#[derive(Debug, Clone)]
pub enum AuthRejection {
    /// No valid credential was provided.
    Unauthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Unauthenticated => unauthorized("Authentication required"),
        }
    }
}
