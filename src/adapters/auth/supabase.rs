//! Supabase access token validator.
//!
//! Supabase signs access tokens with the project's JWT secret (HS256).
//! Validation is local; no round trip to the auth server.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Supabase JWT validation settings.
#[derive(Clone)]
pub struct SupabaseJwtConfig {
    secret: SecretString,
    audience: String,
}

impl SupabaseJwtConfig {
    pub fn new(secret: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
            audience: audience.into(),
        }
    }
}

/// Claims carried by Supabase access tokens.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SupabaseClaims {
    /// Subject - the auth user id
    pub sub: String,

    pub exp: i64,

    #[serde(default)]
    pub aud: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub user_metadata: Option<UserMetadata>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct UserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Validates Supabase access tokens.
pub struct SupabaseJwtValidator {
    config: SupabaseJwtConfig,
}

impl SupabaseJwtValidator {
    pub fn new(config: SupabaseJwtConfig) -> Self {
        Self { config }
    }

    fn decode_claims(&self, token: &str) -> Result<SupabaseClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_required_spec_claims(&["exp", "sub"]);

        let key = DecodingKey::from_secret(self.config.secret.expose_secret().as_bytes());

        decode::<SupabaseClaims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        tracing::debug!("Token expired");
                        AuthError::TokenExpired
                    }
                    ErrorKind::InvalidAudience => {
                        tracing::warn!("Invalid audience in token");
                        AuthError::InvalidToken
                    }
                    _ => {
                        tracing::debug!("Token validation failed: {}", e);
                        AuthError::InvalidToken
                    }
                }
            })
    }
}

#[async_trait]
impl SessionValidator for SupabaseJwtValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.decode_claims(token)?;

        let user_id = UserId::new(&claims.sub).map_err(|_| {
            tracing::warn!("Invalid user ID in token: {}", claims.sub);
            AuthError::InvalidToken
        })?;

        let display_name = claims
            .user_metadata
            .and_then(|meta| meta.full_name.or(meta.name));

        Ok(AuthenticatedUser::new(
            user_id,
            claims.email.unwrap_or_default(),
            display_name,
        ))
    }
}

impl std::fmt::Debug for SupabaseJwtValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseJwtValidator")
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}
