//! Application session validator backed by PostgreSQL.
//!
//! Session tokens are opaque. Only their SHA-256 digest is stored, so a
//! leaked `sessions` table cannot be replayed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Looks up opaque session tokens in the `sessions` table.
pub struct PostgresSessionValidator {
    pool: PgPool,
}

impl PostgresSessionValidator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    user_id: String,
    email: String,
    display_name: Option<String>,
    expires_at: DateTime<Utc>,
}

/// Hex SHA-256 digest of a session token.
pub fn hash_session_token(token: &str) -> String {
    Sha256::digest(token.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[async_trait]
impl SessionValidator for PostgresSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT s.user_id, u.email, u.display_name, s.expires_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = $1 AND s.revoked_at IS NULL
            "#,
        )
        .bind(hash_session_token(token))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Session lookup failed");
            AuthError::service_unavailable(e.to_string())
        })?;

        let row = row.ok_or(AuthError::InvalidToken)?;

        if row.expires_at <= Utc::now() {
            return Err(AuthError::TokenExpired);
        }

        let user_id = UserId::new(row.user_id).map_err(|_| AuthError::UserNotFound)?;
        Ok(AuthenticatedUser::new(user_id, row.email, row.display_name))
    }
}
