//! PostgreSQL implementation of CheckoutSessionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::billing::{BillingPeriod, Plan};
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::{CheckoutSessionRecord, CheckoutSessionRepository};

pub struct PostgresCheckoutSessionRepository {
    pool: PgPool,
}

impl PostgresCheckoutSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CheckoutSessionRow {
    session_id: String,
    user_id: String,
    plan: String,
    billing_period: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CheckoutSessionRow> for CheckoutSessionRecord {
    type Error = DomainError;

    fn try_from(row: CheckoutSessionRow) -> Result<Self, Self::Error> {
        Ok(CheckoutSessionRecord {
            session_id: row.session_id,
            user_id: UserId::new(row.user_id)
                .map_err(|e| DomainError::database(format!("Invalid user_id: {}", e)))?,
            plan: row.plan.parse::<Plan>()?,
            billing_period: row.billing_period.parse::<BillingPeriod>()?,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl CheckoutSessionRepository for PostgresCheckoutSessionRepository {
    async fn save(&self, record: &CheckoutSessionRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO checkout_sessions (session_id, user_id, plan, billing_period, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (session_id) DO NOTHING
            "#,
        )
        .bind(&record.session_id)
        .bind(record.user_id.as_str())
        .bind(record.plan.as_str())
        .bind(record.billing_period.as_str())
        .bind(record.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save checkout session: {}", e)))?;
        Ok(())
    }

    async fn find(&self, session_id: &str) -> Result<Option<CheckoutSessionRecord>, DomainError> {
        let row: Option<CheckoutSessionRow> = sqlx::query_as(
            r#"
            SELECT session_id, user_id, plan, billing_period, created_at
            FROM checkout_sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load checkout session: {}", e)))?;

        row.map(CheckoutSessionRecord::try_from).transpose()
    }
}
