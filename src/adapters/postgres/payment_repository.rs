//! PostgreSQL implementation of PaymentRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{BillingPeriod, PaymentRecord, Plan};
use crate::domain::foundation::{DomainError, PaymentId, Timestamp, UserId};
use crate::ports::{PaymentRepository, SaveResult};

pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    user_id: String,
    vendor_payment_id: String,
    vendor_subscription_id: Option<String>,
    amount_cents: i64,
    currency: String,
    status: String,
    plan: Option<String>,
    billing_period: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for PaymentRecord {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(PaymentRecord {
            id: PaymentId::from_uuid(row.id),
            user_id: UserId::new(row.user_id)
                .map_err(|e| DomainError::database(format!("Invalid user_id: {}", e)))?,
            vendor_payment_id: row.vendor_payment_id,
            vendor_subscription_id: row.vendor_subscription_id,
            amount_cents: row.amount_cents,
            currency: row.currency,
            status: row.status,
            plan: row.plan.map(|p| p.parse::<Plan>()).transpose()?,
            billing_period: row
                .billing_period
                .map(|p| p.parse::<BillingPeriod>())
                .transpose()?,
            paid_at: row.paid_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn insert_if_absent(&self, payment: &PaymentRecord) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, vendor_payment_id, vendor_subscription_id, amount_cents,
                currency, status, plan, billing_period, paid_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (vendor_payment_id) DO NOTHING
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.user_id.as_str())
        .bind(&payment.vendor_payment_id)
        .bind(payment.vendor_subscription_id.as_deref())
        .bind(payment.amount_cents)
        .bind(&payment.currency)
        .bind(&payment.status)
        .bind(payment.plan.map(|p| p.as_str()))
        .bind(payment.billing_period.map(|p| p.as_str()))
        .bind(payment.paid_at.map(|t| *t.as_datetime()))
        .bind(payment.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to record payment: {}", e)))?;

        Ok(if result.rows_affected() == 0 {
            SaveResult::AlreadyExists
        } else {
            SaveResult::Inserted
        })
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<PaymentRecord>, DomainError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, vendor_payment_id, vendor_subscription_id, amount_cents,
                   currency, status, plan, billing_period, paid_at, created_at
            FROM payments
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load payments: {}", e)))?;

        rows.into_iter().map(PaymentRecord::try_from).collect()
    }
}
