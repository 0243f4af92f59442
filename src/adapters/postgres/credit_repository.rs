//! PostgreSQL implementation of CreditRepository.
//!
//! `credit_transactions.idempotency_key` is UNIQUE; inserts use
//! `ON CONFLICT DO NOTHING` so concurrent writers cannot double-credit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{CreditBalance, CreditReason, CreditTransaction, TransactionKind};
use crate::domain::foundation::{DomainError, Timestamp, TransactionId, UserId};
use crate::ports::{CreditRepository, SaveResult};

pub struct PostgresCreditRepository {
    pool: PgPool,
}

impl PostgresCreditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CreditTransactionRow {
    id: Uuid,
    user_id: String,
    amount: i64,
    #[sqlx(rename = "type")]
    kind: String,
    reason: String,
    description: String,
    expires_at: Option<DateTime<Utc>>,
    idempotency_key: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CreditTransactionRow> for CreditTransaction {
    type Error = DomainError;

    fn try_from(row: CreditTransactionRow) -> Result<Self, Self::Error> {
        Ok(CreditTransaction {
            id: TransactionId::from_uuid(row.id),
            user_id: UserId::new(row.user_id)
                .map_err(|e| DomainError::database(format!("Invalid user_id: {}", e)))?,
            amount: row.amount,
            kind: row.kind.parse::<TransactionKind>()?,
            reason: row.reason.parse::<CreditReason>()?,
            description: row.description,
            expires_at: row.expires_at.map(Timestamp::from_datetime),
            idempotency_key: row.idempotency_key,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BalanceRow {
    subscription: i64,
    purchased: i64,
    debited: i64,
}

#[async_trait]
impl CreditRepository for PostgresCreditRepository {
    async fn record(&self, transaction: &CreditTransaction) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO credit_transactions (
                id, user_id, amount, type, reason, description,
                expires_at, idempotency_key, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (idempotency_key) DO NOTHING
            "#,
        )
        .bind(transaction.id.as_uuid())
        .bind(transaction.user_id.as_str())
        .bind(transaction.amount)
        .bind(transaction.kind.as_str())
        .bind(transaction.reason.as_str())
        .bind(&transaction.description)
        .bind(transaction.expires_at.map(|t| *t.as_datetime()))
        .bind(transaction.idempotency_key.as_deref())
        .bind(transaction.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to record credit transaction: {}", e)))?;

        Ok(if result.rows_affected() == 0 {
            SaveResult::AlreadyExists
        } else {
            SaveResult::Inserted
        })
    }

    async fn balance(&self, user_id: &UserId, now: Timestamp) -> Result<CreditBalance, DomainError> {
        let row: BalanceRow = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(amount) FILTER (
                    WHERE type = 'credit' AND amount > 0 AND reason = 'subscription'
                      AND (expires_at IS NULL OR expires_at > $2)
                ), 0)::BIGINT AS subscription,
                COALESCE(SUM(amount) FILTER (
                    WHERE type = 'credit' AND amount > 0 AND reason <> 'subscription'
                      AND (expires_at IS NULL OR expires_at > $2)
                ), 0)::BIGINT AS purchased,
                COALESCE(SUM(ABS(amount)) FILTER (WHERE type = 'debit'), 0)::BIGINT AS debited
            FROM credit_transactions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .bind(now.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to compute balance: {}", e)))?;

        Ok(CreditBalance::from_parts(row.subscription, row.purchased, row.debited))
    }

    async fn recent(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<CreditTransaction>, DomainError> {
        let rows: Vec<CreditTransactionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, amount, type, reason, description,
                   expires_at, idempotency_key, created_at
            FROM credit_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load credit history: {}", e)))?;

        rows.into_iter().map(CreditTransaction::try_from).collect()
    }
}
