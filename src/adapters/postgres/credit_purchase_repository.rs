//! PostgreSQL implementation of CreditPurchaseRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{CreditPurchase, PackageType, PurchaseStatus};
use crate::domain::foundation::{DomainError, ErrorCode, PurchaseId, Timestamp, UserId};
use crate::ports::CreditPurchaseRepository;

pub struct PostgresCreditPurchaseRepository {
    pool: PgPool,
}

impl PostgresCreditPurchaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str = "id, user_id, package_type, credits, amount_cents, status, \
                       checkout_session_id, checkout_url, vendor_payment_id, created_at, completed_at";

#[derive(Debug, sqlx::FromRow)]
struct CreditPurchaseRow {
    id: Uuid,
    user_id: String,
    package_type: String,
    credits: i64,
    amount_cents: i64,
    status: String,
    checkout_session_id: Option<String>,
    checkout_url: Option<String>,
    vendor_payment_id: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<CreditPurchaseRow> for CreditPurchase {
    type Error = DomainError;

    fn try_from(row: CreditPurchaseRow) -> Result<Self, Self::Error> {
        Ok(CreditPurchase {
            id: PurchaseId::from_uuid(row.id),
            user_id: UserId::new(row.user_id)
                .map_err(|e| DomainError::database(format!("Invalid user_id: {}", e)))?,
            package_type: row.package_type.parse::<PackageType>()?,
            credits: row.credits,
            amount_cents: row.amount_cents,
            status: row.status.parse::<PurchaseStatus>()?,
            checkout_session_id: row.checkout_session_id,
            checkout_url: row.checkout_url,
            vendor_payment_id: row.vendor_payment_id,
            created_at: Timestamp::from_datetime(row.created_at),
            completed_at: row.completed_at.map(Timestamp::from_datetime),
        })
    }
}

#[async_trait]
impl CreditPurchaseRepository for PostgresCreditPurchaseRepository {
    async fn create(&self, purchase: &CreditPurchase) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "INSERT INTO credit_purchases ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            COLUMNS
        ))
        .bind(purchase.id.as_uuid())
        .bind(purchase.user_id.as_str())
        .bind(purchase.package_type.as_str())
        .bind(purchase.credits)
        .bind(purchase.amount_cents)
        .bind(purchase.status.as_str())
        .bind(purchase.checkout_session_id.as_deref())
        .bind(purchase.checkout_url.as_deref())
        .bind(purchase.vendor_payment_id.as_deref())
        .bind(purchase.created_at.as_datetime())
        .bind(purchase.completed_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to create purchase: {}", e)))?;
        Ok(())
    }

    async fn update(&self, purchase: &CreditPurchase) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE credit_purchases SET
                status = $2,
                checkout_session_id = $3,
                checkout_url = $4,
                vendor_payment_id = $5,
                completed_at = $6
            WHERE id = $1
            "#,
        )
        .bind(purchase.id.as_uuid())
        .bind(purchase.status.as_str())
        .bind(purchase.checkout_session_id.as_deref())
        .bind(purchase.checkout_url.as_deref())
        .bind(purchase.vendor_payment_id.as_deref())
        .bind(purchase.completed_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update purchase: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::PurchaseNotFound,
                format!("Purchase {} not found", purchase.id),
            ));
        }
        Ok(())
    }

    async fn find(&self, id: &PurchaseId) -> Result<Option<CreditPurchase>, DomainError> {
        let row: Option<CreditPurchaseRow> = sqlx::query_as(&format!(
            "SELECT {} FROM credit_purchases WHERE id = $1",
            COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load purchase: {}", e)))?;

        row.map(CreditPurchase::try_from).transpose()
    }

    async fn find_by_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CreditPurchase>, DomainError> {
        let row: Option<CreditPurchaseRow> = sqlx::query_as(&format!(
            "SELECT {} FROM credit_purchases WHERE checkout_session_id = $1",
            COLUMNS
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load purchase: {}", e)))?;

        row.map(CreditPurchase::try_from).transpose()
    }
}
