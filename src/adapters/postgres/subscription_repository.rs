//! PostgreSQL implementation of SubscriptionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{BillingPeriod, Plan, Subscription, SubscriptionStatus};
use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp, UserId};
use crate::ports::SubscriptionRepository;

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str = "id, user_id, plan, billing_period, status, vendor_subscription_id, \
                       next_billing_date, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: String,
    plan: String,
    billing_period: String,
    status: String,
    vendor_subscription_id: Option<String>,
    next_billing_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: UserId::new(row.user_id)
                .map_err(|e| DomainError::database(format!("Invalid user_id: {}", e)))?,
            plan: row.plan.parse::<Plan>()?,
            billing_period: row.billing_period.parse::<BillingPeriod>()?,
            status: row.status.parse::<SubscriptionStatus>()?,
            vendor_subscription_id: row.vendor_subscription_id,
            next_billing_date: row.next_billing_date.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn upsert(&self, subscription: &Subscription) -> Result<Subscription, DomainError> {
        let row: SubscriptionRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO subscriptions (
                id, user_id, plan, billing_period, status, vendor_subscription_id,
                next_billing_date, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id) DO UPDATE SET
                plan = EXCLUDED.plan,
                billing_period = EXCLUDED.billing_period,
                status = EXCLUDED.status,
                vendor_subscription_id = EXCLUDED.vendor_subscription_id,
                next_billing_date = EXCLUDED.next_billing_date,
                updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(subscription.id.as_uuid())
        .bind(subscription.user_id.as_str())
        .bind(subscription.plan.as_str())
        .bind(subscription.billing_period.as_str())
        .bind(subscription.status.as_str())
        .bind(subscription.vendor_subscription_id.as_deref())
        .bind(subscription.next_billing_date.map(|t| *t.as_datetime()))
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to upsert subscription: {}", e)))?;

        row.try_into()
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE user_id = $1",
            COLUMNS
        ))
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load subscription: {}", e)))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_by_vendor_id(
        &self,
        vendor_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE vendor_subscription_id = $1",
            COLUMNS
        ))
        .bind(vendor_subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load subscription: {}", e)))?;

        row.map(Subscription::try_from).transpose()
    }
}
