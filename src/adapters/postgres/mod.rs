//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! Tables are created by `migrations/0001_initial.sql`.

mod checkout_session_repository;
mod credit_purchase_repository;
mod credit_repository;
mod payment_repository;
mod subscription_repository;
mod task_repository;
mod webhook_event_repository;

pub use checkout_session_repository::PostgresCheckoutSessionRepository;
pub use credit_purchase_repository::PostgresCreditPurchaseRepository;
pub use credit_repository::PostgresCreditRepository;
pub use payment_repository::PostgresPaymentRepository;
pub use subscription_repository::PostgresSubscriptionRepository;
pub use task_repository::PostgresTaskRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;

/// Open a connection pool from configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let mut options = PgConnectOptions::from_str(config.url.trim())?;
    if config.uses_transaction_pooler() {
        options = options.statement_cache_capacity(0);
    }

    PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .connect_with(options)
        .await
}
