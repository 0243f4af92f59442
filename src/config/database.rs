//! Postgres pool settings.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

const MAX_POOL_SIZE: u32 = 100;

/// Port of Supabase's transaction-mode pooler.
const SUPABASE_TRANSACTION_POOLER_PORT: &str = ":6543";

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres://` or `postgresql://` URL of the Supabase database.
    pub url: String,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Apply `migrations/` before serving.
    #[serde(default)]
    pub run_migrations: bool,

    /// Disable prepared-statement caching. Inferred from the URL when unset.
    pub transaction_pooler: Option<bool>,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Transaction poolers hand each statement to a different backend, so
    /// server-side prepared statements cannot be reused.
    pub fn uses_transaction_pooler(&self) -> bool {
        self.transaction_pooler
            .unwrap_or_else(|| self.url.contains(SUPABASE_TRANSACTION_POOLER_PORT))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ValidationError::MissingRequired("DATABASE__URL"));
        }
        if !["postgres://", "postgresql://"]
            .iter()
            .any(|scheme| url.starts_with(scheme))
        {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        match (self.min_connections, self.max_connections) {
            (_, max) if max > MAX_POOL_SIZE => Err(ValidationError::PoolSizeTooLarge),
            (min, max) if min > max => Err(ValidationError::InvalidPoolSize),
            _ => Ok(()),
        }
    }
}

fn default_min_connections() -> u32 {
    1
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    300
}
