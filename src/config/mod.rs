//! Service configuration.
//!
//! Everything comes from `SHARPII__<SECTION>__<KEY>` environment variables,
//! with a `.env` file loaded first in development. Map-valued settings nest
//! one level further: `SHARPII__PAYMENT__PRODUCTS__CREATOR_MONTHLY=pdt_...`
//! becomes `payment.products["creator_monthly"]`.
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! let config = sharpii::config::AppConfig::load()?;
//! config.validate()?;
//! # Ok(())
//! # }
//! ```

mod ai;
mod auth;
mod database;
mod error;
mod payment;
mod server;

pub use ai::AiConfig;
pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::{PaymentConfig, PaymentMode};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

const ENV_PREFIX: &str = "SHARPII";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Supabase Postgres.
    pub database: DatabaseConfig,

    pub auth: AuthConfig,

    /// Replicate and RunningHub.
    #[serde(default)]
    pub ai: AiConfig,

    /// Dodo Payments credentials and product ids.
    pub payment: PaymentConfig,
}

impl AppConfig {
    /// Reads `.env` (if present) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_source(None)
    }

    /// Builds configuration from an explicit variable set instead of the
    /// process environment.
    pub fn from_vars<'a>(
        vars: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ConfigError> {
        let vars = vars
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Self::from_source(Some(vars))
    }

    fn from_source(vars: Option<config::Map<String, String>>) -> Result<Self, ConfigError> {
        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .source(vars);

        Ok(config::Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()?)
    }

    /// Semantic checks that deserialization cannot express.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.ai.validate()?;
        self.payment.validate()?;

        // The router deadline must outlast the vendor checkout race,
        // otherwise callers see a generic timeout instead of a 408.
        if self.payment.checkout_timeout() >= self.server.request_timeout() {
            return Err(ValidationError::InvalidCheckoutTimeout);
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
