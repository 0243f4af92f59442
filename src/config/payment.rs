//! Payment configuration

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::domain::billing::Plan;

use super::error::ValidationError;

/// Payment configuration (Dodo Payments)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Dodo Payments API key
    pub dodo_api_key: String,

    /// Standard Webhooks signing secret (`whsec_...`)
    pub dodo_webhook_secret: String,

    /// Which Dodo environment to talk to
    #[serde(default)]
    pub mode: PaymentMode,

    /// Overrides the base URL derived from `mode`
    pub base_url: Option<String>,

    /// Seconds to wait for the vendor when creating a checkout
    #[serde(default = "default_checkout_timeout")]
    pub checkout_timeout_secs: u64,

    /// Subscription product ids keyed `<plan>_<period>`,
    /// e.g. `SHARPII__PAYMENT__PRODUCTS__CREATOR_MONTHLY`
    #[serde(default)]
    pub products: HashMap<String, String>,

    /// One-time credit package product ids keyed by package type,
    /// e.g. `SHARPII__PAYMENT__CREDIT_PRODUCTS__STARTER`
    #[serde(default)]
    pub credit_products: HashMap<String, String>,
}

/// Dodo Payments environment
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    #[default]
    Test,
    Live,
}

impl PaymentConfig {
    /// API base URL for the configured mode.
    pub fn api_base_url(&self) -> String {
        match &self.base_url {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => match self.mode {
                PaymentMode::Test => "https://test.dodopayments.com".to_string(),
                PaymentMode::Live => "https://live.dodopayments.com".to_string(),
            },
        }
    }

    pub fn checkout_timeout(&self) -> Duration {
        Duration::from_secs(self.checkout_timeout_secs)
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.dodo_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__DODO_API_KEY"));
        }
        if self.dodo_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__DODO_WEBHOOK_SECRET"));
        }
        if !self.dodo_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidWebhookSecret);
        }
        if self.checkout_timeout_secs == 0 || self.checkout_timeout_secs > 120 {
            return Err(ValidationError::InvalidCheckoutTimeout);
        }
        if let Some(key) = self
            .products
            .keys()
            .find(|key| Plan::from_product_key(key).is_none())
        {
            return Err(ValidationError::InvalidProductKey(key.clone()));
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            dodo_api_key: String::new(),
            dodo_webhook_secret: String::new(),
            mode: PaymentMode::default(),
            base_url: None,
            checkout_timeout_secs: default_checkout_timeout(),
            products: HashMap::new(),
            credit_products: HashMap::new(),
        }
    }
}

fn default_checkout_timeout() -> u64 {
    15
}
