//! Vendor product lookup.

use std::collections::HashMap;

use crate::config::PaymentConfig;
use crate::domain::billing::{BillingError, BillingPeriod, PackageType, Plan};

/// Maps plans and credit packages to vendor product ids.
///
/// Subscription products are keyed `<plan>_<period>`, credit products by
/// package type. The `custom` credit product is sold per whole dollar.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    subscriptions: HashMap<String, String>,
    credits: HashMap<String, String>,
}

impl ProductCatalog {
    pub fn new(subscriptions: HashMap<String, String>, credits: HashMap<String, String>) -> Self {
        let normalize = |map: HashMap<String, String>| {
            map.into_iter()
                .filter(|(_, id)| !id.trim().is_empty())
                .map(|(key, id)| (key.to_ascii_lowercase(), id.trim().to_string()))
                .collect()
        };
        Self {
            subscriptions: normalize(subscriptions),
            credits: normalize(credits),
        }
    }

    /// Product id for a plan/period pair.
    pub fn subscription_product(
        &self,
        plan: Plan,
        period: BillingPeriod,
    ) -> Result<&str, BillingError> {
        self.subscriptions
            .get(&plan.product_key(period))
            .map(String::as_str)
            .ok_or_else(|| BillingError::product_not_configured(plan.as_str(), period.as_str()))
    }

    /// Reverse lookup from a vendor product id to the plan it sells.
    pub fn plan_for_product(&self, product_id: &str) -> Option<(Plan, BillingPeriod)> {
        self.subscriptions
            .iter()
            .find(|(_, id)| id.as_str() == product_id)
            .and_then(|(key, _)| Plan::from_product_key(key))
    }

    /// Product id for a credit package.
    pub fn credit_product(&self, package: PackageType) -> Result<&str, BillingError> {
        self.credits
            .get(package.as_str())
            .map(String::as_str)
            .ok_or_else(|| {
                BillingError::validation(
                    "packageType",
                    format!(
                        "No product configured for the {} credit package. Set SHARPII__PAYMENT__CREDIT_PRODUCTS__{}",
                        package,
                        package.as_str().to_ascii_uppercase()
                    ),
                )
            })
    }
}

/// Plan and period from checkout metadata (`plan`, `billing_period`).
pub(crate) fn plan_from_metadata(
    metadata: &HashMap<String, String>,
) -> Option<(Plan, BillingPeriod)> {
    let plan = metadata.get("plan")?.parse().ok()?;
    let period = metadata.get("billing_period")?.parse().ok()?;
    Some((plan, period))
}

impl From<&PaymentConfig> for ProductCatalog {
    fn from(config: &PaymentConfig) -> Self {
        Self::new(config.products.clone(), config.credit_products.clone())
    }
}
