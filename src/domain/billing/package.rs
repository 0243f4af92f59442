//! One-time credit packages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::BillingError;

/// Credits per whole US dollar for custom amounts.
pub const CUSTOM_CREDITS_PER_DOLLAR: i64 = 50;
pub const CUSTOM_MIN_DOLLARS: i64 = 5;
pub const CUSTOM_MAX_DOLLARS: i64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    Starter,
    Popular,
    Pro,
    Custom,
}

impl PackageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::Starter => "starter",
            PackageType::Popular => "popular",
            PackageType::Pro => "pro",
            PackageType::Custom => "custom",
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PackageType {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "starter" => Ok(PackageType::Starter),
            "popular" => Ok(PackageType::Popular),
            "pro" => Ok(PackageType::Pro),
            "custom" => Ok(PackageType::Custom),
            other => Err(BillingError::validation(
                "packageType",
                format!("Unknown credit package: {}", other),
            )),
        }
    }
}

/// A purchasable bundle of credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditPackage {
    pub package_type: PackageType,
    pub name: String,
    pub credits: i64,
    pub price_cents: i64,
    pub popular: bool,
}

impl CreditPackage {
    /// The fixed catalog, cheapest first.
    pub fn catalog() -> Vec<CreditPackage> {
        vec![
            CreditPackage {
                package_type: PackageType::Starter,
                name: "Starter".to_string(),
                credits: 500,
                price_cents: 1_000,
                popular: false,
            },
            CreditPackage {
                package_type: PackageType::Popular,
                name: "Popular".to_string(),
                credits: 1_500,
                price_cents: 2_500,
                popular: true,
            },
            CreditPackage {
                package_type: PackageType::Pro,
                name: "Pro".to_string(),
                credits: 4_000,
                price_cents: 6_000,
                popular: false,
            },
        ]
    }

    /// Looks up a fixed package. `Custom` has no catalog entry.
    pub fn find(package_type: PackageType) -> Option<CreditPackage> {
        Self::catalog()
            .into_iter()
            .find(|p| p.package_type == package_type)
    }

    /// Builds a package for a whole-dollar custom amount.
    pub fn custom(dollars: i64) -> Result<CreditPackage, BillingError> {
        if !(CUSTOM_MIN_DOLLARS..=CUSTOM_MAX_DOLLARS).contains(&dollars) {
            return Err(BillingError::validation(
                "customAmount",
                format!(
                    "Custom amount must be between ${} and ${}",
                    CUSTOM_MIN_DOLLARS, CUSTOM_MAX_DOLLARS
                ),
            ));
        }
        Ok(CreditPackage {
            package_type: PackageType::Custom,
            name: format!("{} credits", dollars * CUSTOM_CREDITS_PER_DOLLAR),
            credits: dollars * CUSTOM_CREDITS_PER_DOLLAR,
            price_cents: dollars * 100,
            popular: false,
        })
    }
}
