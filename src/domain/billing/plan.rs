//! Subscription plans and billing periods.
//!
//! The plan table is static: every paid plan has a monthly credit grant and
//! a price per billing period. Vendor product ids are configuration, not
//! part of the table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::Timestamp;

use super::BillingError;

/// Subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Basic,
    Creator,
    Professional,
    Enterprise,
}

/// How often a subscription renews.
///
/// `Daily` exists for end-to-end testing against the vendor sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    Daily,
    Monthly,
    Yearly,
}

/// One row of the plan table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanDetails {
    pub plan: Plan,
    pub display_name: &'static str,
    pub monthly_credits: i64,
    pub daily_price_cents: i64,
    pub monthly_price_cents: i64,
    pub yearly_price_cents: i64,
}

const PLAN_TABLE: [PlanDetails; 4] = [
    PlanDetails {
        plan: Plan::Basic,
        display_name: "Basic",
        monthly_credits: 100,
        daily_price_cents: 100,
        monthly_price_cents: 900,
        yearly_price_cents: 9_000,
    },
    PlanDetails {
        plan: Plan::Creator,
        display_name: "Creator",
        monthly_credits: 500,
        daily_price_cents: 100,
        monthly_price_cents: 2_900,
        yearly_price_cents: 29_000,
    },
    PlanDetails {
        plan: Plan::Professional,
        display_name: "Professional",
        monthly_credits: 1_500,
        daily_price_cents: 100,
        monthly_price_cents: 7_900,
        yearly_price_cents: 79_000,
    },
    PlanDetails {
        plan: Plan::Enterprise,
        display_name: "Enterprise",
        monthly_credits: 5_000,
        daily_price_cents: 100,
        monthly_price_cents: 19_900,
        yearly_price_cents: 199_000,
    },
];

impl Plan {
    pub const ALL: [Plan; 4] = [Plan::Basic, Plan::Creator, Plan::Professional, Plan::Enterprise];

    /// Returns this plan's row in the plan table.
    pub fn details(&self) -> &'static PlanDetails {
        let index = match self {
            Plan::Basic => 0,
            Plan::Creator => 1,
            Plan::Professional => 2,
            Plan::Enterprise => 3,
        };
        &PLAN_TABLE[index]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Basic => "basic",
            Plan::Creator => "creator",
            Plan::Professional => "professional",
            Plan::Enterprise => "enterprise",
        }
    }

    /// Numeric rank for upgrade/downgrade comparison.
    pub fn rank(&self) -> u8 {
        match self {
            Plan::Basic => 0,
            Plan::Creator => 1,
            Plan::Professional => 2,
            Plan::Enterprise => 3,
        }
    }

    /// Credits granted for one billing period.
    pub fn credits_for(&self, period: BillingPeriod) -> i64 {
        let monthly = self.details().monthly_credits;
        match period {
            BillingPeriod::Daily | BillingPeriod::Monthly => monthly,
            BillingPeriod::Yearly => monthly * 12,
        }
    }

    /// Price in USD cents for one billing period.
    pub fn price_cents(&self, period: BillingPeriod) -> i64 {
        let details = self.details();
        match period {
            BillingPeriod::Daily => details.daily_price_cents,
            BillingPeriod::Monthly => details.monthly_price_cents,
            BillingPeriod::Yearly => details.yearly_price_cents,
        }
    }

    /// Configuration key of the vendor product for this plan/period pair,
    /// e.g. `creator_monthly`.
    pub fn product_key(&self, period: BillingPeriod) -> String {
        format!("{}_{}", self.as_str(), period.as_str())
    }

    /// Inverse of [`Plan::product_key`].
    pub fn from_product_key(key: &str) -> Option<(Plan, BillingPeriod)> {
        let (plan, period) = key.rsplit_once('_')?;
        Some((plan.parse().ok()?, period.parse().ok()?))
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Plan {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Plan::Basic),
            "creator" => Ok(Plan::Creator),
            "professional" => Ok(Plan::Professional),
            "enterprise" => Ok(Plan::Enterprise),
            other => Err(BillingError::invalid_plan(other)),
        }
    }
}

impl BillingPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingPeriod::Daily => "daily",
            BillingPeriod::Monthly => "monthly",
            BillingPeriod::Yearly => "yearly",
        }
    }

    /// End of a period that starts at `start`.
    pub fn period_end(&self, start: Timestamp) -> Timestamp {
        match self {
            BillingPeriod::Daily => start.add_days(1),
            BillingPeriod::Monthly => start.add_months(1),
            BillingPeriod::Yearly => start.add_months(12),
        }
    }

    /// Start of the period that ends at `end`.
    pub fn period_start(&self, end: Timestamp) -> Timestamp {
        match self {
            BillingPeriod::Daily => end.add_days(-1),
            BillingPeriod::Monthly => end.sub_months(1),
            BillingPeriod::Yearly => end.sub_months(12),
        }
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BillingPeriod {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(BillingPeriod::Daily),
            "monthly" => Ok(BillingPeriod::Monthly),
            "yearly" | "annual" => Ok(BillingPeriod::Yearly),
            other => Err(BillingError::invalid_billing_period(other)),
        }
    }
}
