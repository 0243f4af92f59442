//! One-time credit purchase records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{PurchaseId, Timestamp, UserId};

use super::{BillingError, CreditPackage, PackageType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Completed,
    Failed,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Completed => "completed",
            PurchaseStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PurchaseStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PurchaseStatus::Pending),
            "completed" => Ok(PurchaseStatus::Completed),
            "failed" => Ok(PurchaseStatus::Failed),
            other => Err(BillingError::validation(
                "status",
                format!("Unknown purchase status: {}", other),
            )),
        }
    }
}

/// A pending or settled purchase of a credit package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditPurchase {
    pub id: PurchaseId,
    pub user_id: UserId,
    pub package_type: PackageType,
    pub credits: i64,
    pub amount_cents: i64,
    pub status: PurchaseStatus,
    pub checkout_session_id: Option<String>,
    pub checkout_url: Option<String>,
    pub vendor_payment_id: Option<String>,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl CreditPurchase {
    pub fn new(user_id: UserId, package: &CreditPackage) -> Self {
        Self {
            id: PurchaseId::new(),
            user_id,
            package_type: package.package_type,
            credits: package.credits,
            amount_cents: package.price_cents,
            status: PurchaseStatus::Pending,
            checkout_session_id: None,
            checkout_url: None,
            vendor_payment_id: None,
            created_at: Timestamp::now(),
            completed_at: None,
        }
    }

    pub fn attach_checkout(&mut self, session_id: impl Into<String>, url: impl Into<String>) {
        self.checkout_session_id = Some(session_id.into());
        self.checkout_url = Some(url.into());
    }

    /// Settles the purchase. Returns `false` if it was already completed.
    pub fn complete(&mut self, vendor_payment_id: impl Into<String>) -> Result<bool, BillingError> {
        match self.status {
            PurchaseStatus::Completed => Ok(false),
            PurchaseStatus::Failed => Err(BillingError::invalid_state("failed", "complete")),
            PurchaseStatus::Pending => {
                self.status = PurchaseStatus::Completed;
                self.vendor_payment_id = Some(vendor_payment_id.into());
                self.completed_at = Some(Timestamp::now());
                Ok(true)
            }
        }
    }

    /// Marks a pending purchase failed. Completed purchases stay completed.
    pub fn fail(&mut self) {
        if self.status == PurchaseStatus::Pending {
            self.status = PurchaseStatus::Failed;
        }
    }
}
