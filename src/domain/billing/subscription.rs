//! Local subscription mirror.
//!
//! One row per user. The payments vendor is authoritative; this row is what
//! the reconciliation and webhook flows last observed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{SubscriptionId, Timestamp, UserId};

use super::{BillingError, BillingPeriod, Plan};

/// Locally observed subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Pending,
    PendingCancellation,
    Trialing,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::PendingCancellation => "pending_cancellation",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses that still grant the plan's features.
    pub fn grants_access(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active
                | SubscriptionStatus::PendingCancellation
                | SubscriptionStatus::Trialing
        )
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "pending" => Ok(SubscriptionStatus::Pending),
            "pending_cancellation" => Ok(SubscriptionStatus::PendingCancellation),
            "trialing" => Ok(SubscriptionStatus::Trialing),
            "cancelled" | "canceled" => Ok(SubscriptionStatus::Cancelled),
            other => Err(BillingError::validation(
                "status",
                format!("Unknown subscription status: {}", other),
            )),
        }
    }
}

/// A user's subscription as last reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan: Plan,
    pub billing_period: BillingPeriod,
    pub status: SubscriptionStatus,
    pub vendor_subscription_id: Option<String>,
    pub next_billing_date: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Creates a subscription that has not been confirmed yet.
    pub fn pending(
        user_id: UserId,
        plan: Plan,
        billing_period: BillingPeriod,
        vendor_subscription_id: impl Into<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: SubscriptionId::new(),
            user_id,
            plan,
            billing_period,
            status: SubscriptionStatus::Pending,
            vendor_subscription_id: Some(vendor_subscription_id.into()),
            next_billing_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    /// Applies a confirmed period. The row's identity is kept so the
    /// upsert by user id touches the same record.
    pub fn activate(
        &mut self,
        plan: Plan,
        billing_period: BillingPeriod,
        vendor_subscription_id: impl Into<String>,
        period_end: Timestamp,
    ) {
        self.plan = plan;
        self.billing_period = billing_period;
        self.vendor_subscription_id = Some(vendor_subscription_id.into());
        self.next_billing_date = Some(period_end);
        self.status = SubscriptionStatus::Active;
        self.updated_at = Timestamp::now();
    }

    /// Records an unconfirmed observation without downgrading an active row.
    pub fn observe_pending(
        &mut self,
        plan: Plan,
        billing_period: BillingPeriod,
        vendor_subscription_id: impl Into<String>,
        period_end: Option<Timestamp>,
    ) {
        self.plan = plan;
        self.billing_period = billing_period;
        self.vendor_subscription_id = Some(vendor_subscription_id.into());
        if period_end.is_some() {
            self.next_billing_date = period_end;
        }
        if !self.status.grants_access() {
            self.status = SubscriptionStatus::Pending;
        }
        self.updated_at = Timestamp::now();
    }

    /// Marks the subscription to end at the current period's close.
    pub fn schedule_cancellation(&mut self) -> Result<(), BillingError> {
        match self.status {
            SubscriptionStatus::Active | SubscriptionStatus::Trialing => {
                self.status = SubscriptionStatus::PendingCancellation;
                self.updated_at = Timestamp::now();
                Ok(())
            }
            other => Err(BillingError::invalid_state(other.as_str(), "cancel")),
        }
    }

    pub fn cancel(&mut self) {
        self.status = SubscriptionStatus::Cancelled;
        self.updated_at = Timestamp::now();
    }
}
