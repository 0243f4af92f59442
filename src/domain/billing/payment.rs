//! Append-only payment records, one per vendor payment id.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PaymentId, Timestamp, UserId};

use super::{BillingPeriod, Plan};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub user_id: UserId,
    pub vendor_payment_id: String,
    pub vendor_subscription_id: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
    /// Vendor status string, stored verbatim.
    pub status: String,
    pub plan: Option<Plan>,
    pub billing_period: Option<BillingPeriod>,
    pub paid_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl PaymentRecord {
    pub fn new(
        user_id: UserId,
        vendor_payment_id: impl Into<String>,
        amount_cents: i64,
        currency: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            user_id,
            vendor_payment_id: vendor_payment_id.into(),
            vendor_subscription_id: None,
            amount_cents,
            currency: currency.into(),
            status: status.into(),
            plan: None,
            billing_period: None,
            paid_at: None,
            created_at: Timestamp::now(),
        }
    }

    pub fn for_subscription(
        mut self,
        vendor_subscription_id: impl Into<String>,
        plan: Plan,
        billing_period: BillingPeriod,
    ) -> Self {
        self.vendor_subscription_id = Some(vendor_subscription_id.into());
        self.plan = Some(plan);
        self.billing_period = Some(billing_period);
        self
    }

    pub fn paid_at(mut self, paid_at: Option<Timestamp>) -> Self {
        self.paid_at = paid_at;
        self
    }

    pub fn is_succeeded(&self) -> bool {
        self.status == "succeeded"
    }
}
