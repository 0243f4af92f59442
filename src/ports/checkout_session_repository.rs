//! CheckoutSessionRepository port.
//!
//! Remembers which user, plan and billing period a vendor checkout session
//! was created for, so the completion flow can recover them when the vendor
//! object carries no usable metadata.

use async_trait::async_trait;

use crate::domain::billing::{BillingPeriod, Plan};
use crate::domain::foundation::{DomainError, Timestamp, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRecord {
    pub session_id: String,
    pub user_id: UserId,
    pub plan: Plan,
    pub billing_period: BillingPeriod,
    pub created_at: Timestamp,
}

impl CheckoutSessionRecord {
    pub fn new(
        session_id: impl Into<String>,
        user_id: UserId,
        plan: Plan,
        billing_period: BillingPeriod,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_id,
            plan,
            billing_period,
            created_at: Timestamp::now(),
        }
    }
}

#[async_trait]
pub trait CheckoutSessionRepository: Send + Sync {
    async fn save(&self, record: &CheckoutSessionRecord) -> Result<(), DomainError>;

    async fn find(&self, session_id: &str) -> Result<Option<CheckoutSessionRecord>, DomainError>;
}
