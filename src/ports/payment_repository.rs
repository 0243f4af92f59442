//! PaymentRepository port - append-only vendor payment log.

use async_trait::async_trait;

use crate::domain::billing::PaymentRecord;
use crate::domain::foundation::{DomainError, UserId};

use super::SaveResult;

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert unless a record with the same vendor payment id exists.
    async fn insert_if_absent(&self, payment: &PaymentRecord) -> Result<SaveResult, DomainError>;

    /// Most recent payments first.
    async fn list_for_user(&self, user_id: &UserId, limit: u32)
        -> Result<Vec<PaymentRecord>, DomainError>;
}
