//! CreditRepository port - the credit ledger store.
//!
//! Entries are append-only. Every writer supplies an idempotency key and
//! the store enforces uniqueness on it, so retried allocations, refunds
//! and debits land at most once.

use async_trait::async_trait;

use crate::domain::billing::{CreditBalance, CreditTransaction};
use crate::domain::foundation::{DomainError, Timestamp, UserId};

use super::SaveResult;

#[async_trait]
pub trait CreditRepository: Send + Sync {
    /// Append an entry.
    ///
    /// Returns `AlreadyExists` when an entry with the same idempotency key
    /// is already recorded; nothing is written in that case.
    async fn record(&self, transaction: &CreditTransaction) -> Result<SaveResult, DomainError>;

    /// Balance as of `now`, computed from the user's entries.
    async fn balance(&self, user_id: &UserId, now: Timestamp) -> Result<CreditBalance, DomainError>;

    /// Most recent entries first.
    async fn recent(&self, user_id: &UserId, limit: u32)
        -> Result<Vec<CreditTransaction>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn CreditRepository) {}
    }
}
