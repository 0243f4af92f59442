//! CreditPurchaseRepository port.

use async_trait::async_trait;

use crate::domain::billing::CreditPurchase;
use crate::domain::foundation::{DomainError, PurchaseId};

#[async_trait]
pub trait CreditPurchaseRepository: Send + Sync {
    async fn create(&self, purchase: &CreditPurchase) -> Result<(), DomainError>;

    async fn update(&self, purchase: &CreditPurchase) -> Result<(), DomainError>;

    async fn find(&self, id: &PurchaseId) -> Result<Option<CreditPurchase>, DomainError>;

    async fn find_by_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CreditPurchase>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_purchase_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn CreditPurchaseRepository) {}
    }
}
