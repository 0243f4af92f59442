//! In-memory credit purchase store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::billing::CreditPurchase;
use crate::domain::foundation::{DomainError, ErrorCode, PurchaseId};
use crate::ports::CreditPurchaseRepository;

#[derive(Default)]
pub struct InMemoryCreditPurchaseRepository {
    rows: Mutex<HashMap<PurchaseId, CreditPurchase>>,
}

impl InMemoryCreditPurchaseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CreditPurchaseRepository for InMemoryCreditPurchaseRepository {
    async fn create(&self, purchase: &CreditPurchase) -> Result<(), DomainError> {
        self.rows.lock().unwrap().insert(purchase.id, purchase.clone());
        Ok(())
    }

    async fn update(&self, purchase: &CreditPurchase) -> Result<(), DomainError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&purchase.id) {
            Some(row) => {
                *row = purchase.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::PurchaseNotFound,
                format!("Purchase {} not found", purchase.id),
            )),
        }
    }

    async fn find(&self, id: &PurchaseId) -> Result<Option<CreditPurchase>, DomainError> {
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn find_by_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CreditPurchase>, DomainError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|p| p.checkout_session_id.as_deref() == Some(session_id))
            .cloned())
    }
}
