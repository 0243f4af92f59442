//! In-memory payment log keyed by vendor payment id.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::billing::PaymentRecord;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{PaymentRepository, SaveResult};

#[derive(Default)]
pub struct InMemoryPaymentRepository {
    rows: Mutex<Vec<PaymentRecord>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<PaymentRecord> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn insert_if_absent(&self, payment: &PaymentRecord) -> Result<SaveResult, DomainError> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|p| p.vendor_payment_id == payment.vendor_payment_id)
        {
            return Ok(SaveResult::AlreadyExists);
        }
        rows.push(payment.clone());
        Ok(SaveResult::Inserted)
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<PaymentRecord>, DomainError> {
        let mut mine: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| &p.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        mine.truncate(limit as usize);
        Ok(mine)
    }
}
