//! In-memory credit ledger.
//!
//! Mirrors the PostgreSQL adapter's unique idempotency key so tests see
//! the same duplicate-suppression behaviour.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::billing::{CreditBalance, CreditTransaction};
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::{CreditRepository, SaveResult};

/// In-memory implementation of the CreditRepository port.
#[derive(Default)]
pub struct InMemoryCreditRepository {
    entries: Mutex<Vec<CreditTransaction>>,
    failing_reads: AtomicBool,
}

impl InMemoryCreditRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> Vec<CreditTransaction> {
        self.entries.lock().unwrap().clone()
    }

    /// Entries for one user in insertion order.
    pub fn entries_for(&self, user_id: &UserId) -> Vec<CreditTransaction> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| &e.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Make `balance` and `recent` fail, to exercise degraded paths.
    pub fn set_failing_reads(&self, failing: bool) {
        self.failing_reads.store(failing, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<(), DomainError> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(DomainError::database("ledger unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl CreditRepository for InMemoryCreditRepository {
    async fn record(&self, transaction: &CreditTransaction) -> Result<SaveResult, DomainError> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(key) = &transaction.idempotency_key {
            if entries
                .iter()
                .any(|e| e.idempotency_key.as_deref() == Some(key.as_str()))
            {
                return Ok(SaveResult::AlreadyExists);
            }
        }
        entries.push(transaction.clone());
        Ok(SaveResult::Inserted)
    }

    async fn balance(&self, user_id: &UserId, now: Timestamp) -> Result<CreditBalance, DomainError> {
        self.check_reads()?;
        let entries = self.entries.lock().unwrap();
        Ok(CreditBalance::compute(
            entries.iter().filter(|e| &e.user_id == user_id),
            &now,
        ))
    }

    async fn recent(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<CreditTransaction>, DomainError> {
        self.check_reads()?;
        let entries = self.entries.lock().unwrap();
        let mut mine: Vec<_> = entries
            .iter()
            .filter(|e| &e.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        mine.truncate(limit as usize);
        Ok(mine)
    }
}
