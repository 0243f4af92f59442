//! In-memory checkout session mapping.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::ports::{CheckoutSessionRecord, CheckoutSessionRepository};

#[derive(Default)]
pub struct InMemoryCheckoutSessionRepository {
    rows: Mutex<HashMap<String, CheckoutSessionRecord>>,
}

impl InMemoryCheckoutSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckoutSessionRepository for InMemoryCheckoutSessionRepository {
    async fn save(&self, record: &CheckoutSessionRecord) -> Result<(), DomainError> {
        self.rows
            .lock()
            .unwrap()
            .insert(record.session_id.clone(), record.clone());
        Ok(())
    }

    async fn find(&self, session_id: &str) -> Result<Option<CheckoutSessionRecord>, DomainError> {
        Ok(self.rows.lock().unwrap().get(session_id).cloned())
    }
}
