//! In-memory subscription store, one row per user.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::SubscriptionRepository;

#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    rows: Mutex<HashMap<UserId, Subscription>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn upsert(&self, subscription: &Subscription) -> Result<Subscription, DomainError> {
        let mut rows = self.rows.lock().unwrap();
        let mut stored = subscription.clone();
        if let Some(existing) = rows.get(&subscription.user_id) {
            stored.id = existing.id;
            stored.created_at = existing.created_at;
        }
        rows.insert(stored.user_id.clone(), stored.clone());
        Ok(stored)
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        Ok(self.rows.lock().unwrap().get(user_id).cloned())
    }

    async fn find_by_vendor_id(
        &self,
        vendor_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|s| s.vendor_subscription_id.as_deref() == Some(vendor_subscription_id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{BillingPeriod, Plan};

    #[tokio::test]
    async fn upsert_keeps_existing_id() {
        let repo = InMemorySubscriptionRepository::new();
        let user = UserId::new("user-1").unwrap();

        let first = repo
            .upsert(&Subscription::pending(user.clone(), Plan::Basic, BillingPeriod::Monthly, "sub_1"))
            .await
            .unwrap();
        let second = repo
            .upsert(&Subscription::pending(user.clone(), Plan::Creator, BillingPeriod::Monthly, "sub_2"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.find_by_vendor_id("sub_2").await.unwrap().unwrap().plan, Plan::Creator);
    }
}
