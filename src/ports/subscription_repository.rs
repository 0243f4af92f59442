//! SubscriptionRepository port - the local subscription mirror.

use async_trait::async_trait;

use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, UserId};

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert or replace the user's row. The user id is the conflict key,
    /// so the returned row keeps the id of any existing subscription.
    async fn upsert(&self, subscription: &Subscription) -> Result<Subscription, DomainError>;

    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError>;

    async fn find_by_vendor_id(
        &self,
        vendor_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError>;
}
