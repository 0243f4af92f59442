//! GetSubscriptionHandler - the caller's current subscription.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Subscription};
use crate::domain::foundation::UserId;
use crate::ports::SubscriptionRepository;

#[derive(Debug, Clone)]
pub struct GetSubscriptionQuery {
    pub user_id: UserId,
}

pub struct GetSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl GetSubscriptionHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    /// `None` when the user never subscribed.
    pub async fn handle(
        &self,
        query: GetSubscriptionQuery,
    ) -> Result<Option<Subscription>, BillingError> {
        Ok(self.subscriptions.find_by_user(&query.user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{other_user, user, BillingFixture};
    use crate::domain::billing::{BillingPeriod, Plan};

    #[tokio::test]
    async fn returns_own_subscription_only() {
        let fx = BillingFixture::new();
        fx.subscriptions
            .upsert(&Subscription::pending(
                user().id,
                Plan::Basic,
                BillingPeriod::Yearly,
                "sub_1",
            ))
            .await
            .unwrap();
        let handler = GetSubscriptionHandler::new(fx.subscriptions.clone());

        let own = handler
            .handle(GetSubscriptionQuery { user_id: user().id })
            .await
            .unwrap();
        let other = handler
            .handle(GetSubscriptionQuery {
                user_id: other_user().id,
            })
            .await
            .unwrap();

        assert_eq!(own.map(|s| s.plan), Some(Plan::Basic));
        assert!(other.is_none());
    }
}
