//! CancelSubscriptionHandler - stops renewal at the end of the period.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Subscription};
use crate::domain::foundation::UserId;
use crate::ports::{PaymentProvider, SubscriptionRepository};

#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub user_id: UserId,
}

/// Asks the vendor to stop renewing and marks the local row
/// `pending_cancellation`. Access continues until `next_billing_date`.
pub struct CancelSubscriptionHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl CancelSubscriptionHandler {
    pub fn new(
        payment_provider: Arc<dyn PaymentProvider>,
        subscriptions: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            payment_provider,
            subscriptions,
        }
    }

    pub async fn handle(&self, cmd: CancelSubscriptionCommand) -> Result<Subscription, BillingError> {
        // 1. Load the local row
        let mut subscription = self
            .subscriptions
            .find_by_user(&cmd.user_id)
            .await?
            .ok_or_else(|| BillingError::subscription_not_found(cmd.user_id.as_str()))?;

        let vendor_id = subscription
            .vendor_subscription_id
            .clone()
            .ok_or_else(|| BillingError::subscription_not_found(subscription.id.to_string()))?;

        // 2. Check the transition before touching the vendor
        subscription.schedule_cancellation()?;

        // 3. Tell the vendor
        self.payment_provider.cancel_at_period_end(&vendor_id).await?;

        // 4. Persist
        let saved = self.subscriptions.upsert(&subscription).await?;

        tracing::info!(
            user_id = %cmd.user_id,
            subscription_id = %vendor_id,
            "Subscription set to cancel at period end"
        );
        Ok(saved)
    }
}
