//! PreviewPlanChangeHandler - prices a plan switch without applying it.

use std::sync::Arc;

use crate::domain::billing::{preview_plan_change, BillingError, PlanChangePreview};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::SubscriptionRepository;

#[derive(Debug, Clone)]
pub struct PreviewPlanChangeQuery {
    pub user_id: UserId,
    pub target_plan: String,
}

pub struct PreviewPlanChangeHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl PreviewPlanChangeHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(
        &self,
        query: PreviewPlanChangeQuery,
    ) -> Result<PlanChangePreview, BillingError> {
        let target = query.target_plan.parse()?;

        let subscription = self
            .subscriptions
            .find_by_user(&query.user_id)
            .await?
            .filter(|s| s.status.grants_access())
            .ok_or_else(|| BillingError::subscription_not_found(query.user_id.as_str()))?;

        let period_end = subscription.next_billing_date.ok_or_else(|| {
            BillingError::invalid_state(subscription.status.as_str(), "change plan")
        })?;
        let period_start = subscription.billing_period.period_start(period_end);

        preview_plan_change(
            subscription.plan,
            target,
            subscription.billing_period,
            period_start,
            period_end,
            Timestamp::now(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{user, BillingFixture};
    use crate::domain::billing::{BillingPeriod, Plan, Subscription};

    async fn seed(fx: &BillingFixture, days_left: i64) {
        let mut local = Subscription::pending(user().id, Plan::Basic, BillingPeriod::Monthly, "sub_1");
        local.activate(
            Plan::Basic,
            BillingPeriod::Monthly,
            "sub_1",
            Timestamp::now().add_days(days_left),
        );
        fx.subscriptions.upsert(&local).await.unwrap();
    }

    #[tokio::test]
    async fn upgrade_is_charged_and_credited() {
        let fx = BillingFixture::new();
        seed(&fx, 15).await;
        let handler = PreviewPlanChangeHandler::new(fx.subscriptions.clone());

        let preview = handler
            .handle(PreviewPlanChangeQuery {
                user_id: user().id,
                target_plan: "creator".to_string(),
            })
            .await
            .unwrap();

        assert!(preview.is_upgrade);
        assert!(preview.prorated_amount_cents > 0);
        assert!(preview.credit_adjustment > 0);
        assert!(preview.remaining_fraction > 0.0 && preview.remaining_fraction < 1.0);
    }

    #[tokio::test]
    async fn same_plan_is_rejected() {
        let fx = BillingFixture::new();
        seed(&fx, 15).await;
        let handler = PreviewPlanChangeHandler::new(fx.subscriptions.clone());

        let result = handler
            .handle(PreviewPlanChangeQuery {
                user_id: user().id,
                target_plan: "basic".to_string(),
            })
            .await;

        assert!(matches!(result, Err(BillingError::ValidationFailed { .. })));
    }

    #[tokio::test]
    async fn unknown_plan_is_rejected() {
        let fx = BillingFixture::new();
        seed(&fx, 15).await;
        let handler = PreviewPlanChangeHandler::new(fx.subscriptions.clone());

        let result = handler
            .handle(PreviewPlanChangeQuery {
                user_id: user().id,
                target_plan: "platinum".to_string(),
            })
            .await;

        assert!(matches!(result, Err(BillingError::InvalidPlan(_))));
    }

    #[tokio::test]
    async fn without_subscription_is_not_found() {
        let fx = BillingFixture::new();
        let handler = PreviewPlanChangeHandler::new(fx.subscriptions.clone());

        let result = handler
            .handle(PreviewPlanChangeQuery {
                user_id: user().id,
                target_plan: "creator".to_string(),
            })
            .await;

        assert!(matches!(result, Err(BillingError::SubscriptionNotFound(_))));
    }
}
