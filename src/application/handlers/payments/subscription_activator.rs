//! SubscriptionActivator - applies a vendor subscription to the local mirror.
//!
//! Shared by the browser return flow and the webhook flow, which race for
//! the same subscription. Whichever arrives second finds the allocation key
//! already recorded and grants nothing.

use std::sync::Arc;

use crate::domain::billing::{
    keys, resolve_period_end, BillingError, BillingPeriod, ConfirmationSignals, CreditReason,
    CreditTransaction, Plan, Subscription,
};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{CreditRepository, SubscriptionRepository, VendorSubscription};

/// What to apply.
#[derive(Debug, Clone)]
pub struct Activation<'a> {
    pub user_id: &'a UserId,
    pub plan: Plan,
    pub billing_period: BillingPeriod,
    pub vendor: &'a VendorSubscription,
    /// A vendor payment for this subscription is known to have succeeded.
    pub payment_succeeded: bool,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationOutcome {
    pub subscription: Subscription,
    pub confirmed: bool,
    /// Credits granted by this call; zero when the period was already paid out.
    pub credits_allocated: i64,
    pub already_processed: bool,
}

pub struct SubscriptionActivator {
    subscriptions: Arc<dyn SubscriptionRepository>,
    credits: Arc<dyn CreditRepository>,
}

impl SubscriptionActivator {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        credits: Arc<dyn CreditRepository>,
    ) -> Self {
        Self {
            subscriptions,
            credits,
        }
    }

    pub async fn apply(&self, activation: Activation<'_>) -> Result<ActivationOutcome, BillingError> {
        let Activation {
            user_id,
            plan,
            billing_period,
            vendor,
            payment_succeeded,
        } = activation;
        let now = Timestamp::now();

        // 1. Gather confirmation signals
        let existing = self.subscriptions.find_by_user(user_id).await?;
        let active_locally = existing.as_ref().map_or(false, |s| {
            s.is_active() && s.vendor_subscription_id.as_deref() == Some(vendor.id.as_str())
        });
        let signals = ConfirmationSignals {
            active_locally,
            payment_succeeded,
            vendor_active: vendor.status.is_active(),
        };

        let mut subscription = existing.clone().unwrap_or_else(|| {
            Subscription::pending(user_id.clone(), plan, billing_period, vendor.id.clone())
        });

        // 2. Unconfirmed: record what we saw and let the caller poll again
        if !signals.is_confirmed() {
            subscription.observe_pending(
                plan,
                billing_period,
                vendor.id.clone(),
                vendor.next_billing_date,
            );
            let saved = self.subscriptions.upsert(&subscription).await?;
            tracing::info!(
                user_id = %user_id,
                subscription_id = %vendor.id,
                vendor_status = ?vendor.status,
                "Subscription not confirmed yet"
            );
            return Ok(ActivationOutcome {
                subscription: saved,
                confirmed: false,
                credits_allocated: 0,
                already_processed: false,
            });
        }

        // 3. Resolve the period. A row that is already active for this
        //    subscription keeps its period so the allocation key is stable.
        let stored_end = existing
            .as_ref()
            .filter(|_| active_locally)
            .and_then(|s| s.next_billing_date)
            .filter(|end| end.is_after(&now));
        let period_end = match stored_end {
            Some(end) if !vendor_moved_past(billing_period, vendor, &end) => end,
            _ => resolve_period_end(billing_period, vendor.next_billing_date, now),
        };

        // 4. Upsert the local row
        subscription.activate(plan, billing_period, vendor.id.clone(), period_end);
        if vendor.cancel_at_next_billing_date {
            subscription.schedule_cancellation()?;
        }
        let saved = self.subscriptions.upsert(&subscription).await?;

        // 5. Allocate this period's credits once
        let grant = plan.credits_for(billing_period);
        let entry = CreditTransaction::credit(
            user_id.clone(),
            grant,
            CreditReason::Subscription,
            format!(
                "{} plan credits ({})",
                plan.details().display_name,
                billing_period
            ),
            Some(period_end),
        )?
        .with_idempotency_key(keys::subscription_allocation(&vendor.id, &period_end));

        let inserted = self.credits.record(&entry).await?.is_inserted();
        if inserted {
            tracing::info!(
                user_id = %user_id,
                subscription_id = %vendor.id,
                credits = grant,
                period_end = %period_end.date_string(),
                "Allocated subscription credits"
            );
        } else {
            tracing::debug!(
                user_id = %user_id,
                subscription_id = %vendor.id,
                "Subscription credits already allocated for this period"
            );
        }

        Ok(ActivationOutcome {
            subscription: saved,
            confirmed: true,
            credits_allocated: if inserted { grant } else { 0 },
            already_processed: !inserted,
        })
    }
}

/// True when the vendor reports a later period than the one stored, i.e.
/// the subscription renewed. Daily periods are never taken from the vendor.
fn vendor_moved_past(
    billing_period: BillingPeriod,
    vendor: &VendorSubscription,
    stored_end: &Timestamp,
) -> bool {
    billing_period != BillingPeriod::Daily
        && vendor
            .next_billing_date
            .map_or(false, |next| next.date_string() > stored_end.date_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{user, vendor_subscription, BillingFixture};
    use crate::domain::billing::SubscriptionStatus;
    use crate::ports::VendorSubscriptionStatus;

    fn activator(fx: &BillingFixture) -> SubscriptionActivator {
        SubscriptionActivator::new(fx.subscriptions.clone(), fx.credits.clone())
    }

    fn activation<'a>(
        user_id: &'a UserId,
        vendor: &'a VendorSubscription,
        payment_succeeded: bool,
    ) -> Activation<'a> {
        Activation {
            user_id,
            plan: Plan::Creator,
            billing_period: BillingPeriod::Monthly,
            vendor,
            payment_succeeded,
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Confirmation
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn active_vendor_subscription_allocates_monthly_grant() {
        let fx = BillingFixture::new();
        let caller = user();
        let vendor = vendor_subscription(
            "sub_1",
            VendorSubscriptionStatus::Active,
            Plan::Creator,
            BillingPeriod::Monthly,
        );

        let outcome = activator(&fx)
            .apply(activation(&caller.id, &vendor, false))
            .await
            .unwrap();

        assert!(outcome.confirmed);
        assert_eq!(outcome.credits_allocated, 500);
        assert_eq!(outcome.subscription.status, SubscriptionStatus::Active);
        assert_eq!(outcome.subscription.next_billing_date, vendor.next_billing_date);
        assert_eq!(fx.balance(&caller).await, 500);
    }

    #[tokio::test]
    async fn succeeded_payment_confirms_pending_vendor_subscription() {
        let fx = BillingFixture::new();
        let caller = user();
        let vendor = vendor_subscription(
            "sub_1",
            VendorSubscriptionStatus::Pending,
            Plan::Creator,
            BillingPeriod::Monthly,
        );

        let outcome = activator(&fx)
            .apply(activation(&caller.id, &vendor, true))
            .await
            .unwrap();

        assert!(outcome.confirmed);
        assert_eq!(fx.balance(&caller).await, 500);
    }

    #[tokio::test]
    async fn unconfirmed_subscription_is_stored_pending_without_credits() {
        let fx = BillingFixture::new();
        let caller = user();
        let vendor = vendor_subscription(
            "sub_1",
            VendorSubscriptionStatus::Pending,
            Plan::Creator,
            BillingPeriod::Monthly,
        );

        let outcome = activator(&fx)
            .apply(activation(&caller.id, &vendor, false))
            .await
            .unwrap();

        assert!(!outcome.confirmed);
        assert_eq!(outcome.subscription.status, SubscriptionStatus::Pending);
        assert_eq!(fx.balance(&caller).await, 0);
        assert_eq!(fx.subscriptions.len(), 1);
    }

    #[tokio::test]
    async fn locally_active_row_confirms_even_if_vendor_lags() {
        let fx = BillingFixture::new();
        let caller = user();
        let active = vendor_subscription(
            "sub_1",
            VendorSubscriptionStatus::Active,
            Plan::Creator,
            BillingPeriod::Monthly,
        );
        activator(&fx)
            .apply(activation(&caller.id, &active, false))
            .await
            .unwrap();

        let lagging = VendorSubscription {
            status: VendorSubscriptionStatus::Pending,
            ..active
        };
        let outcome = activator(&fx)
            .apply(activation(&caller.id, &lagging, false))
            .await
            .unwrap();

        assert!(outcome.confirmed);
        assert!(outcome.already_processed);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Idempotency
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn repeated_activation_does_not_double_credit() {
        let fx = BillingFixture::new();
        let caller = user();
        let vendor = vendor_subscription(
            "sub_1",
            VendorSubscriptionStatus::Active,
            Plan::Creator,
            BillingPeriod::Monthly,
        );

        let first = activator(&fx)
            .apply(activation(&caller.id, &vendor, false))
            .await
            .unwrap();
        let second = activator(&fx)
            .apply(activation(&caller.id, &vendor, true))
            .await
            .unwrap();

        assert_eq!(first.credits_allocated, 500);
        assert_eq!(second.credits_allocated, 0);
        assert!(second.already_processed);
        assert_eq!(fx.balance(&caller).await, 500);
        assert_eq!(second.subscription.id, first.subscription.id);
    }

    #[tokio::test]
    async fn repeated_daily_activation_reuses_stored_period() {
        let fx = BillingFixture::new();
        let caller = user();
        let vendor = vendor_subscription(
            "sub_d",
            VendorSubscriptionStatus::Active,
            Plan::Creator,
            BillingPeriod::Daily,
        );
        let daily = Activation {
            user_id: &caller.id,
            plan: Plan::Creator,
            billing_period: BillingPeriod::Daily,
            vendor: &vendor,
            payment_succeeded: false,
        };

        let first = activator(&fx).apply(daily.clone()).await.unwrap();
        activator(&fx).apply(daily).await.unwrap();

        let end = first.subscription.next_billing_date.unwrap();
        assert!(end.is_before(&Timestamp::now().add_days(2)));
        assert_eq!(fx.credits.entries_for(&caller.id).len(), 1);
    }

    #[tokio::test]
    async fn renewal_with_later_vendor_date_allocates_again() {
        let fx = BillingFixture::new();
        let caller = user();
        let vendor = vendor_subscription(
            "sub_1",
            VendorSubscriptionStatus::Active,
            Plan::Creator,
            BillingPeriod::Monthly,
        );
        activator(&fx)
            .apply(activation(&caller.id, &vendor, false))
            .await
            .unwrap();

        let renewed = VendorSubscription {
            next_billing_date: vendor.next_billing_date.map(|d| d.add_months(1)),
            ..vendor.clone()
        };
        let outcome = activator(&fx)
            .apply(activation(&caller.id, &renewed, false))
            .await
            .unwrap();

        assert_eq!(outcome.credits_allocated, 500);
        assert_eq!(fx.credits.entries_for(&caller.id).len(), 2);
    }

    #[tokio::test]
    async fn vendor_cancel_flag_marks_pending_cancellation() {
        let fx = BillingFixture::new();
        let caller = user();
        let vendor = VendorSubscription {
            cancel_at_next_billing_date: true,
            ..vendor_subscription(
                "sub_1",
                VendorSubscriptionStatus::Active,
                Plan::Creator,
                BillingPeriod::Monthly,
            )
        };

        let outcome = activator(&fx)
            .apply(activation(&caller.id, &vendor, false))
            .await
            .unwrap();

        assert_eq!(outcome.subscription.status, SubscriptionStatus::PendingCancellation);
    }
}
