//! CompletePaymentHandler - reconciles a finished checkout with the vendor.
//!
//! Called by the browser after the vendor redirects back. The caller may
//! hold any of the subscription id, a payment id or the checkout session
//! id; all three resolve to a vendor subscription which is then applied
//! through the shared activator.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::billing::{
    verify_ownership, BillingError, BillingPeriod, PaymentRecord, Plan, Subscription,
};
use crate::domain::foundation::AuthenticatedUser;
use crate::ports::{
    CheckoutSessionRecord, CheckoutSessionRepository, PaymentProvider, PaymentRepository,
    SubscriptionRepository, VendorPayment, VendorSubscription,
};

use super::products::plan_from_metadata;
use super::{Activation, ProductCatalog, SubscriptionActivator};

/// Command to reconcile a checkout. At least one id is required.
#[derive(Debug, Clone)]
pub struct CompletePaymentCommand {
    pub user: AuthenticatedUser,
    pub subscription_id: Option<String>,
    pub payment_id: Option<String>,
    pub session_id: Option<String>,
}

/// Result of reconciliation.
///
/// `confirmed == false` means the vendor has not settled yet and the client
/// should poll again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletePaymentResult {
    pub subscription: Option<Subscription>,
    pub confirmed: bool,
    pub credits_allocated: i64,
    pub already_processed: bool,
}

impl CompletePaymentResult {
    fn pending(subscription: Option<Subscription>) -> Self {
        Self {
            subscription,
            confirmed: false,
            credits_allocated: 0,
            already_processed: false,
        }
    }
}

pub struct CompletePaymentHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    payments: Arc<dyn PaymentRepository>,
    checkout_sessions: Arc<dyn CheckoutSessionRepository>,
    activator: Arc<SubscriptionActivator>,
    catalog: ProductCatalog,
}

/// What the identifiers resolved to.
struct Resolved {
    subscription_id: Option<String>,
    payment: Option<VendorPayment>,
    session: Option<CheckoutSessionRecord>,
    session_metadata: HashMap<String, String>,
}

fn pays_for_subscription(
    payment: &VendorPayment,
    vendor: &VendorSubscription,
    user: &AuthenticatedUser,
) -> bool {
    if payment.subscription_id.as_deref() != Some(vendor.id.as_str()) {
        tracing::warn!(
            user_id = %user.id,
            payment_id = %payment.id,
            subscription_id = %vendor.id,
            "Ignoring payment taken for another subscription"
        );
        return false;
    }
    if verify_ownership(user, payment.metadata_user_id(), payment.customer_email.as_deref())
        .is_err()
    {
        tracing::warn!(
            user_id = %user.id,
            payment_id = %payment.id,
            "Ignoring payment owned by another customer"
        );
        return false;
    }
    true
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CompletePaymentHandler {
    pub fn new(
        payment_provider: Arc<dyn PaymentProvider>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        payments: Arc<dyn PaymentRepository>,
        checkout_sessions: Arc<dyn CheckoutSessionRepository>,
        activator: Arc<SubscriptionActivator>,
        catalog: ProductCatalog,
    ) -> Self {
        Self {
            payment_provider,
            subscriptions,
            payments,
            checkout_sessions,
            activator,
            catalog,
        }
    }

    pub async fn handle(
        &self,
        cmd: CompletePaymentCommand,
    ) -> Result<CompletePaymentResult, BillingError> {
        let user = &cmd.user;

        // 1. Resolve a subscription id: subscription → payment → session
        let mut resolved = self.resolve(&cmd).await?;
        let subscription_id = match resolved.subscription_id.clone() {
            Some(id) => id,
            None => {
                tracing::info!(user_id = %user.id, "Checkout has not produced a subscription yet");
                let local = self.subscriptions.find_by_user(&user.id).await?;
                return Ok(CompletePaymentResult::pending(local));
            }
        };

        // 2. Fetch the authoritative subscription
        let vendor = self
            .payment_provider
            .get_subscription(&subscription_id)
            .await?
            .ok_or_else(|| BillingError::subscription_not_found(&subscription_id))?;

        // 3. Ownership
        if let Some(session) = &resolved.session {
            if session.user_id != user.id {
                return Err(BillingError::OwnershipMismatch);
            }
        }
        verify_ownership(user, vendor.metadata_user_id(), vendor.customer_email.as_deref())
            .map_err(|e| {
                tracing::warn!(
                    user_id = %user.id,
                    subscription_id = %vendor.id,
                    "Subscription ownership check failed"
                );
                e
            })?;

        // A payment only counts when it was taken for this subscription
        // from this caller.
        resolved.payment = resolved
            .payment
            .take()
            .filter(|payment| pays_for_subscription(payment, &vendor, user));

        // 4. Plan and period
        let (plan, billing_period) = self.plan_for(&vendor, &resolved, user).await?;

        // 5. Apply
        let payment_succeeded = resolved
            .payment
            .as_ref()
            .map_or(false, VendorPayment::is_succeeded);
        let outcome = self
            .activator
            .apply(Activation {
                user_id: &user.id,
                plan,
                billing_period,
                vendor: &vendor,
                payment_succeeded,
            })
            .await?;

        // 6. Payment log, best effort
        if let Some(payment) = resolved.payment.as_ref().filter(|_| outcome.confirmed) {
            self.record_payment(user, payment, &vendor, plan, billing_period)
                .await;
        }

        Ok(CompletePaymentResult {
            subscription: Some(outcome.subscription),
            confirmed: outcome.confirmed,
            credits_allocated: outcome.credits_allocated,
            already_processed: outcome.already_processed,
        })
    }

    async fn resolve(&self, cmd: &CompletePaymentCommand) -> Result<Resolved, BillingError> {
        let mut resolved = Resolved {
            subscription_id: non_empty(cmd.subscription_id.clone()),
            payment: None,
            session: None,
            session_metadata: HashMap::new(),
        };
        let payment_id = non_empty(cmd.payment_id.clone());
        let session_id = non_empty(cmd.session_id.clone());

        if resolved.subscription_id.is_none() && payment_id.is_none() && session_id.is_none() {
            return Err(BillingError::MissingIdentifier);
        }

        if let Some(session_id) = &session_id {
            resolved.session = match self.checkout_sessions.find(session_id).await {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(session_id = %session_id, error = %e, "Checkout session lookup failed");
                    None
                }
            };
        }

        if resolved.subscription_id.is_some() {
            if let Some(payment_id) = &payment_id {
                resolved.payment = self.payment_provider.get_payment(payment_id).await?;
            }
            return Ok(resolved);
        }

        let payment_id = match (payment_id, &session_id) {
            (Some(id), _) => Some(id),
            (None, Some(session_id)) => {
                let details = self
                    .payment_provider
                    .get_checkout_session(session_id)
                    .await?
                    .ok_or_else(|| BillingError::subscription_not_found(session_id))?;
                resolved.subscription_id = details.subscription_id;
                resolved.session_metadata = details.metadata;
                details.payment_id
            }
            (None, None) => None,
        };

        if let Some(payment_id) = payment_id {
            let payment = self
                .payment_provider
                .get_payment(&payment_id)
                .await?
                .ok_or_else(|| BillingError::payment_not_found(&payment_id))?;
            if resolved.subscription_id.is_none() {
                resolved.subscription_id = payment.subscription_id.clone();
            }
            resolved.payment = Some(payment);
        }

        Ok(resolved)
    }

    /// Vendor metadata, then the stored checkout session, then the product
    /// id, then the existing local row.
    async fn plan_for(
        &self,
        vendor: &VendorSubscription,
        resolved: &Resolved,
        user: &AuthenticatedUser,
    ) -> Result<(Plan, BillingPeriod), BillingError> {
        if let Some(found) = plan_from_metadata(&vendor.metadata)
            .or_else(|| plan_from_metadata(&resolved.session_metadata))
            .or_else(|| resolved.session.as_ref().map(|s| (s.plan, s.billing_period)))
            .or_else(|| self.catalog.plan_for_product(&vendor.product_id))
        {
            return Ok(found);
        }
        match self.subscriptions.find_by_user(&user.id).await? {
            Some(local) => Ok((local.plan, local.billing_period)),
            None => Err(BillingError::validation(
                "plan",
                format!("Unable to determine the plan for product {}", vendor.product_id),
            )),
        }
    }

    async fn record_payment(
        &self,
        user: &AuthenticatedUser,
        payment: &VendorPayment,
        vendor: &VendorSubscription,
        plan: Plan,
        billing_period: BillingPeriod,
    ) {
        let record = PaymentRecord::new(
            user.id.clone(),
            payment.id.clone(),
            payment.total_amount,
            payment.currency.clone(),
            payment.status.as_str(),
        )
        .for_subscription(vendor.id.clone(), plan, billing_period)
        .paid_at(payment.created_at);

        if let Err(e) = self.payments.insert_if_absent(&record).await {
            tracing::warn!(payment_id = %payment.id, error = %e, "Failed to record payment");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{
        catalog, other_user, user, vendor_payment, vendor_subscription, BillingFixture,
    };
    use crate::domain::billing::SubscriptionStatus;
    use crate::ports::{
        CheckoutSessionDetails, PaymentError, PaymentErrorCode, VendorPaymentStatus,
        VendorSubscriptionStatus,
    };

    fn handler(fx: &BillingFixture) -> CompletePaymentHandler {
        let activator = Arc::new(SubscriptionActivator::new(
            fx.subscriptions.clone(),
            fx.credits.clone(),
        ));
        CompletePaymentHandler::new(
            Arc::new(fx.provider.clone()),
            fx.subscriptions.clone(),
            fx.payments.clone(),
            fx.checkout_sessions.clone(),
            activator,
            catalog(),
        )
    }

    fn by_subscription(id: &str) -> CompletePaymentCommand {
        CompletePaymentCommand {
            user: user(),
            subscription_id: Some(id.to_string()),
            payment_id: None,
            session_id: None,
        }
    }

    fn active_creator(id: &str) -> VendorSubscription {
        vendor_subscription(
            id,
            VendorSubscriptionStatus::Active,
            Plan::Creator,
            BillingPeriod::Monthly,
        )
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Activation
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn creator_monthly_activates_and_allocates_grant() {
        let fx = BillingFixture::new();
        fx.provider.add_subscription(active_creator("sub_1"));

        let result = handler(&fx).handle(by_subscription("sub_1")).await.unwrap();

        assert!(result.confirmed);
        assert_eq!(result.credits_allocated, 500);
        let subscription = result.subscription.unwrap();
        assert_eq!(subscription.status, SubscriptionStatus::Active);
        assert_eq!(subscription.plan, Plan::Creator);
        assert_eq!(fx.balance(&user()).await, 500);
    }

    #[tokio::test]
    async fn completing_twice_does_not_double_credit() {
        let fx = BillingFixture::new();
        fx.provider.add_subscription(active_creator("sub_1"));
        let handler = handler(&fx);

        handler.handle(by_subscription("sub_1")).await.unwrap();
        let second = handler.handle(by_subscription("sub_1")).await.unwrap();

        assert!(second.already_processed);
        assert_eq!(second.credits_allocated, 0);
        assert_eq!(fx.balance(&user()).await, 500);
    }

    #[tokio::test]
    async fn pending_vendor_subscription_is_not_confirmed() {
        let fx = BillingFixture::new();
        fx.provider.add_subscription(vendor_subscription(
            "sub_1",
            VendorSubscriptionStatus::Pending,
            Plan::Creator,
            BillingPeriod::Monthly,
        ));

        let result = handler(&fx).handle(by_subscription("sub_1")).await.unwrap();

        assert!(!result.confirmed);
        assert_eq!(fx.balance(&user()).await, 0);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Fallback chain
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn payment_id_resolves_subscription_and_logs_payment() {
        let fx = BillingFixture::new();
        fx.provider.add_subscription(vendor_subscription(
            "sub_1",
            VendorSubscriptionStatus::Pending,
            Plan::Creator,
            BillingPeriod::Monthly,
        ));
        fx.provider.add_payment(vendor_payment(
            "pay_1",
            VendorPaymentStatus::Succeeded,
            Some("sub_1"),
        ));

        let result = handler(&fx)
            .handle(CompletePaymentCommand {
                user: user(),
                subscription_id: None,
                payment_id: Some("pay_1".to_string()),
                session_id: None,
            })
            .await
            .unwrap();

        assert!(result.confirmed);
        let logged = fx.payments.all();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].vendor_payment_id, "pay_1");
        assert_eq!(logged[0].plan, Some(Plan::Creator));
    }

    #[tokio::test]
    async fn session_id_resolves_through_checkout_details() {
        let fx = BillingFixture::new();
        let mut vendor = active_creator("sub_9");
        vendor.metadata.clear();
        fx.provider.add_subscription(vendor);
        fx.provider.add_checkout_session(CheckoutSessionDetails {
            session_id: "cks_1".to_string(),
            subscription_id: Some("sub_9".to_string()),
            payment_id: None,
            metadata: HashMap::from([
                ("plan".to_string(), "creator".to_string()),
                ("billing_period".to_string(), "monthly".to_string()),
            ]),
        });

        let result = handler(&fx)
            .handle(CompletePaymentCommand {
                user: user(),
                subscription_id: None,
                payment_id: None,
                session_id: Some("cks_1".to_string()),
            })
            .await
            .unwrap();

        assert!(result.confirmed);
        assert_eq!(result.credits_allocated, 500);
    }

    #[tokio::test]
    async fn session_without_subscription_yet_is_pending() {
        let fx = BillingFixture::new();
        fx.provider.add_checkout_session(CheckoutSessionDetails {
            session_id: "cks_1".to_string(),
            ..Default::default()
        });

        let result = handler(&fx)
            .handle(CompletePaymentCommand {
                user: user(),
                subscription_id: None,
                payment_id: None,
                session_id: Some("cks_1".to_string()),
            })
            .await
            .unwrap();

        assert!(!result.confirmed);
        assert!(result.subscription.is_none());
    }

    #[tokio::test]
    async fn plan_falls_back_to_product_id() {
        let fx = BillingFixture::new();
        let mut vendor = active_creator("sub_1");
        vendor.metadata.retain(|key, _| key == "user_id");
        vendor.product_id = "pdt_basic_yearly".to_string();
        fx.provider.add_subscription(vendor);

        let result = handler(&fx).handle(by_subscription("sub_1")).await.unwrap();

        let subscription = result.subscription.unwrap();
        assert_eq!(subscription.plan, Plan::Basic);
        assert_eq!(subscription.billing_period, BillingPeriod::Yearly);
        assert_eq!(result.credits_allocated, 1_200);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Failure Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn no_identifier_is_rejected() {
        let fx = BillingFixture::new();
        let result = handler(&fx)
            .handle(CompletePaymentCommand {
                user: user(),
                subscription_id: Some("  ".to_string()),
                payment_id: None,
                session_id: None,
            })
            .await;
        assert_eq!(result, Err(BillingError::MissingIdentifier));
    }

    #[tokio::test]
    async fn metadata_for_another_user_is_forbidden() {
        let fx = BillingFixture::new();
        fx.provider.add_subscription(active_creator("sub_1"));

        let result = handler(&fx)
            .handle(CompletePaymentCommand {
                user: other_user(),
                ..by_subscription("sub_1")
            })
            .await;

        assert_eq!(result, Err(BillingError::OwnershipMismatch));
        assert_eq!(fx.balance(&other_user()).await, 0);
        assert!(fx.subscriptions.is_empty());
    }

    #[tokio::test]
    async fn missing_metadata_and_email_is_unverifiable() {
        let fx = BillingFixture::new();
        let mut vendor = active_creator("sub_1");
        vendor.metadata.clear();
        vendor.customer_email = None;
        fx.provider.add_subscription(vendor);

        let result = handler(&fx).handle(by_subscription("sub_1")).await;

        assert_eq!(result, Err(BillingError::OwnershipUnverifiable));
    }

    #[tokio::test]
    async fn unknown_vendor_subscription_is_not_found() {
        let fx = BillingFixture::new();
        let result = handler(&fx).handle(by_subscription("sub_missing")).await;
        assert!(matches!(result, Err(BillingError::SubscriptionNotFound(_))));
    }

    #[tokio::test]
    async fn vendor_failure_passes_through() {
        let fx = BillingFixture::new();
        fx.provider.set_method_error(
            "get_subscription",
            PaymentError::new(PaymentErrorCode::ProviderError, "upstream exploded").with_status(500),
        );

        let result = handler(&fx).handle(by_subscription("sub_1")).await;

        assert_eq!(
            result,
            Err(BillingError::vendor_failure("upstream exploded", Some(500)))
        );
    }

    #[tokio::test]
    async fn payment_for_another_subscription_does_not_confirm() {
        let fx = BillingFixture::new();
        fx.provider.add_subscription(vendor_subscription(
            "sub_pending",
            VendorSubscriptionStatus::Pending,
            Plan::Creator,
            BillingPeriod::Monthly,
        ));
        fx.provider.add_payment(vendor_payment(
            "pay_other",
            VendorPaymentStatus::Succeeded,
            Some("sub_old"),
        ));

        let result = handler(&fx)
            .handle(CompletePaymentCommand {
                payment_id: Some("pay_other".to_string()),
                ..by_subscription("sub_pending")
            })
            .await
            .unwrap();

        assert!(!result.confirmed);
        assert_eq!(result.credits_allocated, 0);
        assert_eq!(fx.balance(&user()).await, 0);
        assert!(fx.payments.all().is_empty());
    }

    #[tokio::test]
    async fn payment_from_another_customer_does_not_confirm() {
        let fx = BillingFixture::new();
        fx.provider.add_subscription(vendor_subscription(
            "sub_pending",
            VendorSubscriptionStatus::Pending,
            Plan::Creator,
            BillingPeriod::Monthly,
        ));
        let mut payment = vendor_payment(
            "pay_2",
            VendorPaymentStatus::Succeeded,
            Some("sub_pending"),
        );
        payment
            .metadata
            .insert("user_id".to_string(), other_user().id.to_string());
        fx.provider.add_payment(payment);

        let result = handler(&fx)
            .handle(CompletePaymentCommand {
                payment_id: Some("pay_2".to_string()),
                ..by_subscription("sub_pending")
            })
            .await
            .unwrap();

        assert!(!result.confirmed);
        assert_eq!(fx.balance(&user()).await, 0);
    }

    #[tokio::test]
    async fn matching_payment_confirms_pending_subscription() {
        let fx = BillingFixture::new();
        fx.provider.add_subscription(vendor_subscription(
            "sub_pending",
            VendorSubscriptionStatus::Pending,
            Plan::Creator,
            BillingPeriod::Monthly,
        ));
        fx.provider.add_payment(vendor_payment(
            "pay_1",
            VendorPaymentStatus::Succeeded,
            Some("sub_pending"),
        ));

        let result = handler(&fx)
            .handle(CompletePaymentCommand {
                payment_id: Some("pay_1".to_string()),
                ..by_subscription("sub_pending")
            })
            .await
            .unwrap();

        assert!(result.confirmed);
        assert_eq!(result.credits_allocated, 500);
    }
}
