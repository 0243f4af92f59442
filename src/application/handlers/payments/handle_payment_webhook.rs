//! HandlePaymentWebhookHandler - applies vendor webhook deliveries.

use std::sync::Arc;

use crate::application::handlers::credits::PurchaseFulfiller;
use crate::domain::billing::{
    BillingError, BillingPeriod, CreditPurchase, PaymentRecord, Plan, PurchaseStatus,
};
use crate::domain::foundation::{PurchaseId, UserId};
use crate::ports::{
    CreditPurchaseRepository, PaymentProvider, PaymentRepository, SubscriptionRepository,
    VendorPayment, VendorSubscription, WebhookEvent, WebhookEventData, WebhookEventRecord,
    WebhookEventRepository, WebhookHeaders, WebhookOutcome,
};

use super::products::plan_from_metadata;
use super::{Activation, ProductCatalog, SubscriptionActivator};

/// Command to handle a payment webhook.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    pub headers: WebhookHeaders,
    /// Raw request body, exactly as signed.
    pub payload: Vec<u8>,
}

/// Result of webhook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlePaymentWebhookResult {
    /// The event changed local state.
    Processed { event_type: String },
    /// The event was understood but needed no action.
    Ignored { event_type: String, reason: String },
    /// This delivery id was handled before.
    Duplicate,
}

/// Handler for Dodo Payments webhooks.
///
/// Deliveries are deduplicated by `webhook-id`. A delivery that fails is
/// not recorded, so the vendor's retry runs it again.
pub struct HandlePaymentWebhookHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    webhook_events: Arc<dyn WebhookEventRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    payments: Arc<dyn PaymentRepository>,
    purchases: Arc<dyn CreditPurchaseRepository>,
    activator: Arc<SubscriptionActivator>,
    fulfiller: Arc<PurchaseFulfiller>,
    catalog: ProductCatalog,
}

enum Handled {
    Processed,
    Ignored(String),
}

impl HandlePaymentWebhookHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        payment_provider: Arc<dyn PaymentProvider>,
        webhook_events: Arc<dyn WebhookEventRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        payments: Arc<dyn PaymentRepository>,
        purchases: Arc<dyn CreditPurchaseRepository>,
        activator: Arc<SubscriptionActivator>,
        fulfiller: Arc<PurchaseFulfiller>,
        catalog: ProductCatalog,
    ) -> Self {
        Self {
            payment_provider,
            webhook_events,
            subscriptions,
            payments,
            purchases,
            activator,
            fulfiller,
            catalog,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<HandlePaymentWebhookResult, BillingError> {
        // 1. Verify signature and parse
        let event = self
            .payment_provider
            .verify_webhook(&cmd.headers, &cmd.payload)
            .await
            .map_err(|e| {
                tracing::warn!(webhook_id = %cmd.headers.id, error = %e, "Webhook rejected");
                BillingError::InvalidWebhookSignature
            })?;

        // 2. Deduplicate
        if self.webhook_events.find_by_event_id(&event.id).await?.is_some() {
            tracing::debug!(webhook_id = %event.id, "Duplicate webhook delivery");
            return Ok(HandlePaymentWebhookResult::Duplicate);
        }

        // 3. Dispatch
        let handled = match self.dispatch(&event).await {
            Ok(handled) => handled,
            Err(e) => {
                tracing::error!(
                    webhook_id = %event.id,
                    event_type = %event.event_type,
                    error = %e,
                    "Webhook processing failed"
                );
                return Err(e);
            }
        };

        // 4. Record the delivery
        let event_type = event.event_type.clone();
        let (outcome, result) = match handled {
            Handled::Processed => (
                WebhookOutcome::Processed,
                HandlePaymentWebhookResult::Processed { event_type },
            ),
            Handled::Ignored(reason) => (
                WebhookOutcome::Ignored(reason.clone()),
                HandlePaymentWebhookResult::Ignored { event_type, reason },
            ),
        };
        let record = WebhookEventRecord::new(&event, outcome);

        if !self.webhook_events.save(record).await?.is_inserted() {
            return Ok(HandlePaymentWebhookResult::Duplicate);
        }

        tracing::info!(webhook_id = %event.id, event_type = %event.event_type, "Webhook handled");
        Ok(result)
    }

    async fn dispatch(&self, event: &WebhookEvent) -> Result<Handled, BillingError> {
        match (event.event_type.as_str(), &event.data) {
            (
                "subscription.active" | "subscription.renewed" | "subscription.plan_changed",
                WebhookEventData::Subscription(sub),
            ) => self.activate(sub).await,
            (
                "subscription.cancelled" | "subscription.expired" | "subscription.failed",
                WebhookEventData::Subscription(sub),
            ) => self.cancel(sub).await,
            ("payment.succeeded", WebhookEventData::Payment(payment)) => {
                self.payment_succeeded(payment).await
            }
            ("payment.failed", WebhookEventData::Payment(payment)) => {
                self.payment_failed(payment).await
            }
            (other, _) => Ok(Handled::Ignored(format!("Unhandled event type: {}", other))),
        }
    }

    async fn activate(&self, sub: &VendorSubscription) -> Result<Handled, BillingError> {
        let local = self.subscriptions.find_by_vendor_id(&sub.id).await?;

        let user_id = match sub.metadata_user_id().and_then(|id| UserId::new(id).ok()) {
            Some(id) => id,
            None => match &local {
                Some(row) => row.user_id.clone(),
                None => return Ok(Handled::Ignored("No user for subscription".to_string())),
            },
        };

        let plan_and_period = plan_from_metadata(&sub.metadata)
            .or_else(|| self.catalog.plan_for_product(&sub.product_id))
            .or_else(|| local.as_ref().map(|row| (row.plan, row.billing_period)));
        let (plan, billing_period) = match plan_and_period {
            Some(found) => found,
            None => return Ok(Handled::Ignored(format!("Unknown product {}", sub.product_id))),
        };

        self.activator
            .apply(Activation {
                user_id: &user_id,
                plan,
                billing_period,
                vendor: sub,
                payment_succeeded: false,
            })
            .await?;
        Ok(Handled::Processed)
    }

    async fn cancel(&self, sub: &VendorSubscription) -> Result<Handled, BillingError> {
        let mut local = match self.subscriptions.find_by_vendor_id(&sub.id).await? {
            Some(row) => row,
            None => return Ok(Handled::Ignored("Unknown subscription".to_string())),
        };
        local.cancel();
        self.subscriptions.upsert(&local).await?;
        tracing::info!(user_id = %local.user_id, subscription_id = %sub.id, "Subscription cancelled");
        Ok(Handled::Processed)
    }

    async fn payment_succeeded(&self, payment: &VendorPayment) -> Result<Handled, BillingError> {
        if let Some(mut purchase) = self.purchase_for(payment).await? {
            self.log_payment(&purchase.user_id, payment, None).await?;
            if purchase.status == PurchaseStatus::Failed {
                tracing::warn!(purchase_id = %purchase.id, payment_id = %payment.id, "Payment succeeded for a failed purchase");
                return Ok(Handled::Ignored("Purchase already failed".to_string()));
            }
            self.fulfiller.fulfill(&mut purchase, &payment.id).await?;
            return Ok(Handled::Processed);
        }

        match self.owner_of(payment).await? {
            Some((user_id, plan)) => {
                self.log_payment(&user_id, payment, plan).await?;
                Ok(Handled::Processed)
            }
            None => Ok(Handled::Ignored("No user for payment".to_string())),
        }
    }

    async fn payment_failed(&self, payment: &VendorPayment) -> Result<Handled, BillingError> {
        if let Some(mut purchase) = self.purchase_for(payment).await? {
            purchase.fail();
            self.purchases.update(&purchase).await?;
            self.log_payment(&purchase.user_id, payment, None).await?;
            tracing::info!(purchase_id = %purchase.id, payment_id = %payment.id, "Credit purchase failed");
            return Ok(Handled::Processed);
        }

        match self.owner_of(payment).await? {
            Some((user_id, plan)) => {
                self.log_payment(&user_id, payment, plan).await?;
                Ok(Handled::Processed)
            }
            None => Ok(Handled::Ignored("No user for payment".to_string())),
        }
    }

    /// The credit purchase a payment settles, from its `purchase_id` metadata.
    async fn purchase_for(
        &self,
        payment: &VendorPayment,
    ) -> Result<Option<CreditPurchase>, BillingError> {
        let Some(id) = payment
            .metadata
            .get("purchase_id")
            .and_then(|id| id.parse::<PurchaseId>().ok())
        else {
            return Ok(None);
        };
        Ok(self.purchases.find(&id).await?)
    }

    /// Owner and plan of a subscription payment.
    async fn owner_of(
        &self,
        payment: &VendorPayment,
    ) -> Result<Option<(UserId, Option<(Plan, BillingPeriod)>)>, BillingError> {
        let local = match &payment.subscription_id {
            Some(id) => self.subscriptions.find_by_vendor_id(id).await?,
            None => None,
        };
        let plan = local.as_ref().map(|row| (row.plan, row.billing_period));

        let user_id = payment
            .metadata_user_id()
            .and_then(|id| UserId::new(id).ok())
            .or_else(|| local.map(|row| row.user_id));
        Ok(user_id.map(|id| (id, plan)))
    }

    async fn log_payment(
        &self,
        user_id: &UserId,
        payment: &VendorPayment,
        plan: Option<(Plan, BillingPeriod)>,
    ) -> Result<(), BillingError> {
        let mut record = PaymentRecord::new(
            user_id.clone(),
            payment.id.clone(),
            payment.total_amount,
            payment.currency.clone(),
            payment.status.as_str(),
        )
        .paid_at(payment.created_at.filter(|_| payment.is_succeeded()));
        if let (Some(subscription_id), Some((plan, period))) = (&payment.subscription_id, plan) {
            record = record.for_subscription(subscription_id.clone(), plan, period);
        }
        self.payments.insert_if_absent(&record).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{
        catalog, user, vendor_payment, vendor_subscription, BillingFixture,
    };
    use crate::domain::billing::{CreditPackage, PackageType, SubscriptionStatus};
    use crate::ports::{VendorPaymentStatus, VendorSubscriptionStatus};
    use crate::adapters::dodo::MockPaymentProvider;

    fn handler(fx: &BillingFixture) -> HandlePaymentWebhookHandler {
        handler_with(fx, fx.provider.clone())
    }

    fn handler_with(fx: &BillingFixture, provider: MockPaymentProvider) -> HandlePaymentWebhookHandler {
        HandlePaymentWebhookHandler::new(
            Arc::new(provider),
            fx.webhooks.clone(),
            fx.subscriptions.clone(),
            fx.payments.clone(),
            fx.purchases.clone(),
            Arc::new(SubscriptionActivator::new(
                fx.subscriptions.clone(),
                fx.credits.clone(),
            )),
            Arc::new(PurchaseFulfiller::new(fx.purchases.clone(), fx.credits.clone())),
            catalog(),
        )
    }

    fn delivery(id: &str) -> HandlePaymentWebhookCommand {
        HandlePaymentWebhookCommand {
            headers: WebhookHeaders {
                id: id.to_string(),
                timestamp: "1700000000".to_string(),
                signature: "v1,sig".to_string(),
            },
            payload: b"{}".to_vec(),
        }
    }

    fn event(id: &str, event_type: &str, data: WebhookEventData) -> WebhookEvent {
        WebhookEvent {
            id: id.to_string(),
            event_type: event_type.to_string(),
            data,
            payload: serde_json::json!({"type": event_type}),
        }
    }

    fn active_creator() -> VendorSubscription {
        vendor_subscription(
            "sub_1",
            VendorSubscriptionStatus::Active,
            Plan::Creator,
            BillingPeriod::Monthly,
        )
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Subscription events
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn subscription_active_allocates_credits() {
        let fx = BillingFixture::new();
        fx.provider.set_webhook_event(event(
            "msg_1",
            "subscription.active",
            WebhookEventData::Subscription(active_creator()),
        ));

        let result = handler(&fx).handle(delivery("msg_1")).await.unwrap();

        assert_eq!(
            result,
            HandlePaymentWebhookResult::Processed {
                event_type: "subscription.active".to_string()
            }
        );
        assert_eq!(fx.balance(&user()).await, 500);
        assert_eq!(fx.webhooks.len(), 1);
    }

    #[tokio::test]
    async fn redelivery_is_a_duplicate() {
        let fx = BillingFixture::new();
        fx.provider.set_webhook_event(event(
            "msg_1",
            "subscription.active",
            WebhookEventData::Subscription(active_creator()),
        ));
        let handler = handler(&fx);

        handler.handle(delivery("msg_1")).await.unwrap();
        let second = handler.handle(delivery("msg_1")).await.unwrap();

        assert_eq!(second, HandlePaymentWebhookResult::Duplicate);
        assert_eq!(fx.balance(&user()).await, 500);
    }

    #[tokio::test]
    async fn webhook_and_return_flow_share_the_allocation_key() {
        let fx = BillingFixture::new();
        let handler = handler(&fx);
        fx.provider.set_webhook_event(event(
            "msg_1",
            "subscription.active",
            WebhookEventData::Subscription(active_creator()),
        ));
        handler.handle(delivery("msg_1")).await.unwrap();

        // A different delivery for the same period grants nothing more
        fx.provider.set_webhook_event(event(
            "msg_2",
            "subscription.renewed",
            WebhookEventData::Subscription(active_creator()),
        ));
        handler.handle(delivery("msg_2")).await.unwrap();

        assert_eq!(fx.balance(&user()).await, 500);
    }

    #[tokio::test]
    async fn subscription_cancelled_marks_local_row() {
        let fx = BillingFixture::new();
        let handler = handler(&fx);
        fx.provider.set_webhook_event(event(
            "msg_1",
            "subscription.active",
            WebhookEventData::Subscription(active_creator()),
        ));
        handler.handle(delivery("msg_1")).await.unwrap();

        fx.provider.set_webhook_event(event(
            "msg_2",
            "subscription.cancelled",
            WebhookEventData::Subscription(active_creator()),
        ));
        handler.handle(delivery("msg_2")).await.unwrap();

        let row = fx
            .subscriptions
            .find_by_user(&user().id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, SubscriptionStatus::Cancelled);
    }

    #[tokio::test]
    async fn cancellation_of_unknown_subscription_is_ignored() {
        let fx = BillingFixture::new();
        fx.provider.set_webhook_event(event(
            "msg_1",
            "subscription.expired",
            WebhookEventData::Subscription(active_creator()),
        ));

        let result = handler(&fx).handle(delivery("msg_1")).await.unwrap();

        assert!(matches!(result, HandlePaymentWebhookResult::Ignored { .. }));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Payment events
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn payment_succeeded_fulfills_credit_purchase() {
        let fx = BillingFixture::new();
        let package = CreditPackage::find(PackageType::Starter).unwrap();
        let purchase = CreditPurchase::new(user().id, &package);
        fx.purchases.create(&purchase).await.unwrap();

        let mut payment = vendor_payment("pay_1", VendorPaymentStatus::Succeeded, None);
        payment
            .metadata
            .insert("purchase_id".to_string(), purchase.id.to_string());
        fx.provider.set_webhook_event(event(
            "msg_1",
            "payment.succeeded",
            WebhookEventData::Payment(payment),
        ));

        handler(&fx).handle(delivery("msg_1")).await.unwrap();

        assert_eq!(fx.balance(&user()).await, 500);
        let stored = fx.purchases.find(&purchase.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PurchaseStatus::Completed);
        assert_eq!(fx.payments.all().len(), 1);
    }

    #[tokio::test]
    async fn payment_failed_marks_purchase_failed() {
        let fx = BillingFixture::new();
        let package = CreditPackage::find(PackageType::Pro).unwrap();
        let purchase = CreditPurchase::new(user().id, &package);
        fx.purchases.create(&purchase).await.unwrap();

        let mut payment = vendor_payment("pay_1", VendorPaymentStatus::Failed, None);
        payment
            .metadata
            .insert("purchase_id".to_string(), purchase.id.to_string());
        fx.provider.set_webhook_event(event(
            "msg_1",
            "payment.failed",
            WebhookEventData::Payment(payment),
        ));

        handler(&fx).handle(delivery("msg_1")).await.unwrap();

        let stored = fx.purchases.find(&purchase.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PurchaseStatus::Failed);
        assert_eq!(fx.balance(&user()).await, 0);
        assert!(fx.payments.all()[0].paid_at.is_none());
    }

    #[tokio::test]
    async fn subscription_payment_is_logged_with_plan() {
        let fx = BillingFixture::new();
        let handler = handler(&fx);
        fx.provider.set_webhook_event(event(
            "msg_1",
            "subscription.active",
            WebhookEventData::Subscription(active_creator()),
        ));
        handler.handle(delivery("msg_1")).await.unwrap();

        fx.provider.set_webhook_event(event(
            "msg_2",
            "payment.succeeded",
            WebhookEventData::Payment(vendor_payment(
                "pay_1",
                VendorPaymentStatus::Succeeded,
                Some("sub_1"),
            )),
        ));
        handler.handle(delivery("msg_2")).await.unwrap();

        let logged = fx.payments.all();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].plan, Some(Plan::Creator));
        assert!(logged[0].is_succeeded());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Other events and failures
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn unknown_event_is_recorded_as_ignored() {
        let fx = BillingFixture::new();
        fx.provider.set_webhook_event(event("msg_1", "dispute.opened", WebhookEventData::Other));

        let result = handler(&fx).handle(delivery("msg_1")).await.unwrap();

        assert!(matches!(result, HandlePaymentWebhookResult::Ignored { .. }));
        let record = fx.webhooks.find_by_event_id("msg_1").await.unwrap().unwrap();
        assert!(matches!(record.outcome, WebhookOutcome::Ignored(_)));
    }

    #[tokio::test]
    async fn bad_signature_is_rejected() {
        let fx = BillingFixture::new();
        let handler = handler_with(&fx, MockPaymentProvider::rejecting_webhooks());

        let result = handler.handle(delivery("msg_1")).await;

        assert_eq!(result, Err(BillingError::InvalidWebhookSignature));
        assert!(fx.webhooks.is_empty());
    }
}
