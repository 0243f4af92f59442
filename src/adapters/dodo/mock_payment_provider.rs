//! In-memory Dodo Payments stand-in.
//!
//! Seed it with vendor objects, inject a failure per method, slow down
//! checkout creation, then assert on what the handlers asked for.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::ports::{
    CheckoutSession, CheckoutSessionDetails, CreateCheckoutRequest, PaymentError, PaymentProvider,
    VendorPayment, VendorSubscription, WebhookEvent, WebhookHeaders,
};

/// Cheap to clone; clones share the same vendor state.
///
/// ```ignore
/// let vendor = MockPaymentProvider::new();
/// vendor.add_subscription(active_creator_subscription());
/// vendor.set_method_error("get_payment", PaymentError::network("reset"));
/// ```
#[derive(Default, Clone)]
pub struct MockPaymentProvider {
    state: Arc<Mutex<VendorState>>,
}

#[derive(Default)]
struct VendorState {
    subscriptions: HashMap<String, VendorSubscription>,
    payments: HashMap<String, VendorPayment>,
    sessions: HashMap<String, CheckoutSessionDetails>,
    checkouts: Vec<CreateCheckoutRequest>,
    webhook: Option<WebhookEvent>,
    reject_webhooks: bool,
    failures: HashMap<String, PaymentError>,
    checkout_delay: Option<Duration>,
    calls: Vec<&'static str>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every webhook fails signature verification.
    pub fn rejecting_webhooks() -> Self {
        let vendor = Self::new();
        vendor.state().reject_webhooks = true;
        vendor
    }

    pub fn add_subscription(&self, subscription: VendorSubscription) {
        self.state()
            .subscriptions
            .insert(subscription.id.clone(), subscription);
    }

    pub fn add_payment(&self, payment: VendorPayment) {
        self.state().payments.insert(payment.id.clone(), payment);
    }

    pub fn add_checkout_session(&self, details: CheckoutSessionDetails) {
        self.state()
            .sessions
            .insert(details.session_id.clone(), details);
    }

    /// Event handed back by the next successful `verify_webhook`.
    pub fn set_webhook_event(&self, event: WebhookEvent) {
        self.state().webhook = Some(event);
    }

    /// `method` is the `PaymentProvider` method name, e.g. `"create_checkout"`.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.state().failures.insert(method.to_string(), error);
    }

    pub fn set_checkout_delay(&self, delay: Duration) {
        self.state().checkout_delay = Some(delay);
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.call_count(method) > 0
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state().calls.iter().filter(|m| **m == method).count()
    }

    /// Checkout requests in the order they arrived.
    pub fn checkout_requests(&self) -> Vec<CreateCheckoutRequest> {
        self.state().checkouts.clone()
    }

    fn state(&self) -> MutexGuard<'_, VendorState> {
        self.state.lock().unwrap()
    }

    /// Logs the call and returns the injected failure, if any.
    fn begin(&self, method: &'static str) -> Result<MutexGuard<'_, VendorState>, PaymentError> {
        let mut state = self.state();
        state.calls.push(method);
        match state.failures.get(method) {
            Some(error) => Err(error.clone()),
            None => Ok(state),
        }
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_checkout(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let delay = self.begin("create_checkout")?.checkout_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        let session_id = format!("cks_mock_{}", state.checkouts.len() + 1);
        state.sessions.insert(
            session_id.clone(),
            CheckoutSessionDetails {
                session_id: session_id.clone(),
                metadata: request.metadata.clone(),
                ..Default::default()
            },
        );
        state.checkouts.push(request);

        Ok(CheckoutSession {
            checkout_url: format!("https://checkout.mock/{}", session_id),
            session_id,
        })
    }

    async fn get_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CheckoutSessionDetails>, PaymentError> {
        Ok(self
            .begin("get_checkout_session")?
            .sessions
            .get(session_id)
            .cloned())
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<VendorSubscription>, PaymentError> {
        Ok(self
            .begin("get_subscription")?
            .subscriptions
            .get(subscription_id)
            .cloned())
    }

    async fn get_payment(&self, payment_id: &str) -> Result<Option<VendorPayment>, PaymentError> {
        Ok(self.begin("get_payment")?.payments.get(payment_id).cloned())
    }

    async fn cancel_at_period_end(
        &self,
        subscription_id: &str,
    ) -> Result<VendorSubscription, PaymentError> {
        let mut state = self.begin("cancel_at_period_end")?;
        let subscription = state
            .subscriptions
            .get_mut(subscription_id)
            .ok_or_else(|| PaymentError::not_found("Subscription"))?;
        subscription.cancel_at_next_billing_date = true;
        Ok(subscription.clone())
    }

    async fn verify_webhook(
        &self,
        _headers: &WebhookHeaders,
        _payload: &[u8],
    ) -> Result<WebhookEvent, PaymentError> {
        let state = self.begin("verify_webhook")?;
        if state.reject_webhooks {
            return Err(PaymentError::invalid_webhook("signature mismatch"));
        }
        state
            .webhook
            .clone()
            .ok_or_else(|| PaymentError::invalid_webhook("no event queued"))
    }
}
