//! Shared application state for the HTTP adapters.

use std::sync::Arc;
use std::time::Duration;

use crate::application::handlers::credits::{
    CompleteCreditPurchaseHandler, GetCreditBalanceHandler, GetCreditHistoryHandler,
    ListCreditPackagesHandler, PurchaseCreditsHandler, PurchaseFulfiller,
};
use crate::application::handlers::payments::{
    CancelSubscriptionHandler, CompletePaymentHandler, CreateCheckoutHandler,
    GetPaymentHistoryHandler, GetSubscriptionHandler, HandlePaymentWebhookHandler,
    PreviewPlanChangeHandler, ProductCatalog, SubscriptionActivator,
};
use crate::application::handlers::tasks::{
    EnhancementProviders, GetTaskStatusHandler, ListTasksHandler, SubmitEnhancementHandler,
};
use crate::ports::{
    CheckoutSessionRepository, CreditPurchaseRepository, CreditRepository, PaymentProvider,
    PaymentRepository, SubscriptionRepository, TaskRepository, WebhookEventRepository,
};

/// Dependencies shared by every request.
///
/// Cloned per request; everything inside is `Arc`-backed or small.
#[derive(Clone)]
pub struct AppState {
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub credits: Arc<dyn CreditRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub checkout_sessions: Arc<dyn CheckoutSessionRepository>,
    pub purchases: Arc<dyn CreditPurchaseRepository>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub providers: EnhancementProviders,
    pub catalog: ProductCatalog,
    pub checkout_timeout: Duration,
    /// Public base URL used when the request origin is local or missing.
    pub app_url: Option<String>,
}

impl AppState {
    // ── Payments ──────────────────────────────────────────────────────────────

    fn activator(&self) -> Arc<SubscriptionActivator> {
        Arc::new(SubscriptionActivator::new(
            self.subscriptions.clone(),
            self.credits.clone(),
        ))
    }

    pub fn create_checkout_handler(&self) -> CreateCheckoutHandler {
        CreateCheckoutHandler::new(
            self.payment_provider.clone(),
            self.checkout_sessions.clone(),
            self.catalog.clone(),
            self.checkout_timeout,
        )
    }

    pub fn complete_payment_handler(&self) -> CompletePaymentHandler {
        CompletePaymentHandler::new(
            self.payment_provider.clone(),
            self.subscriptions.clone(),
            self.payments.clone(),
            self.checkout_sessions.clone(),
            self.activator(),
            self.catalog.clone(),
        )
    }

    pub fn webhook_handler(&self) -> HandlePaymentWebhookHandler {
        HandlePaymentWebhookHandler::new(
            self.payment_provider.clone(),
            self.webhook_events.clone(),
            self.subscriptions.clone(),
            self.payments.clone(),
            self.purchases.clone(),
            self.activator(),
            self.fulfiller(),
            self.catalog.clone(),
        )
    }

    pub fn cancel_subscription_handler(&self) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(self.payment_provider.clone(), self.subscriptions.clone())
    }

    pub fn get_subscription_handler(&self) -> GetSubscriptionHandler {
        GetSubscriptionHandler::new(self.subscriptions.clone())
    }

    pub fn payment_history_handler(&self) -> GetPaymentHistoryHandler {
        GetPaymentHistoryHandler::new(self.payments.clone())
    }

    pub fn preview_plan_change_handler(&self) -> PreviewPlanChangeHandler {
        PreviewPlanChangeHandler::new(self.subscriptions.clone())
    }

    // ── Credits ───────────────────────────────────────────────────────────────

    fn fulfiller(&self) -> Arc<PurchaseFulfiller> {
        Arc::new(PurchaseFulfiller::new(
            self.purchases.clone(),
            self.credits.clone(),
        ))
    }

    pub fn credit_balance_handler(&self) -> GetCreditBalanceHandler {
        GetCreditBalanceHandler::new(self.credits.clone())
    }

    pub fn credit_history_handler(&self) -> GetCreditHistoryHandler {
        GetCreditHistoryHandler::new(self.credits.clone())
    }

    pub fn credit_packages_handler(&self) -> ListCreditPackagesHandler {
        ListCreditPackagesHandler::new(self.catalog.clone())
    }

    pub fn purchase_credits_handler(&self) -> PurchaseCreditsHandler {
        PurchaseCreditsHandler::new(
            self.payment_provider.clone(),
            self.purchases.clone(),
            self.catalog.clone(),
            self.checkout_timeout,
        )
    }

    pub fn complete_credit_purchase_handler(&self) -> CompleteCreditPurchaseHandler {
        CompleteCreditPurchaseHandler::new(
            self.payment_provider.clone(),
            self.purchases.clone(),
            self.fulfiller(),
        )
    }

    // ── Tasks ─────────────────────────────────────────────────────────────────

    pub fn submit_enhancement_handler(&self) -> SubmitEnhancementHandler {
        SubmitEnhancementHandler::new(
            self.tasks.clone(),
            self.credits.clone(),
            self.providers.clone(),
        )
    }

    pub fn task_status_handler(&self) -> GetTaskStatusHandler {
        GetTaskStatusHandler::new(
            self.tasks.clone(),
            self.credits.clone(),
            self.providers.clone(),
        )
    }

    pub fn list_tasks_handler(&self) -> ListTasksHandler {
        ListTasksHandler::new(self.tasks.clone())
    }
}
