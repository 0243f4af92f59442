//! State fixture for router tests.

use std::sync::Arc;
use std::time::Duration;

use crate::adapters::dodo::MockPaymentProvider;
use crate::adapters::enhancement::MockEnhancementProvider;
use crate::adapters::memory::{
    InMemoryCheckoutSessionRepository, InMemoryCreditPurchaseRepository,
    InMemoryCreditRepository, InMemoryPaymentRepository, InMemorySubscriptionRepository,
    InMemoryTaskRepository, InMemoryWebhookEventRepository,
};
use crate::application::handlers::payments::ProductCatalog;
use crate::application::handlers::tasks::EnhancementProviders;
use crate::domain::enhancement::ProviderKind;
use crate::ports::EnhancementProvider;

use super::state::AppState;

/// Empty in-memory stores, a mock vendor and mock providers.
pub fn test_state() -> AppState {
    let providers: Vec<Arc<dyn EnhancementProvider>> = vec![
        Arc::new(MockEnhancementProvider::new(ProviderKind::Replicate)),
        Arc::new(MockEnhancementProvider::new(ProviderKind::RunningHub)),
    ];

    AppState {
        payment_provider: Arc::new(MockPaymentProvider::new()),
        credits: Arc::new(InMemoryCreditRepository::new()),
        subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
        payments: Arc::new(InMemoryPaymentRepository::new()),
        checkout_sessions: Arc::new(InMemoryCheckoutSessionRepository::new()),
        purchases: Arc::new(InMemoryCreditPurchaseRepository::new()),
        webhook_events: Arc::new(InMemoryWebhookEventRepository::new()),
        tasks: Arc::new(InMemoryTaskRepository::new()),
        providers: EnhancementProviders::new(providers),
        catalog: ProductCatalog::default(),
        checkout_timeout: Duration::from_secs(5),
        app_url: Some("https://sharpii.test".to_string()),
    }
}
