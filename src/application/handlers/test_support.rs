//! Fixtures shared by handler tests.

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapters::dodo::MockPaymentProvider;
use crate::adapters::memory::{
    InMemoryCheckoutSessionRepository, InMemoryCreditPurchaseRepository,
    InMemoryCreditRepository, InMemoryPaymentRepository, InMemorySubscriptionRepository,
    InMemoryTaskRepository, InMemoryWebhookEventRepository,
};
use crate::domain::billing::{BillingPeriod, CreditReason, CreditTransaction, Plan};
use crate::domain::foundation::{AuthenticatedUser, Timestamp, UserId};
use crate::ports::{
    CreditRepository, VendorPayment, VendorPaymentStatus, VendorSubscription,
    VendorSubscriptionStatus,
};

use super::payments::ProductCatalog;

pub fn user() -> AuthenticatedUser {
    AuthenticatedUser::new(UserId::new("user-1").unwrap(), "owner@example.com", None)
}

pub fn other_user() -> AuthenticatedUser {
    AuthenticatedUser::new(UserId::new("user-2").unwrap(), "other@example.com", None)
}

pub fn catalog() -> ProductCatalog {
    ProductCatalog::new(
        HashMap::from([
            ("creator_monthly".to_string(), "pdt_creator_monthly".to_string()),
            ("creator_daily".to_string(), "pdt_creator_daily".to_string()),
            ("professional_monthly".to_string(), "pdt_pro_monthly".to_string()),
            ("basic_yearly".to_string(), "pdt_basic_yearly".to_string()),
        ]),
        HashMap::from([
            ("starter".to_string(), "pdt_credits_starter".to_string()),
            ("popular".to_string(), "pdt_credits_popular".to_string()),
            ("pro".to_string(), "pdt_credits_pro".to_string()),
            ("custom".to_string(), "pdt_credits_dollar".to_string()),
        ]),
    )
}

/// Vendor subscription owned by `user-1` for the given plan.
pub fn vendor_subscription(
    id: &str,
    status: VendorSubscriptionStatus,
    plan: Plan,
    period: BillingPeriod,
) -> VendorSubscription {
    VendorSubscription {
        id: id.to_string(),
        status,
        product_id: format!("pdt_{}_{}", plan, period),
        customer_email: Some("owner@example.com".to_string()),
        metadata: HashMap::from([
            ("user_id".to_string(), "user-1".to_string()),
            ("plan".to_string(), plan.as_str().to_string()),
            ("billing_period".to_string(), period.as_str().to_string()),
        ]),
        next_billing_date: Some(Timestamp::now().add_days(30)),
        cancel_at_next_billing_date: false,
    }
}

/// Vendor payment owned by `user-1`.
pub fn vendor_payment(
    id: &str,
    status: VendorPaymentStatus,
    subscription_id: Option<&str>,
) -> VendorPayment {
    VendorPayment {
        id: id.to_string(),
        status,
        subscription_id: subscription_id.map(str::to_string),
        total_amount: 2_900,
        currency: "USD".to_string(),
        customer_email: Some("owner@example.com".to_string()),
        metadata: HashMap::from([("user_id".to_string(), "user-1".to_string())]),
        created_at: Some(Timestamp::now()),
    }
}

/// Mock vendor plus one of every in-memory store.
pub struct BillingFixture {
    pub provider: MockPaymentProvider,
    pub credits: Arc<InMemoryCreditRepository>,
    pub subscriptions: Arc<InMemorySubscriptionRepository>,
    pub payments: Arc<InMemoryPaymentRepository>,
    pub checkout_sessions: Arc<InMemoryCheckoutSessionRepository>,
    pub purchases: Arc<InMemoryCreditPurchaseRepository>,
    pub webhooks: Arc<InMemoryWebhookEventRepository>,
    pub tasks: Arc<InMemoryTaskRepository>,
}

impl BillingFixture {
    pub fn new() -> Self {
        Self {
            provider: MockPaymentProvider::new(),
            credits: Arc::new(InMemoryCreditRepository::new()),
            subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
            payments: Arc::new(InMemoryPaymentRepository::new()),
            checkout_sessions: Arc::new(InMemoryCheckoutSessionRepository::new()),
            purchases: Arc::new(InMemoryCreditPurchaseRepository::new()),
            webhooks: Arc::new(InMemoryWebhookEventRepository::new()),
            tasks: Arc::new(InMemoryTaskRepository::new()),
        }
    }

    pub async fn balance(&self, user: &AuthenticatedUser) -> i64 {
        self.credits
            .balance(&user.id, Timestamp::now())
            .await
            .unwrap()
            .total
    }

    /// Grants non-expiring credits to a user.
    pub async fn grant(&self, user: &AuthenticatedUser, amount: i64) {
        let entry = CreditTransaction::credit(
            user.id.clone(),
            amount,
            CreditReason::Adjustment,
            "Test grant",
            None,
        )
        .unwrap();
        self.credits.record(&entry).await.unwrap();
    }
}
