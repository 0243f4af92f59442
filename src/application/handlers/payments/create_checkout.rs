//! CreateCheckoutHandler - starts a hosted subscription checkout.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::billing::{BillingError, BillingPeriod, Plan};
use crate::domain::foundation::AuthenticatedUser;
use crate::ports::{
    CheckoutSessionRecord, CheckoutSessionRepository, CreateCheckoutRequest, PaymentProvider,
};

use super::ProductCatalog;

/// Command to create a subscription checkout.
#[derive(Debug, Clone)]
pub struct CreateCheckoutCommand {
    pub user: AuthenticatedUser,
    pub plan: String,
    pub billing_period: String,
    /// Public origin the vendor should send the browser back to.
    pub return_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCheckoutResult {
    pub checkout_url: String,
    pub session_id: String,
    pub plan: Plan,
    pub billing_period: BillingPeriod,
}

/// Creates a vendor checkout session for a plan.
///
/// The vendor call is bounded by a timeout so a slow vendor surfaces as a
/// retryable error instead of a hung request. The session → plan mapping
/// is saved best effort for the completion flow.
pub struct CreateCheckoutHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    checkout_sessions: Arc<dyn CheckoutSessionRepository>,
    catalog: ProductCatalog,
    timeout: Duration,
}

impl CreateCheckoutHandler {
    pub fn new(
        payment_provider: Arc<dyn PaymentProvider>,
        checkout_sessions: Arc<dyn CheckoutSessionRepository>,
        catalog: ProductCatalog,
        timeout: Duration,
    ) -> Self {
        Self {
            payment_provider,
            checkout_sessions,
            catalog,
            timeout,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutCommand,
    ) -> Result<CreateCheckoutResult, BillingError> {
        // 1. Validate against the plan table
        let plan: Plan = cmd.plan.parse()?;
        let billing_period: BillingPeriod = cmd.billing_period.parse()?;

        // 2. Resolve the vendor product
        let product_id = self.catalog.subscription_product(plan, billing_period)?;

        // 3. Create the session, racing the timeout
        let metadata = HashMap::from([
            ("user_id".to_string(), cmd.user.id.to_string()),
            ("plan".to_string(), plan.as_str().to_string()),
            ("billing_period".to_string(), billing_period.as_str().to_string()),
        ]);
        let request = CreateCheckoutRequest {
            product_id: product_id.to_string(),
            quantity: 1,
            customer_email: cmd.user.email.clone(),
            customer_name: cmd.user.display_name.clone(),
            return_url: format!(
                "{}/payment/success?plan={}&period={}",
                cmd.return_base_url.trim_end_matches('/'),
                plan,
                billing_period
            ),
            metadata,
        };

        let session = tokio::time::timeout(self.timeout, self.payment_provider.create_checkout(request))
            .await
            .map_err(|_| {
                tracing::warn!(
                    user_id = %cmd.user.id,
                    timeout_secs = self.timeout.as_secs(),
                    "Checkout creation timed out"
                );
                BillingError::VendorTimeout
            })??;

        // 4. Remember the session for reconciliation
        let record = CheckoutSessionRecord::new(
            session.session_id.clone(),
            cmd.user.id.clone(),
            plan,
            billing_period,
        );
        if let Err(e) = self.checkout_sessions.save(&record).await {
            tracing::warn!(
                session_id = %session.session_id,
                error = %e,
                "Failed to store checkout session mapping"
            );
        }

        tracing::info!(
            user_id = %cmd.user.id,
            session_id = %session.session_id,
            plan = %plan,
            billing_period = %billing_period,
            "Checkout session created"
        );

        Ok(CreateCheckoutResult {
            checkout_url: session.checkout_url,
            session_id: session.session_id,
            plan,
            billing_period,
        })
    }
}
