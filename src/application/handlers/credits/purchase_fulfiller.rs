//! PurchaseFulfiller - grants the credits of a paid purchase exactly once.

use std::sync::Arc;

use crate::domain::billing::{keys, BillingError, CreditPurchase, CreditReason, CreditTransaction};
use crate::ports::{CreditPurchaseRepository, CreditRepository};

/// Shared by the purchase completion endpoint and the payment webhook.
pub struct PurchaseFulfiller {
    purchases: Arc<dyn CreditPurchaseRepository>,
    credits: Arc<dyn CreditRepository>,
}

impl PurchaseFulfiller {
    pub fn new(
        purchases: Arc<dyn CreditPurchaseRepository>,
        credits: Arc<dyn CreditRepository>,
    ) -> Self {
        Self { purchases, credits }
    }

    /// Marks the purchase completed and records its credits.
    ///
    /// Returns the credits granted by this call, zero when an earlier call
    /// already granted them. Purchased credits never expire.
    pub async fn fulfill(
        &self,
        purchase: &mut CreditPurchase,
        vendor_payment_id: &str,
    ) -> Result<i64, BillingError> {
        let newly_completed = purchase.complete(vendor_payment_id)?;

        // Ledger first: if the status update fails, a retry completes the
        // purchase again and the key suppresses the second grant.
        let entry = CreditTransaction::credit(
            purchase.user_id.clone(),
            purchase.credits,
            CreditReason::Purchase,
            format!("Purchased {} credits ({})", purchase.credits, purchase.package_type),
            None,
        )?
        .with_idempotency_key(keys::purchase(&purchase.id));
        let inserted = self.credits.record(&entry).await?.is_inserted();

        if newly_completed {
            self.purchases.update(purchase).await?;
        }

        if inserted {
            tracing::info!(
                user_id = %purchase.user_id,
                purchase_id = %purchase.id,
                payment_id = %vendor_payment_id,
                credits = purchase.credits,
                "Credit purchase fulfilled"
            );
            Ok(purchase.credits)
        } else {
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{user, BillingFixture};
    use crate::domain::billing::{CreditPackage, PackageType, PurchaseStatus};

    async fn pending_purchase(fx: &BillingFixture) -> CreditPurchase {
        let package = CreditPackage::find(PackageType::Popular).unwrap();
        let purchase = CreditPurchase::new(user().id, &package);
        fx.purchases.create(&purchase).await.unwrap();
        purchase
    }

    #[tokio::test]
    async fn grants_credits_and_completes_purchase() {
        let fx = BillingFixture::new();
        let fulfiller = PurchaseFulfiller::new(fx.purchases.clone(), fx.credits.clone());
        let mut purchase = pending_purchase(&fx).await;

        let granted = fulfiller.fulfill(&mut purchase, "pay_1").await.unwrap();

        assert_eq!(granted, 1_500);
        assert_eq!(fx.balance(&user()).await, 1_500);
        let stored = fx.purchases.find(&purchase.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PurchaseStatus::Completed);
        assert_eq!(stored.vendor_payment_id.as_deref(), Some("pay_1"));
    }

    #[tokio::test]
    async fn second_fulfillment_grants_nothing() {
        let fx = BillingFixture::new();
        let fulfiller = PurchaseFulfiller::new(fx.purchases.clone(), fx.credits.clone());
        let mut purchase = pending_purchase(&fx).await;

        fulfiller.fulfill(&mut purchase, "pay_1").await.unwrap();
        let mut reloaded = fx.purchases.find(&purchase.id).await.unwrap().unwrap();
        let granted = fulfiller.fulfill(&mut reloaded, "pay_1").await.unwrap();

        assert_eq!(granted, 0);
        assert_eq!(fx.balance(&user()).await, 1_500);
    }

    #[tokio::test]
    async fn failed_purchase_cannot_be_fulfilled() {
        let fx = BillingFixture::new();
        let fulfiller = PurchaseFulfiller::new(fx.purchases.clone(), fx.credits.clone());
        let mut purchase = pending_purchase(&fx).await;
        purchase.fail();

        let result = fulfiller.fulfill(&mut purchase, "pay_1").await;

        assert!(matches!(result, Err(BillingError::InvalidState { .. })));
        assert_eq!(fx.balance(&user()).await, 0);
    }
}
