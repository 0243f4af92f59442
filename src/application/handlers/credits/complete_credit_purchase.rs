//! CompleteCreditPurchaseHandler - settles a credit purchase on return.

use std::sync::Arc;

use crate::domain::billing::{verify_ownership, BillingError, CreditPurchase, PurchaseStatus};
use crate::domain::foundation::{AuthenticatedUser, PurchaseId};
use crate::ports::{CreditPurchaseRepository, PaymentProvider, VendorPayment, VendorPaymentStatus};

use super::PurchaseFulfiller;

/// Identifies the purchase by id or by checkout session.
#[derive(Debug, Clone)]
pub struct CompleteCreditPurchaseCommand {
    pub user: AuthenticatedUser,
    pub purchase_id: Option<String>,
    pub session_id: Option<String>,
    pub payment_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteCreditPurchaseResult {
    pub purchase: CreditPurchase,
    /// The payment has settled, successfully or not.
    pub confirmed: bool,
    pub credits_granted: i64,
    pub already_processed: bool,
}

pub struct CompleteCreditPurchaseHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    purchases: Arc<dyn CreditPurchaseRepository>,
    fulfiller: Arc<PurchaseFulfiller>,
}

impl CompleteCreditPurchaseHandler {
    pub fn new(
        payment_provider: Arc<dyn PaymentProvider>,
        purchases: Arc<dyn CreditPurchaseRepository>,
        fulfiller: Arc<PurchaseFulfiller>,
    ) -> Self {
        Self {
            payment_provider,
            purchases,
            fulfiller,
        }
    }

    pub async fn handle(
        &self,
        cmd: CompleteCreditPurchaseCommand,
    ) -> Result<CompleteCreditPurchaseResult, BillingError> {
        // 1. Find the purchase; other users' purchases do not exist
        let mut purchase = self.find_purchase(&cmd).await?;
        if purchase.user_id != cmd.user.id {
            tracing::warn!(user_id = %cmd.user.id, purchase_id = %purchase.id, "Purchase owned by another user");
            return Err(BillingError::purchase_not_found(purchase.id.to_string()));
        }

        // 2. Terminal purchases need no vendor call
        if purchase.status != PurchaseStatus::Pending {
            return Ok(CompleteCreditPurchaseResult {
                purchase,
                confirmed: true,
                credits_granted: 0,
                already_processed: true,
            });
        }

        // 3. Find the payment
        let payment_id = match self.payment_id_for(&cmd, &purchase).await? {
            Some(id) => id,
            None => return Ok(pending(purchase)),
        };
        let payment = self
            .payment_provider
            .get_payment(&payment_id)
            .await?
            .ok_or_else(|| BillingError::payment_not_found(&payment_id))?;

        if !self.pays_for(&payment, &purchase).await? {
            tracing::warn!(purchase_id = %purchase.id, payment_id = %payment_id, "Payment does not settle this purchase");
            return Err(BillingError::OwnershipMismatch);
        }
        verify_ownership(
            &cmd.user,
            payment.metadata_user_id(),
            payment.customer_email.as_deref(),
        )?;

        // 4. Settle
        match payment.status {
            VendorPaymentStatus::Succeeded => {
                let granted = self.fulfiller.fulfill(&mut purchase, &payment.id).await?;
                Ok(CompleteCreditPurchaseResult {
                    purchase,
                    confirmed: true,
                    credits_granted: granted,
                    already_processed: granted == 0,
                })
            }
            VendorPaymentStatus::Failed | VendorPaymentStatus::Cancelled => {
                purchase.fail();
                self.purchases.update(&purchase).await?;
                tracing::info!(purchase_id = %purchase.id, payment_id = %payment.id, "Credit purchase failed");
                Ok(CompleteCreditPurchaseResult {
                    purchase,
                    confirmed: true,
                    credits_granted: 0,
                    already_processed: false,
                })
            }
            _ => Ok(pending(purchase)),
        }
    }

    async fn find_purchase(
        &self,
        cmd: &CompleteCreditPurchaseCommand,
    ) -> Result<CreditPurchase, BillingError> {
        let purchase_id = cmd.purchase_id.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let session_id = cmd.session_id.as_deref().map(str::trim).filter(|s| !s.is_empty());

        match (purchase_id, session_id) {
            (Some(raw), _) => {
                let id: PurchaseId = raw
                    .parse()
                    .map_err(|_| BillingError::purchase_not_found(raw))?;
                self.purchases
                    .find(&id)
                    .await?
                    .ok_or_else(|| BillingError::purchase_not_found(raw))
            }
            (None, Some(session_id)) => self
                .purchases
                .find_by_checkout_session(session_id)
                .await?
                .ok_or_else(|| BillingError::purchase_not_found(session_id)),
            (None, None) => Err(BillingError::MissingIdentifier),
        }
    }

    /// A payment settles a purchase when its `purchase_id` metadata names
    /// it or, lacking that metadata, when it is the payment already linked
    /// to the purchase or produced by the purchase's checkout session.
    async fn pays_for(
        &self,
        payment: &VendorPayment,
        purchase: &CreditPurchase,
    ) -> Result<bool, BillingError> {
        if let Some(paid_for) = payment.metadata.get("purchase_id") {
            return Ok(paid_for.trim() == purchase.id.to_string());
        }
        if purchase.vendor_payment_id.as_deref() == Some(payment.id.as_str()) {
            return Ok(true);
        }
        let Some(session_id) = &purchase.checkout_session_id else {
            return Ok(false);
        };
        let session_payment = self
            .payment_provider
            .get_checkout_session(session_id)
            .await?
            .and_then(|details| details.payment_id);
        Ok(session_payment.as_deref() == Some(payment.id.as_str()))
    }

    /// Explicit id, then the one stored on the purchase, then the session.
    async fn payment_id_for(
        &self,
        cmd: &CompleteCreditPurchaseCommand,
        purchase: &CreditPurchase,
    ) -> Result<Option<String>, BillingError> {
        if let Some(id) = cmd
            .payment_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            return Ok(Some(id.to_string()));
        }
        if let Some(id) = &purchase.vendor_payment_id {
            return Ok(Some(id.clone()));
        }
        let Some(session_id) = &purchase.checkout_session_id else {
            return Ok(None);
        };
        Ok(self
            .payment_provider
            .get_checkout_session(session_id)
            .await?
            .and_then(|details| details.payment_id))
    }
}

fn pending(purchase: CreditPurchase) -> CompleteCreditPurchaseResult {
    CompleteCreditPurchaseResult {
        purchase,
        confirmed: false,
        credits_granted: 0,
        already_processed: false,
    }
}
