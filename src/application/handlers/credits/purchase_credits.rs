//! PurchaseCreditsHandler - starts a one-time credit checkout.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::application::handlers::payments::ProductCatalog;
use crate::domain::billing::{BillingError, CreditPackage, CreditPurchase, PackageType};
use crate::domain::foundation::{AuthenticatedUser, PurchaseId};
use crate::ports::{CreateCheckoutRequest, CreditPurchaseRepository, PaymentProvider};

/// Either a catalog package or a custom whole-dollar amount.
#[derive(Debug, Clone)]
pub struct PurchaseCreditsCommand {
    pub user: AuthenticatedUser,
    pub package_type: Option<String>,
    pub custom_amount: Option<i64>,
    pub return_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseCreditsResult {
    pub purchase_id: PurchaseId,
    pub checkout_url: String,
    pub session_id: String,
    pub credits: i64,
    pub amount_cents: i64,
}

pub struct PurchaseCreditsHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    purchases: Arc<dyn CreditPurchaseRepository>,
    catalog: ProductCatalog,
    timeout: Duration,
}

impl PurchaseCreditsHandler {
    pub fn new(
        payment_provider: Arc<dyn PaymentProvider>,
        purchases: Arc<dyn CreditPurchaseRepository>,
        catalog: ProductCatalog,
        timeout: Duration,
    ) -> Self {
        Self {
            payment_provider,
            purchases,
            catalog,
            timeout,
        }
    }

    pub async fn handle(
        &self,
        cmd: PurchaseCreditsCommand,
    ) -> Result<PurchaseCreditsResult, BillingError> {
        // 1. Resolve the package and its vendor product
        let (package, quantity) = resolve_package(cmd.package_type.as_deref(), cmd.custom_amount)?;
        let product_id = self.catalog.credit_product(package.package_type)?.to_string();

        // 2. Persist the pending purchase so a fast webhook can find it
        let mut purchase = CreditPurchase::new(cmd.user.id.clone(), &package);
        self.purchases.create(&purchase).await?;

        // 3. Create the checkout, racing the timeout
        let request = CreateCheckoutRequest {
            product_id,
            quantity,
            customer_email: cmd.user.email.clone(),
            customer_name: cmd.user.display_name.clone(),
            return_url: format!(
                "{}/credits/success?purchase_id={}",
                cmd.return_base_url.trim_end_matches('/'),
                purchase.id
            ),
            metadata: HashMap::from([
                ("user_id".to_string(), cmd.user.id.to_string()),
                ("purchase_id".to_string(), purchase.id.to_string()),
                ("kind".to_string(), "credits".to_string()),
            ]),
        };

        let checkout = tokio::time::timeout(self.timeout, self.payment_provider.create_checkout(request))
            .await
            .map_err(|_| BillingError::VendorTimeout)
            .and_then(|result| result.map_err(BillingError::from));
        let session = match checkout {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(user_id = %cmd.user.id, purchase_id = %purchase.id, error = %e, "Credit checkout failed");
                purchase.fail();
                if let Err(e) = self.purchases.update(&purchase).await {
                    tracing::warn!(purchase_id = %purchase.id, error = %e, "Failed to mark purchase failed");
                }
                return Err(e);
            }
        };

        // 4. Attach the session
        purchase.attach_checkout(session.session_id.clone(), session.checkout_url.clone());
        self.purchases.update(&purchase).await?;

        tracing::info!(
            user_id = %cmd.user.id,
            purchase_id = %purchase.id,
            package = %package.package_type,
            credits = package.credits,
            "Credit checkout created"
        );

        Ok(PurchaseCreditsResult {
            purchase_id: purchase.id,
            checkout_url: session.checkout_url,
            session_id: session.session_id,
            credits: purchase.credits,
            amount_cents: purchase.amount_cents,
        })
    }
}

/// Package plus the checkout quantity. Custom amounts buy `dollars` units
/// of the one-dollar product.
fn resolve_package(
    package_type: Option<&str>,
    custom_amount: Option<i64>,
) -> Result<(CreditPackage, u32), BillingError> {
    let package_type = package_type
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<PackageType>)
        .transpose()?;

    match (package_type, custom_amount) {
        (None | Some(PackageType::Custom), Some(dollars)) => {
            let package = CreditPackage::custom(dollars)?;
            let quantity = u32::try_from(dollars)
                .map_err(|_| BillingError::validation("customAmount", "Amount out of range"))?;
            Ok((package, quantity))
        }
        (Some(PackageType::Custom), None) => Err(BillingError::validation(
            "customAmount",
            "customAmount is required for a custom package",
        )),
        (Some(package_type), None) => CreditPackage::find(package_type)
            .map(|package| (package, 1))
            .ok_or_else(|| {
                BillingError::validation("packageType", format!("Unknown credit package: {}", package_type))
            }),
        (Some(_), Some(_)) => Err(BillingError::validation(
            "customAmount",
            "customAmount only applies to the custom package",
        )),
        (None, None) => Err(BillingError::validation(
            "packageType",
            "Either packageType or customAmount is required",
        )),
    }
}
