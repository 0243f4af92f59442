//! HTTP DTOs for credit endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::credits::{
    CompleteCreditPurchaseResult, ListCreditPackagesResult, PurchaseCreditsResult,
};
use crate::domain::billing::{CreditPackage, CreditPurchase, CreditTransaction};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreditHistoryParams {
    pub limit: Option<u32>,
}

/// Exactly one of `packageType` or `customAmount` (whole dollars).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseCreditsRequest {
    #[serde(default)]
    pub package_type: Option<String>,
    #[serde(default)]
    pub custom_amount: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteCreditPurchaseRequest {
    #[serde(default, alias = "purchase_id")]
    pub purchase_id: Option<String>,
    #[serde(default, alias = "session_id")]
    pub session_id: Option<String>,
    #[serde(default, alias = "payment_id")]
    pub payment_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct CreditHistoryResponse {
    pub transactions: Vec<CreditTransaction>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageOfferResponse {
    #[serde(flatten)]
    pub package: CreditPackage,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomAmountResponse {
    pub min_dollars: i64,
    pub max_dollars: i64,
    pub credits_per_dollar: i64,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreditPackagesResponse {
    pub packages: Vec<PackageOfferResponse>,
    pub custom: CustomAmountResponse,
}

impl From<ListCreditPackagesResult> for CreditPackagesResponse {
    fn from(result: ListCreditPackagesResult) -> Self {
        Self {
            packages: result
                .packages
                .into_iter()
                .map(|offer| PackageOfferResponse {
                    package: offer.package,
                    available: offer.available,
                })
                .collect(),
            custom: CustomAmountResponse {
                min_dollars: result.custom.min_dollars,
                max_dollars: result.custom.max_dollars,
                credits_per_dollar: result.custom.credits_per_dollar,
                available: result.custom.available,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseCreditsResponse {
    pub purchase_id: String,
    pub checkout_url: String,
    pub session_id: String,
    pub credits: i64,
    pub amount_cents: i64,
}

impl From<PurchaseCreditsResult> for PurchaseCreditsResponse {
    fn from(result: PurchaseCreditsResult) -> Self {
        Self {
            purchase_id: result.purchase_id.to_string(),
            checkout_url: result.checkout_url,
            session_id: result.session_id,
            credits: result.credits,
            amount_cents: result.amount_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteCreditPurchaseResponse {
    pub confirmed: bool,
    pub purchase: CreditPurchase,
    pub credits_granted: i64,
    pub already_processed: bool,
}

impl From<CompleteCreditPurchaseResult> for CompleteCreditPurchaseResponse {
    fn from(result: CompleteCreditPurchaseResult) -> Self {
        Self {
            confirmed: result.confirmed,
            purchase: result.purchase,
            credits_granted: result.credits_granted,
            already_processed: result.already_processed,
        }
    }
}
