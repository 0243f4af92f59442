//! Credit handlers.
//!
//! ## Commands
//! - Buying a credit package or a custom amount
//! - Completing a credit purchase from the browser return
//!
//! ## Queries
//! - Current balance
//! - Ledger history
//! - Purchasable packages

mod complete_credit_purchase;
mod get_credit_balance;
mod get_credit_history;
mod list_credit_packages;
mod purchase_credits;
mod purchase_fulfiller;

pub use purchase_fulfiller::PurchaseFulfiller;

// Commands
pub use complete_credit_purchase::{
    CompleteCreditPurchaseCommand, CompleteCreditPurchaseHandler, CompleteCreditPurchaseResult,
};
pub use purchase_credits::{PurchaseCreditsCommand, PurchaseCreditsHandler, PurchaseCreditsResult};

// Queries
pub use get_credit_balance::{GetCreditBalanceHandler, GetCreditBalanceQuery};
pub use get_credit_history::{
    GetCreditHistoryHandler, GetCreditHistoryQuery, DEFAULT_CREDIT_HISTORY_LIMIT,
    MAX_CREDIT_HISTORY_LIMIT,
};
pub use list_credit_packages::{
    CustomAmountOffer, ListCreditPackagesHandler, ListCreditPackagesResult, PackageOffer,
};
