//! Billing domain module.
//!
//! Credits ledger, subscriptions, payments and one-time credit purchases.
//!
//! # Module Structure
//!
//! - `plan` - Plan table and billing periods
//! - `credits` - Ledger entries and derived balances
//! - `subscription` - Local subscription mirror
//! - `payment` - Vendor payment records
//! - `package` / `purchase` - One-time credit packages
//! - `proration` - Plan change pricing
//! - `reconciliation` - Ownership, confirmation and period rules

mod credits;
mod errors;
mod package;
mod payment;
mod plan;
mod proration;
mod purchase;
mod reconciliation;
mod subscription;

pub use credits::{keys, CreditBalance, CreditReason, CreditTransaction, TransactionKind};
pub use errors::BillingError;
pub use package::{
    CreditPackage, PackageType, CUSTOM_CREDITS_PER_DOLLAR, CUSTOM_MAX_DOLLARS, CUSTOM_MIN_DOLLARS,
};
pub use payment::PaymentRecord;
pub use plan::{BillingPeriod, Plan, PlanDetails};
pub use proration::{preview_plan_change, PlanChangePreview};
pub use purchase::{CreditPurchase, PurchaseStatus};
pub use reconciliation::{resolve_period_end, verify_ownership, ConfirmationSignals};
pub use subscription::{Subscription, SubscriptionStatus};
