//! Rules for reconciling vendor subscription state with the local mirror.
//!
//! Vendor webhooks and the browser's return-flow call race for the same
//! subscription. These functions decide ownership, confirmation and the
//! billing period end; the credit allocation key makes the outcome safe to
//! apply more than once.

use crate::domain::foundation::{AuthenticatedUser, Timestamp};

use super::{BillingError, BillingPeriod};

/// Checks that a vendor object belongs to the caller.
///
/// A user id in the vendor metadata is decisive. Without one, the vendor
/// customer email must match the caller's email.
pub fn verify_ownership(
    caller: &AuthenticatedUser,
    metadata_user_id: Option<&str>,
    customer_email: Option<&str>,
) -> Result<(), BillingError> {
    match metadata_user_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(owner) if owner == caller.id.as_str() => Ok(()),
        Some(_) => Err(BillingError::OwnershipMismatch),
        None => match customer_email.map(str::trim).filter(|e| !e.is_empty()) {
            Some(email) if caller.email_matches(email) => Ok(()),
            Some(_) => Err(BillingError::OwnershipMismatch),
            None => Err(BillingError::OwnershipUnverifiable),
        },
    }
}

/// Independent signals that a subscription has been paid for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfirmationSignals {
    pub active_locally: bool,
    pub payment_succeeded: bool,
    pub vendor_active: bool,
}

impl ConfirmationSignals {
    /// Any single signal confirms.
    pub fn is_confirmed(&self) -> bool {
        self.active_locally || self.payment_succeeded || self.vendor_active
    }
}

/// Decides the end of the current billing period.
///
/// Daily plans are always recomputed because the vendor reports a monthly
/// default for them. Otherwise the vendor date is used while it is still in
/// the future.
pub fn resolve_period_end(
    billing_period: BillingPeriod,
    vendor_next_billing: Option<Timestamp>,
    now: Timestamp,
) -> Timestamp {
    if billing_period == BillingPeriod::Daily {
        return billing_period.period_end(now);
    }
    match vendor_next_billing {
        Some(next) if next.is_after(&now) => next,
        _ => billing_period.period_end(now),
    }
}
