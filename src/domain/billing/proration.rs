//! Plan change proration.

use serde::Serialize;

use crate::domain::foundation::Timestamp;

use super::{BillingError, BillingPeriod, Plan};

/// What switching plans mid-period would cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanChangePreview {
    pub current_plan: Plan,
    pub target_plan: Plan,
    pub billing_period: BillingPeriod,
    pub is_upgrade: bool,
    /// Share of the current period still unused, 0.0 to 1.0.
    pub remaining_fraction: f64,
    /// Positive amounts are charged now, negative amounts are credited.
    pub prorated_amount_cents: i64,
    /// Extra credits granted immediately on upgrade.
    pub credit_adjustment: i64,
    pub period_end: Timestamp,
}

/// Prices a plan change at `now` within `[period_start, period_end)`.
pub fn preview_plan_change(
    current: Plan,
    target: Plan,
    billing_period: BillingPeriod,
    period_start: Timestamp,
    period_end: Timestamp,
    now: Timestamp,
) -> Result<PlanChangePreview, BillingError> {
    if current == target {
        return Err(BillingError::validation(
            "targetPlan",
            format!("Already subscribed to the {} plan", current),
        ));
    }

    let total = period_end.duration_since(&period_start).num_seconds();
    if total <= 0 {
        return Err(BillingError::validation("period", "Billing period has no length"));
    }
    let remaining = period_end.duration_since(&now).num_seconds().clamp(0, total);
    let remaining_fraction = remaining as f64 / total as f64;

    let price_delta = target.price_cents(billing_period) - current.price_cents(billing_period);
    let prorated_amount_cents = (price_delta as f64 * remaining_fraction).round() as i64;

    let is_upgrade = target.rank() > current.rank();
    let credit_adjustment = if is_upgrade {
        let delta = target.credits_for(billing_period) - current.credits_for(billing_period);
        (delta as f64 * remaining_fraction).round() as i64
    } else {
        0
    };

    Ok(PlanChangePreview {
        current_plan: current,
        target_plan: target,
        billing_period,
        is_upgrade,
        remaining_fraction,
        prorated_amount_cents,
        credit_adjustment,
        period_end,
    })
}
