//! Credit ledger.
//!
//! Balances are never stored. Every read folds the user's immutable
//! transactions: unexpired credits minus all debits, floored at zero.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    DomainError, PurchaseId, TaskId, Timestamp, TransactionId, UserId, ValidationError,
};

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "credit",
            TransactionKind::Debit => "debit",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(TransactionKind::Credit),
            "debit" => Ok(TransactionKind::Debit),
            other => Err(DomainError::validation("type", format!("Unknown transaction type: {}", other))),
        }
    }
}

/// Why credits moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditReason {
    Subscription,
    Purchase,
    Enhancement,
    Refund,
    Adjustment,
}

impl CreditReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditReason::Subscription => "subscription",
            CreditReason::Purchase => "purchase",
            CreditReason::Enhancement => "enhancement",
            CreditReason::Refund => "refund",
            CreditReason::Adjustment => "adjustment",
        }
    }
}

impl fmt::Display for CreditReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CreditReason {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscription" => Ok(CreditReason::Subscription),
            "purchase" => Ok(CreditReason::Purchase),
            "enhancement" => Ok(CreditReason::Enhancement),
            "refund" => Ok(CreditReason::Refund),
            "adjustment" => Ok(CreditReason::Adjustment),
            other => Err(DomainError::validation("reason", format!("Unknown credit reason: {}", other))),
        }
    }
}

/// Immutable ledger entry. Credits carry positive amounts, debits negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditTransaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub amount: i64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub reason: CreditReason,
    pub description: String,
    pub expires_at: Option<Timestamp>,
    #[serde(skip_serializing)]
    pub idempotency_key: Option<String>,
    pub created_at: Timestamp,
}

impl CreditTransaction {
    /// Creates a credit entry. `amount` must be positive.
    pub fn credit(
        user_id: UserId,
        amount: i64,
        reason: CreditReason,
        description: impl Into<String>,
        expires_at: Option<Timestamp>,
    ) -> Result<Self, ValidationError> {
        if amount <= 0 {
            return Err(ValidationError::out_of_range("amount", 1, i64::MAX, amount));
        }
        Ok(Self {
            id: TransactionId::new(),
            user_id,
            amount,
            kind: TransactionKind::Credit,
            reason,
            description: description.into(),
            expires_at,
            idempotency_key: None,
            created_at: Timestamp::now(),
        })
    }

    /// Creates a debit entry. `amount` is the positive cost; it is stored negated.
    pub fn debit(
        user_id: UserId,
        amount: i64,
        reason: CreditReason,
        description: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if amount <= 0 {
            return Err(ValidationError::out_of_range("amount", 1, i64::MAX, amount));
        }
        Ok(Self {
            id: TransactionId::new(),
            user_id,
            amount: -amount,
            kind: TransactionKind::Debit,
            reason,
            description: description.into(),
            expires_at: None,
            idempotency_key: None,
            created_at: Timestamp::now(),
        })
    }

    /// Attaches the key the store deduplicates on.
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn with_created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = created_at;
        self
    }

    /// True while the entry still counts toward the balance.
    pub fn is_active_at(&self, now: &Timestamp) -> bool {
        match self.kind {
            TransactionKind::Debit => true,
            TransactionKind::Credit => self.expires_at.map_or(true, |exp| exp.is_after(now)),
        }
    }
}

/// Idempotency keys for every ledger writer.
pub mod keys {
    use super::*;

    /// One allocation per subscription per billing period.
    pub fn subscription_allocation(vendor_subscription_id: &str, period_end: &Timestamp) -> String {
        format!("sub:{}:{}", vendor_subscription_id, period_end.date_string())
    }

    pub fn purchase(purchase_id: &PurchaseId) -> String {
        format!("purchase:{}", purchase_id)
    }

    pub fn task_debit(task_id: &TaskId) -> String {
        format!("task:{}", task_id)
    }

    pub fn task_refund(task_id: &TaskId) -> String {
        format!("refund:{}", task_id)
    }
}

/// Derived balance with a breakdown by source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBalance {
    /// Spendable credits, never negative.
    pub total: i64,
    /// Unexpired credits granted by subscriptions.
    pub subscription: i64,
    /// Unexpired credits from purchases, refunds and adjustments.
    pub purchased: i64,
    /// Lifetime debits.
    pub debited: i64,
}

impl CreditBalance {
    /// Folds ledger entries into a balance as of `now`.
    pub fn compute<'a, I>(entries: I, now: &Timestamp) -> Self
    where
        I: IntoIterator<Item = &'a CreditTransaction>,
    {
        let mut balance = CreditBalance::default();
        for entry in entries {
            match entry.kind {
                TransactionKind::Credit => {
                    if entry.amount <= 0 || !entry.is_active_at(now) {
                        continue;
                    }
                    if entry.reason == CreditReason::Subscription {
                        balance.subscription += entry.amount;
                    } else {
                        balance.purchased += entry.amount;
                    }
                }
                TransactionKind::Debit => balance.debited += entry.amount.abs(),
            }
        }
        Self::from_parts(balance.subscription, balance.purchased, balance.debited)
    }

    /// Balance from pre-aggregated sums.
    pub fn from_parts(subscription: i64, purchased: i64, debited: i64) -> Self {
        Self {
            total: (subscription + purchased - debited).max(0),
            subscription,
            purchased,
            debited,
        }
    }

    pub fn covers(&self, cost: i64) -> bool {
        self.total >= cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn at(value: &str) -> Timestamp {
        Timestamp::parse_rfc3339(value).unwrap()
    }

    fn grant(amount: i64, expires_at: Option<Timestamp>) -> CreditTransaction {
        CreditTransaction::credit(user(), amount, CreditReason::Subscription, "grant", expires_at).unwrap()
    }

    fn spend(amount: i64) -> CreditTransaction {
        CreditTransaction::debit(user(), amount, CreditReason::Enhancement, "spend").unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Constructors
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn debit_stores_negative_amount() {
        let entry = spend(7);
        assert_eq!(entry.amount, -7);
        assert_eq!(entry.kind, TransactionKind::Debit);
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        assert!(CreditTransaction::credit(user(), 0, CreditReason::Purchase, "x", None).is_err());
        assert!(CreditTransaction::debit(user(), -5, CreditReason::Enhancement, "x").is_err());
    }

    #[test]
    fn subscription_key_uses_period_end_date() {
        let key = keys::subscription_allocation("sub_123", &at("2024-02-15T09:30:00Z"));
        assert_eq!(key, "sub:sub_123:2024-02-15");
    }

    #[test]
    fn serializes_kind_as_type() {
        let json = serde_json::to_value(spend(3)).unwrap();
        assert_eq!(json["type"], "debit");
        assert_eq!(json["amount"], -3);
        assert!(json.get("idempotencyKey").is_none());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Balance
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn balance_is_unexpired_credits_minus_debits() {
        let now = at("2024-06-01T00:00:00Z");
        let entries = vec![
            grant(100, Some(at("2024-07-01T00:00:00Z"))),
            CreditTransaction::credit(user(), 50, CreditReason::Purchase, "pack", None).unwrap(),
            spend(30),
        ];

        let balance = CreditBalance::compute(&entries, &now);

        assert_eq!(balance.total, 120);
        assert_eq!(balance.subscription, 100);
        assert_eq!(balance.purchased, 50);
        assert_eq!(balance.debited, 30);
    }

    #[test]
    fn expired_credits_do_not_count() {
        let now = at("2024-06-01T00:00:00Z");
        let entries = vec![grant(100, Some(at("2024-05-31T23:59:59Z"))), grant(20, None)];

        assert_eq!(CreditBalance::compute(&entries, &now).total, 20);
    }

    #[test]
    fn credit_expiring_exactly_now_is_expired() {
        let now = at("2024-06-01T00:00:00Z");
        let entries = vec![grant(100, Some(now))];

        assert_eq!(CreditBalance::compute(&entries, &now).total, 0);
    }

    #[test]
    fn overdrawn_ledger_reports_zero() {
        let now = Timestamp::now();
        let entries = vec![grant(10, None), spend(25)];

        let balance = CreditBalance::compute(&entries, &now);

        assert_eq!(balance.total, 0);
        assert_eq!(balance.debited, 25);
    }

    #[test]
    fn empty_ledger_is_zero() {
        let entries: Vec<CreditTransaction> = Vec::new();
        assert_eq!(CreditBalance::compute(&entries, &Timestamp::now()), CreditBalance::default());
    }

    proptest! {
        #[test]
        fn balance_matches_formula_and_is_never_negative(
            credits in prop::collection::vec((1i64..1_000, prop::option::of(-5i64..5)), 0..20),
            debits in prop::collection::vec(1i64..1_000, 0..20),
        ) {
            let now = at("2024-06-01T00:00:00Z");
            let mut entries = Vec::new();
            let mut expected_credits = 0;
            for (amount, offset_days) in &credits {
                let expires_at = offset_days.map(|days| now.add_days(days));
                if expires_at.map_or(true, |exp| exp.is_after(&now)) {
                    expected_credits += amount;
                }
                entries.push(grant(*amount, expires_at));
            }
            let expected_debits: i64 = debits.iter().sum();
            entries.extend(debits.iter().map(|d| spend(*d)));

            let balance = CreditBalance::compute(&entries, &now);

            prop_assert!(balance.total >= 0);
            prop_assert_eq!(balance.total, (expected_credits - expected_debits).max(0));
        }
    }
}
