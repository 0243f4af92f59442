//! GetCreditBalanceHandler - live balance from the ledger.

use std::sync::Arc;

use crate::domain::billing::CreditBalance;
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::CreditRepository;

#[derive(Debug, Clone)]
pub struct GetCreditBalanceQuery {
    pub user_id: UserId,
}

/// Reads the balance as of now.
///
/// A failing ledger read degrades to a zero balance so the dashboard still
/// renders; debits run their own pre-check and never rely on this value.
pub struct GetCreditBalanceHandler {
    credits: Arc<dyn CreditRepository>,
}

impl GetCreditBalanceHandler {
    pub fn new(credits: Arc<dyn CreditRepository>) -> Self {
        Self { credits }
    }

    pub async fn handle(&self, query: GetCreditBalanceQuery) -> CreditBalance {
        match self.credits.balance(&query.user_id, Timestamp::now()).await {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!(user_id = %query.user_id, error = %e, "Credit balance unavailable");
                CreditBalance::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{other_user, user, BillingFixture};
    use crate::domain::billing::{CreditReason, CreditTransaction};

    #[tokio::test]
    async fn sums_unexpired_credits_minus_debits() {
        let fx = BillingFixture::new();
        fx.grant(&user(), 300).await;
        let expired = CreditTransaction::credit(
            user().id,
            1_000,
            CreditReason::Subscription,
            "Old period",
            Some(Timestamp::now().add_days(-1)),
        )
        .unwrap();
        fx.credits.record(&expired).await.unwrap();
        let debit =
            CreditTransaction::debit(user().id, 120, CreditReason::Enhancement, "Upscale").unwrap();
        fx.credits.record(&debit).await.unwrap();

        let balance = GetCreditBalanceHandler::new(fx.credits.clone())
            .handle(GetCreditBalanceQuery { user_id: user().id })
            .await;

        assert_eq!(balance.total, 180);
        assert_eq!(balance.purchased, 300);
        assert_eq!(balance.subscription, 0);
        assert_eq!(balance.debited, 120);
    }

    #[tokio::test]
    async fn other_users_entries_are_excluded() {
        let fx = BillingFixture::new();
        fx.grant(&other_user(), 500).await;

        let balance = GetCreditBalanceHandler::new(fx.credits.clone())
            .handle(GetCreditBalanceQuery { user_id: user().id })
            .await;

        assert_eq!(balance.total, 0);
    }

    #[tokio::test]
    async fn ledger_failure_degrades_to_zero() {
        let fx = BillingFixture::new();
        fx.grant(&user(), 300).await;
        fx.credits.set_failing_reads(true);

        let balance = GetCreditBalanceHandler::new(fx.credits.clone())
            .handle(GetCreditBalanceQuery { user_id: user().id })
            .await;

        assert_eq!(balance, CreditBalance::default());
    }
}
