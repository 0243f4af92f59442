//! GetCreditHistoryHandler - recent ledger entries.

use std::sync::Arc;

use crate::domain::billing::CreditTransaction;
use crate::domain::foundation::UserId;
use crate::ports::CreditRepository;

pub const DEFAULT_CREDIT_HISTORY_LIMIT: u32 = 20;
pub const MAX_CREDIT_HISTORY_LIMIT: u32 = 50;

#[derive(Debug, Clone)]
pub struct GetCreditHistoryQuery {
    pub user_id: UserId,
    pub limit: Option<u32>,
}

pub struct GetCreditHistoryHandler {
    credits: Arc<dyn CreditRepository>,
}

impl GetCreditHistoryHandler {
    pub fn new(credits: Arc<dyn CreditRepository>) -> Self {
        Self { credits }
    }

    /// Newest first, at most 50. Read failures yield an empty list.
    pub async fn handle(&self, query: GetCreditHistoryQuery) -> Vec<CreditTransaction> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_CREDIT_HISTORY_LIMIT)
            .clamp(1, MAX_CREDIT_HISTORY_LIMIT);

        match self.credits.recent(&query.user_id, limit).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(user_id = %query.user_id, error = %e, "Credit history unavailable");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{user, BillingFixture};

    fn query(limit: Option<u32>) -> GetCreditHistoryQuery {
        GetCreditHistoryQuery {
            user_id: user().id,
            limit,
        }
    }

    #[tokio::test]
    async fn default_limit_is_twenty() {
        let fx = BillingFixture::new();
        for _ in 0..30 {
            fx.grant(&user(), 10).await;
        }

        let entries = GetCreditHistoryHandler::new(fx.credits.clone())
            .handle(query(None))
            .await;

        assert_eq!(entries.len(), 20);
    }

    #[tokio::test]
    async fn limit_is_clamped() {
        let fx = BillingFixture::new();
        for _ in 0..60 {
            fx.grant(&user(), 10).await;
        }
        let handler = GetCreditHistoryHandler::new(fx.credits.clone());

        assert_eq!(handler.handle(query(Some(100))).await.len(), 50);
        assert_eq!(handler.handle(query(Some(0))).await.len(), 1);
    }

    #[tokio::test]
    async fn ledger_failure_yields_empty_history() {
        let fx = BillingFixture::new();
        fx.grant(&user(), 10).await;
        fx.credits.set_failing_reads(true);

        let entries = GetCreditHistoryHandler::new(fx.credits.clone())
            .handle(query(None))
            .await;

        assert!(entries.is_empty());
    }
}
