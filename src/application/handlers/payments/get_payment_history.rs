//! GetPaymentHistoryHandler - recent vendor payments for the caller.

use std::sync::Arc;

use crate::domain::billing::PaymentRecord;
use crate::domain::foundation::UserId;
use crate::ports::PaymentRepository;

pub const DEFAULT_PAYMENT_HISTORY_LIMIT: u32 = 20;
pub const MAX_PAYMENT_HISTORY_LIMIT: u32 = 50;

#[derive(Debug, Clone)]
pub struct GetPaymentHistoryQuery {
    pub user_id: UserId,
    pub limit: Option<u32>,
}

/// Most recent first. Storage errors degrade to an empty list.
pub struct GetPaymentHistoryHandler {
    payments: Arc<dyn PaymentRepository>,
}

impl GetPaymentHistoryHandler {
    pub fn new(payments: Arc<dyn PaymentRepository>) -> Self {
        Self { payments }
    }

    pub async fn handle(&self, query: GetPaymentHistoryQuery) -> Vec<PaymentRecord> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAYMENT_HISTORY_LIMIT)
            .clamp(1, MAX_PAYMENT_HISTORY_LIMIT);

        match self.payments.list_for_user(&query.user_id, limit).await {
            Ok(payments) => payments,
            Err(e) => {
                tracing::warn!(user_id = %query.user_id, error = %e, "Payment history unavailable");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{user, BillingFixture};

    async fn seed(fx: &BillingFixture, count: usize) {
        for i in 0..count {
            let record = PaymentRecord::new(user().id, format!("pay_{}", i), 1_000, "USD", "succeeded");
            fx.payments.insert_if_absent(&record).await.unwrap();
        }
    }

    #[tokio::test]
    async fn defaults_to_twenty() {
        let fx = BillingFixture::new();
        seed(&fx, 25).await;
        let handler = GetPaymentHistoryHandler::new(fx.payments.clone());

        let payments = handler
            .handle(GetPaymentHistoryQuery {
                user_id: user().id,
                limit: None,
            })
            .await;

        assert_eq!(payments.len(), 20);
    }

    #[tokio::test]
    async fn limit_is_capped_at_fifty() {
        let fx = BillingFixture::new();
        seed(&fx, 60).await;
        let handler = GetPaymentHistoryHandler::new(fx.payments.clone());

        let payments = handler
            .handle(GetPaymentHistoryQuery {
                user_id: user().id,
                limit: Some(500),
            })
            .await;

        assert_eq!(payments.len(), 50);
    }
}
