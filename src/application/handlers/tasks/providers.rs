//! Provider lookup and credit refunds shared by the task handlers.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::billing::{keys, CreditReason, CreditTransaction};
use crate::domain::enhancement::{EnhancementTask, ProviderKind, TaskError};
use crate::ports::{CreditRepository, EnhancementProvider};

/// The configured inference providers, one per kind.
#[derive(Clone, Default)]
pub struct EnhancementProviders {
    by_kind: HashMap<ProviderKind, Arc<dyn EnhancementProvider>>,
}

impl EnhancementProviders {
    pub fn new(providers: impl IntoIterator<Item = Arc<dyn EnhancementProvider>>) -> Self {
        Self {
            by_kind: providers
                .into_iter()
                .map(|provider| (provider.kind(), provider))
                .collect(),
        }
    }

    pub fn get(&self, kind: ProviderKind) -> Result<&Arc<dyn EnhancementProvider>, TaskError> {
        self.by_kind
            .get(&kind)
            .ok_or_else(|| TaskError::provider(format!("The {} provider is not configured", kind)))
    }

    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        self.by_kind.contains_key(&kind)
    }
}

/// Returns a failed task's credits. Keyed per task, so repeated calls
/// refund at most once. Returns whether this call wrote the refund.
pub(crate) async fn refund_failed_task(
    credits: &dyn CreditRepository,
    task: &EnhancementTask,
) -> Result<bool, TaskError> {
    if task.credits_consumed <= 0 {
        return Ok(false);
    }
    let entry = CreditTransaction::credit(
        task.user_id.clone(),
        task.credits_consumed,
        CreditReason::Refund,
        format!("Refund for failed {} task", task.model),
        None,
    )?
    .with_idempotency_key(keys::task_refund(&task.id));

    let inserted = credits.record(&entry).await?.is_inserted();
    if inserted {
        tracing::info!(
            user_id = %task.user_id,
            task_id = %task.id,
            credits = task.credits_consumed,
            "Refunded failed enhancement"
        );
    }
    Ok(inserted)
}
