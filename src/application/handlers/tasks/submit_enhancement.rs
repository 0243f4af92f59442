//! SubmitEnhancementHandler - charges credits and starts a provider job.

use std::sync::Arc;

use crate::domain::billing::{keys, CreditReason, CreditTransaction};
use crate::domain::enhancement::{EnhancementModel, EnhancementTask, TaskError};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{CreditRepository, SubmissionRequest, TaskRepository};

use super::providers::{refund_failed_task, EnhancementProviders};

#[derive(Debug, Clone)]
pub struct SubmitEnhancementCommand {
    pub user_id: UserId,
    pub model: String,
    pub image_url: String,
}

/// Charges the model's cost, records the task and submits it.
///
/// If the provider rejects the submission the task is marked failed and
/// the charge refunded before the error is returned.
pub struct SubmitEnhancementHandler {
    tasks: Arc<dyn TaskRepository>,
    credits: Arc<dyn CreditRepository>,
    providers: EnhancementProviders,
}

impl SubmitEnhancementHandler {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        credits: Arc<dyn CreditRepository>,
        providers: EnhancementProviders,
    ) -> Self {
        Self {
            tasks,
            credits,
            providers,
        }
    }

    pub async fn handle(&self, cmd: SubmitEnhancementCommand) -> Result<EnhancementTask, TaskError> {
        // 1. Validate model and image
        let model = EnhancementModel::find(cmd.model.trim())?;
        let mut task = EnhancementTask::new(cmd.user_id.clone(), model, cmd.image_url)?;
        let provider = self.providers.get(model.provider)?;

        // 2. Balance pre-check
        let balance = self.credits.balance(&cmd.user_id, Timestamp::now()).await?;
        if !balance.covers(model.credit_cost) {
            return Err(TaskError::InsufficientCredits {
                required: model.credit_cost,
                available: balance.total,
            });
        }

        // 3. Persist the pending task so every later charge has a row to
        // settle against
        self.tasks.create(&task).await?;

        // 4. Charge
        let debit = CreditTransaction::debit(
            cmd.user_id.clone(),
            model.credit_cost,
            CreditReason::Enhancement,
            format!("{} enhancement", model.display_name),
        )?
        .with_idempotency_key(keys::task_debit(&task.id));
        if let Err(e) = self.credits.record(&debit).await {
            tracing::error!(task_id = %task.id, error = %e, "Failed to charge enhancement");
            self.abandon(&mut task, "Credit charge failed").await;
            return Err(e.into());
        }

        // 5. Submit
        let request = SubmissionRequest {
            provider_model: model.provider_model.to_string(),
            image_url: task.original_url.clone(),
        };
        match provider.submit(request).await {
            Ok(job_id) => {
                task.mark_submitted(job_id);
                if let Err(e) = self.tasks.update(&task).await {
                    // Without the job id the task is never polled, so the
                    // charge cannot stand.
                    tracing::error!(task_id = %task.id, error = %e, "Failed to record provider job");
                    self.abandon(&mut task, "Provider job could not be recorded").await;
                    refund_failed_task(self.credits.as_ref(), &task).await?;
                    return Err(e.into());
                }
                tracing::info!(
                    user_id = %cmd.user_id,
                    task_id = %task.id,
                    model = model.id,
                    provider = %model.provider,
                    "Enhancement submitted"
                );
                Ok(task)
            }
            Err(e) => {
                tracing::warn!(task_id = %task.id, provider = %model.provider, error = %e, "Enhancement submission failed");
                self.abandon(&mut task, e.message.clone()).await;
                refund_failed_task(self.credits.as_ref(), &task).await?;
                Err(TaskError::provider(e.message))
            }
        }
    }

    /// Marks the task failed, best effort; the caller settles credits.
    async fn abandon(&self, task: &mut EnhancementTask, reason: impl Into<String>) {
        if task.fail(reason).is_err() {
            return;
        }
        if let Err(e) = self.tasks.update(task).await {
            tracing::warn!(task_id = %task.id, error = %e, "Failed to mark task failed");
        }
    }
}
