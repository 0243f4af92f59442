//! GetTaskStatusHandler - returns a task, polling its provider if needed.

use std::sync::Arc;

use crate::domain::enhancement::{EnhancementTask, TaskError, TaskStatus};
use crate::domain::foundation::{TaskId, UserId};
use crate::ports::{CreditRepository, TaskRepository};

use super::providers::{refund_failed_task, EnhancementProviders};

#[derive(Debug, Clone)]
pub struct GetTaskStatusQuery {
    pub user_id: UserId,
    pub task_id: String,
}

/// Client polling drives the state machine: each read of a non-terminal
/// task asks the provider once and stores what it reports.
pub struct GetTaskStatusHandler {
    tasks: Arc<dyn TaskRepository>,
    credits: Arc<dyn CreditRepository>,
    providers: EnhancementProviders,
}

impl GetTaskStatusHandler {
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

    pub async fn handle(&self, query: GetTaskStatusQuery) -> Result<EnhancementTask, TaskError> {
        let task_id: TaskId = query
            .task_id
            .trim()
            .parse()
            .map_err(|_| TaskError::validation("taskId", "Task id must be a UUID"))?;

        // 1. Load; other users' tasks are reported as missing
        let mut task = self
            .tasks
            .find(&query.user_id, &task_id)
            .await?
            .ok_or_else(|| TaskError::not_found(task_id))?;

        if task.is_terminal() {
            if task.status == TaskStatus::Failed {
                refund_failed_task(self.credits.as_ref(), &task).await?;
            }
            return Ok(task);
        }

        // 2. Nothing to poll before the provider accepted the job
        let Some(job_id) = task.provider_task_id.clone() else {
            return Ok(task);
        };

        // 3. Poll once; a provider hiccup leaves the task as stored
        let provider = self.providers.get(task.provider)?;
        let update = match provider.fetch_status(&job_id).await {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!(task_id = %task.id, provider = %task.provider, error = %e, "Status poll failed");
                return Ok(task);
            }
        };

        // 4. Apply and persist
        let before = task.status;
        task.apply_update(update)?;
        if task.status != before || task.status == TaskStatus::Processing {
            self.tasks.update(&task).await?;
        }
        if task.status != before {
            tracing::info!(task_id = %task.id, from = %before, to = %task.status, "Task status changed");
        }

        // 5. Refund on failure
        if task.status == TaskStatus::Failed {
            refund_failed_task(self.credits.as_ref(), &task).await?;
        }

        Ok(task)
    }
}
