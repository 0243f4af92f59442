//! Enhancement task aggregate.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{StateMachine, TaskId, Timestamp, UserId};

use super::{EnhancementModel, ProviderKind, TaskError, TaskStatus};

/// Status report from an inference provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUpdate {
    pub status: TaskStatus,
    pub progress: Option<u8>,
    pub output_url: Option<String>,
    pub error: Option<String>,
}

impl ProviderUpdate {
    pub fn processing(progress: Option<u8>) -> Self {
        Self {
            status: TaskStatus::Processing,
            progress,
            output_url: None,
            error: None,
        }
    }

    pub fn completed(output_url: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Completed,
            progress: Some(100),
            output_url: Some(output_url.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Failed,
            progress: None,
            output_url: None,
            error: Some(error.into()),
        }
    }
}

/// One submitted enhancement job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementTask {
    pub id: TaskId,
    pub user_id: UserId,
    pub status: TaskStatus,
    pub progress: u8,
    pub original_url: String,
    pub enhanced_url: Option<String>,
    pub provider: ProviderKind,
    pub model: String,
    #[serde(skip_serializing)]
    pub provider_task_id: Option<String>,
    pub credits_consumed: i64,
    pub error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl EnhancementTask {
    /// Creates a pending task for `model` on `original_url`.
    pub fn new(
        user_id: UserId,
        model: &EnhancementModel,
        original_url: impl Into<String>,
    ) -> Result<Self, TaskError> {
        let original_url = original_url.into();
        let trimmed = original_url.trim();
        if !(trimmed.starts_with("https://") || trimmed.starts_with("http://"))
            || trimmed.contains(char::is_whitespace)
        {
            return Err(TaskError::invalid_image_url(original_url));
        }

        let now = Timestamp::now();
        Ok(Self {
            id: TaskId::new(),
            user_id,
            status: TaskStatus::Pending,
            progress: 0,
            original_url: trimmed.to_string(),
            enhanced_url: None,
            provider: model.provider,
            model: model.id.to_string(),
            provider_task_id: None,
            credits_consumed: model.credit_cost,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Records the provider's job id after a successful submission.
    pub fn mark_submitted(&mut self, provider_task_id: impl Into<String>) {
        self.provider_task_id = Some(provider_task_id.into());
        self.updated_at = Timestamp::now();
    }

    /// Applies a provider status report.
    ///
    /// A completion without an output URL is recorded as a failure.
    pub fn apply_update(&mut self, update: ProviderUpdate) -> Result<(), TaskError> {
        if self.status == TaskStatus::Pending && update.status == TaskStatus::Pending {
            return Ok(());
        }
        self.status
            .transition_to(update.status)
            .map_err(|_| TaskError::invalid_state(self.status.as_str(), update.status.as_str()))?;

        let now = Timestamp::now();
        match update.status {
            TaskStatus::Pending => {}
            TaskStatus::Processing => {
                self.status = TaskStatus::Processing;
                if let Some(progress) = update.progress {
                    self.progress = progress.min(99).max(self.progress);
                }
            }
            TaskStatus::Completed => match update.output_url {
                Some(url) if !url.is_empty() => {
                    self.status = TaskStatus::Completed;
                    self.progress = 100;
                    self.enhanced_url = Some(url);
                    self.completed_at = Some(now);
                }
                _ => self.record_failure("Provider finished without an output image", now),
            },
            TaskStatus::Failed => {
                let reason = update
                    .error
                    .unwrap_or_else(|| "Enhancement failed".to_string());
                self.record_failure(&reason, now);
            }
        }
        self.updated_at = now;
        Ok(())
    }

    /// Fails a non-terminal task, e.g. when submission itself errored.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), TaskError> {
        self.apply_update(ProviderUpdate::failed(reason))
    }

    fn record_failure(&mut self, reason: &str, now: Timestamp) {
        self.status = TaskStatus::Failed;
        self.error = Some(reason.to_string());
        self.completed_at = Some(now);
    }
}
