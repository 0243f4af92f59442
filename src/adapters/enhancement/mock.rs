//! Mock enhancement provider for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::enhancement::{ProviderKind, ProviderUpdate};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{EnhancementProvider, SubmissionRequest};

/// Scripted provider: submissions get sequential ids and status polls
/// replay queued updates per job.
pub struct MockEnhancementProvider {
    kind: ProviderKind,
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    submissions: Vec<SubmissionRequest>,
    updates: HashMap<String, VecDeque<ProviderUpdate>>,
    default_update: Option<ProviderUpdate>,
    submit_error: Option<String>,
    status_error: Option<String>,
}

impl MockEnhancementProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Make every `submit` fail with a provider error.
    pub fn with_submit_error(self, message: impl Into<String>) -> Self {
        self.state.lock().unwrap().submit_error = Some(message.into());
        self
    }

    /// Make every `fetch_status` fail with a provider error.
    pub fn with_status_error(self, message: impl Into<String>) -> Self {
        self.state.lock().unwrap().status_error = Some(message.into());
        self
    }

    /// Update returned when a job has nothing queued.
    pub fn with_default_update(self, update: ProviderUpdate) -> Self {
        self.state.lock().unwrap().default_update = Some(update);
        self
    }

    /// Queue an update for a job id (`job-1`, `job-2`, ... in submit order).
    pub fn push_update(&self, job_id: &str, update: ProviderUpdate) {
        self.state
            .lock()
            .unwrap()
            .updates
            .entry(job_id.to_string())
            .or_default()
            .push_back(update);
    }

    pub fn submissions(&self) -> Vec<SubmissionRequest> {
        self.state.lock().unwrap().submissions.clone()
    }
}

#[async_trait]
impl EnhancementProvider for MockEnhancementProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn submit(&self, request: SubmissionRequest) -> Result<String, DomainError> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.submit_error {
            return Err(DomainError::new(ErrorCode::EnhancementProviderError, message.clone()));
        }
        state.submissions.push(request);
        Ok(format!("job-{}", state.submissions.len()))
    }

    async fn fetch_status(&self, provider_task_id: &str) -> Result<ProviderUpdate, DomainError> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.status_error {
            return Err(DomainError::new(ErrorCode::EnhancementProviderError, message.clone()));
        }
        let queued = state
            .updates
            .get_mut(provider_task_id)
            .and_then(|queue| queue.pop_front());
        Ok(queued
            .or_else(|| state.default_update.clone())
            .unwrap_or_else(|| ProviderUpdate::processing(None)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enhancement::TaskStatus;

    fn request() -> SubmissionRequest {
        SubmissionRequest {
            provider_model: "nightmareai/real-esrgan".to_string(),
            image_url: "https://img.sharpii.ai/in.png".to_string(),
        }
    }

    #[tokio::test]
    async fn submissions_get_sequential_ids() {
        let mock = MockEnhancementProvider::new(ProviderKind::Replicate);
        assert_eq!(mock.submit(request()).await.unwrap(), "job-1");
        assert_eq!(mock.submit(request()).await.unwrap(), "job-2");
    }

    #[tokio::test]
    async fn queued_updates_replay_in_order() {
        let mock = MockEnhancementProvider::new(ProviderKind::Replicate);
        mock.push_update("job-1", ProviderUpdate::processing(Some(40)));
        mock.push_update("job-1", ProviderUpdate::completed("https://out/1.png"));

        assert_eq!(mock.fetch_status("job-1").await.unwrap().progress, Some(40));
        assert_eq!(mock.fetch_status("job-1").await.unwrap().status, TaskStatus::Completed);
        assert_eq!(mock.fetch_status("job-1").await.unwrap().status, TaskStatus::Processing);
    }

    #[tokio::test]
    async fn submit_error_is_reported() {
        let mock = MockEnhancementProvider::new(ProviderKind::RunningHub).with_submit_error("down");
        assert!(mock.submit(request()).await.is_err());
    }
}
