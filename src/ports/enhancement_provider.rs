//! EnhancementProvider port - external image inference services.

use async_trait::async_trait;

use crate::domain::enhancement::{ProviderKind, ProviderUpdate};
use crate::domain::foundation::DomainError;

/// What a provider needs to start a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    /// Provider-side model reference.
    pub provider_model: String,
    pub image_url: String,
}

/// Submits jobs to and polls one inference provider.
///
/// Jobs are fire-and-forget: there is no cancellation.
#[async_trait]
pub trait EnhancementProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Start a job, returning the provider's job id.
    async fn submit(&self, request: SubmissionRequest) -> Result<String, DomainError>;

    /// Current state of a previously submitted job.
    async fn fetch_status(&self, provider_task_id: &str) -> Result<ProviderUpdate, DomainError>;
}
