//! Enhancement provider configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Image inference provider settings (Replicate, RunningHub)
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Replicate API token
    pub replicate_api_token: Option<String>,

    /// RunningHub API key
    pub runninghub_api_key: Option<String>,

    /// RunningHub workflow id used for workflow-backed models
    pub runninghub_workflow_id: Option<String>,

    /// Node id of the image input in the RunningHub workflow
    #[serde(default = "default_runninghub_image_node")]
    pub runninghub_image_node_id: String,

    #[serde(default = "default_replicate_base_url")]
    pub replicate_base_url: String,

    #[serde(default = "default_runninghub_base_url")]
    pub runninghub_base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn has_replicate(&self) -> bool {
        self.replicate_api_token.as_ref().is_some_and(|k| !k.is_empty())
    }

    pub fn has_runninghub(&self) -> bool {
        self.runninghub_api_key.as_ref().is_some_and(|k| !k.is_empty())
            && self.runninghub_workflow_id.as_ref().is_some_and(|w| !w.is_empty())
    }

    /// Validate provider configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_replicate() && !self.has_runninghub() {
            return Err(ValidationError::NoEnhancementProviderConfigured);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            replicate_api_token: None,
            runninghub_api_key: None,
            runninghub_workflow_id: None,
            runninghub_image_node_id: default_runninghub_image_node(),
            replicate_base_url: default_replicate_base_url(),
            runninghub_base_url: default_runninghub_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_runninghub_image_node() -> String {
    "1".to_string()
}

fn default_replicate_base_url() -> String {
    "https://api.replicate.com".to_string()
}

fn default_runninghub_base_url() -> String {
    "https://www.runninghub.ai".to_string()
}

fn default_timeout() -> u64 {
    30
}
