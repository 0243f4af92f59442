//! RunningHub workflow provider.
//!
//! Runs a ComfyUI workflow hosted on RunningHub. The input image is
//! injected into a configured node; the result comes from the task's
//! output list once the status reports `SUCCESS`.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::domain::enhancement::{ProviderKind, ProviderUpdate};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{EnhancementProvider, SubmissionRequest};

/// Configuration for the RunningHub provider.
#[derive(Debug, Clone)]
pub struct RunningHubConfig {
    api_key: Secret<String>,
    pub workflow_id: String,
    /// Node that receives the input image.
    pub image_node_id: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl RunningHubConfig {
    pub fn new(api_key: impl Into<String>, workflow_id: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            workflow_id: workflow_id.into(),
            image_node_id: "1".to_string(),
            base_url: "https://www.runninghub.ai".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_image_node(mut self, node_id: impl Into<String>) -> Self {
        self.image_node_id = node_id.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct RunningHubProvider {
    config: RunningHubConfig,
    client: Client,
}

/// Every RunningHub response wraps its payload; `code == 0` is success.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedTask {
    task_id: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskOutput {
    file_url: String,
}

fn provider_error(message: impl Into<String>) -> DomainError {
    DomainError::new(ErrorCode::EnhancementProviderError, message)
}

fn transport_error(e: reqwest::Error) -> DomainError {
    if e.is_timeout() {
        DomainError::new(ErrorCode::UpstreamTimeout, "RunningHub request timed out")
    } else {
        provider_error(e.to_string())
    }
}

/// Maps a RunningHub task status string to a provider update.
fn status_update(status: &str) -> Option<ProviderUpdate> {
    match status {
        "QUEUED" => Some(ProviderUpdate::processing(Some(5))),
        "RUNNING" => Some(ProviderUpdate::processing(None)),
        "FAILED" => Some(ProviderUpdate::failed("RunningHub task failed")),
        _ => None,
    }
}

impl RunningHubProvider {
    pub fn new(config: RunningHubConfig) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| provider_error(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, DomainError> {
        let response = self
            .client
            .post(format!("{}{}", self.config.base_url, path))
            .header("Host", "www.runninghub.ai")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), error = %text, path, "RunningHub request failed");
            return Err(provider_error(format!("RunningHub returned {}", status.as_u16())));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| provider_error(format!("Failed to parse RunningHub response: {}", e)))?;

        if envelope.code != 0 {
            return Err(provider_error(
                envelope
                    .msg
                    .unwrap_or_else(|| format!("RunningHub error code {}", envelope.code)),
            ));
        }
        envelope
            .data
            .ok_or_else(|| provider_error("RunningHub response missing data"))
    }
}

#[async_trait]
impl EnhancementProvider for RunningHubProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::RunningHub
    }

    async fn submit(&self, request: SubmissionRequest) -> Result<String, DomainError> {
        let body = json!({
            "apiKey": self.config.api_key.expose_secret(),
            "workflowId": self.config.workflow_id,
            "nodeInfoList": [{
                "nodeId": self.config.image_node_id,
                "fieldName": "image",
                "fieldValue": request.image_url,
            }],
        });

        let created: CreatedTask = self.call("/task/openapi/create", body).await?;
        let task_id = match created.task_id {
            serde_json::Value::String(id) => id,
            other => other.to_string(),
        };
        tracing::info!(task_id = %task_id, "RunningHub task created");
        Ok(task_id)
    }

    async fn fetch_status(&self, provider_task_id: &str) -> Result<ProviderUpdate, DomainError> {
        let body = json!({
            "apiKey": self.config.api_key.expose_secret(),
            "taskId": provider_task_id,
        });

        let status: String = self.call("/task/openapi/status", body.clone()).await?;
        if let Some(update) = status_update(&status) {
            return Ok(update);
        }
        if status != "SUCCESS" {
            return Ok(ProviderUpdate::processing(None));
        }

        let outputs: Vec<TaskOutput> = self.call("/task/openapi/outputs", body).await?;
        Ok(match outputs.into_iter().next() {
            Some(output) => ProviderUpdate::completed(output.file_url),
            None => ProviderUpdate::failed("RunningHub task finished without output"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enhancement::TaskStatus;

    #[test]
    fn queued_and_running_are_processing() {
        assert_eq!(status_update("QUEUED").unwrap().status, TaskStatus::Processing);
        assert_eq!(status_update("RUNNING").unwrap().status, TaskStatus::Processing);
    }

    #[test]
    fn failed_is_terminal() {
        assert_eq!(status_update("FAILED").unwrap().status, TaskStatus::Failed);
    }

    #[test]
    fn success_needs_outputs() {
        assert!(status_update("SUCCESS").is_none());
    }

    #[test]
    fn envelope_with_error_code_parses() {
        let env: Envelope<String> =
            serde_json::from_str(r#"{"code": 804, "msg": "APIKEY_INVALID", "data": null}"#).unwrap();
        assert_eq!(env.code, 804);
        assert!(env.data.is_none());
    }

    #[test]
    fn created_task_accepts_numeric_id() {
        let env: Envelope<CreatedTask> =
            serde_json::from_str(r#"{"code": 0, "data": {"taskId": 19001, "taskStatus": "QUEUED"}}"#)
                .unwrap();
        assert_eq!(env.data.unwrap().task_id.to_string(), "19001");
    }
}
