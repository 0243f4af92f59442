//! Replicate inference provider.
//!
//! Predictions are created against the model's latest version and polled
//! by id. Replicate reports no numeric progress, so it is scraped from the
//! prediction logs when present.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::domain::enhancement::{ProviderKind, ProviderUpdate};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{EnhancementProvider, SubmissionRequest};

/// Configuration for the Replicate provider.
#[derive(Debug, Clone)]
pub struct ReplicateConfig {
    api_token: Secret<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl ReplicateConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: Secret::new(api_token.into()),
            base_url: "https://api.replicate.com".to_string(),
            timeout: Duration::from_secs(30),
        }
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

pub struct ReplicateProvider {
    config: ReplicateConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: String,
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    logs: Option<String>,
}

impl ReplicateProvider {
    pub fn new(config: ReplicateConfig) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| provider_error(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    /// Models disagree on the name of the image input.
    fn input_for(provider_model: &str, image_url: &str) -> serde_json::Value {
        match provider_model {
            "tencentarc/gfpgan" => json!({ "img": image_url, "version": "v1.4", "scale": 2 }),
            "nightmareai/real-esrgan" => json!({ "image": image_url, "scale": 4 }),
            _ => json!({ "image": image_url }),
        }
    }

    async fn read_prediction(&self, response: reqwest::Response) -> Result<Prediction, DomainError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), error = %body, "Replicate request failed");
            return Err(provider_error(format!(
                "Replicate returned {}: {}",
                status.as_u16(),
                body
            )));
        }
        response
            .json::<Prediction>()
            .await
            .map_err(|e| provider_error(format!("Failed to parse Replicate response: {}", e)))
    }
}

fn provider_error(message: impl Into<String>) -> DomainError {
    DomainError::new(ErrorCode::EnhancementProviderError, message)
}

fn transport_error(e: reqwest::Error) -> DomainError {
    if e.is_timeout() {
        DomainError::new(ErrorCode::UpstreamTimeout, "Replicate request timed out")
    } else {
        provider_error(e.to_string())
    }
}

/// First URL in a prediction output (string or array of strings).
fn output_url(output: &serde_json::Value) -> Option<String> {
    match output {
        serde_json::Value::String(url) => Some(url.clone()),
        serde_json::Value::Array(items) => items.iter().find_map(|v| v.as_str().map(String::from)),
        _ => None,
    }
}

/// Last `NN%` marker in the logs.
fn progress_from_logs(logs: &str) -> Option<u8> {
    logs.rsplit('%').skip(1).find_map(|chunk| {
        let digits: String = chunk
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        digits.parse::<u8>().ok().filter(|p| *p <= 100)
    })
}

fn to_update(prediction: Prediction) -> ProviderUpdate {
    match prediction.status.as_str() {
        "succeeded" => match prediction.output.as_ref().and_then(output_url) {
            Some(url) => ProviderUpdate::completed(url),
            None => ProviderUpdate::failed("Prediction succeeded without output"),
        },
        "failed" | "canceled" => ProviderUpdate::failed(
            prediction
                .error
                .map(|e| e.as_str().map(String::from).unwrap_or_else(|| e.to_string()))
                .unwrap_or_else(|| format!("Prediction {}", prediction.status)),
        ),
        _ => ProviderUpdate::processing(prediction.logs.as_deref().and_then(progress_from_logs)),
    }
}

#[async_trait]
impl EnhancementProvider for ReplicateProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Replicate
    }

    async fn submit(&self, request: SubmissionRequest) -> Result<String, DomainError> {
        let url = format!(
            "{}/v1/models/{}/predictions",
            self.config.base_url, request.provider_model
        );
        let body = json!({
            "input": Self::input_for(&request.provider_model, &request.image_url),
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let prediction = self.read_prediction(response).await?;
        tracing::info!(prediction_id = %prediction.id, model = %request.provider_model, "Replicate prediction created");
        Ok(prediction.id)
    }

    async fn fetch_status(&self, provider_task_id: &str) -> Result<ProviderUpdate, DomainError> {
        let url = format!("{}/v1/predictions/{}", self.config.base_url, provider_task_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.config.api_token.expose_secret())
            .send()
            .await
            .map_err(transport_error)?;

        Ok(to_update(self.read_prediction(response).await?))
    }
}
