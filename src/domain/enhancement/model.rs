//! Enhancement model catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::TaskError;

/// External inference provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Replicate,
    RunningHub,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Replicate => "replicate",
            ProviderKind::RunningHub => "runninghub",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replicate" => Ok(ProviderKind::Replicate),
            "runninghub" => Ok(ProviderKind::RunningHub),
            other => Err(TaskError::validation(
                "provider",
                format!("Unknown provider: {}", other),
            )),
        }
    }
}

/// A model users can pick, with where it runs and what it costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementModel {
    pub id: &'static str,
    pub display_name: &'static str,
    pub provider: ProviderKind,
    /// Provider-side model reference (`owner/name` on Replicate).
    #[serde(skip)]
    pub provider_model: &'static str,
    pub credit_cost: i64,
}

const MODELS: [EnhancementModel; 4] = [
    EnhancementModel {
        id: "real-esrgan",
        display_name: "Real-ESRGAN Upscale",
        provider: ProviderKind::Replicate,
        provider_model: "nightmareai/real-esrgan",
        credit_cost: 5,
    },
    EnhancementModel {
        id: "gfpgan",
        display_name: "GFPGAN Face Restore",
        provider: ProviderKind::Replicate,
        provider_model: "tencentarc/gfpgan",
        credit_cost: 5,
    },
    EnhancementModel {
        id: "clarity-upscaler",
        display_name: "Clarity Upscaler",
        provider: ProviderKind::Replicate,
        provider_model: "philz1337x/clarity-upscaler",
        credit_cost: 10,
    },
    EnhancementModel {
        id: "skin-editor",
        display_name: "Skin Editor",
        provider: ProviderKind::RunningHub,
        provider_model: "workflow",
        credit_cost: 15,
    },
];

impl EnhancementModel {
    pub fn catalog() -> &'static [EnhancementModel] {
        &MODELS
    }

    pub fn find(id: &str) -> Result<&'static EnhancementModel, TaskError> {
        MODELS
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| TaskError::unknown_model(id))
    }
}
