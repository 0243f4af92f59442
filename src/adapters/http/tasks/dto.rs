//! HTTP DTOs for enhancement task endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::tasks::ListTasksResult;
use crate::domain::enhancement::EnhancementTask;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEnhancementRequest {
    pub model: String,
    pub image_url: String,
}

/// `GET /api/tasks/list?status&limit&offset`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTasksParams {
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskResponse {
    pub task: EnhancementTask,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListResponse {
    pub tasks: Vec<EnhancementTask>,
    pub total: u64,
    pub has_more: bool,
}

impl From<ListTasksResult> for TaskListResponse {
    fn from(result: ListTasksResult) -> Self {
        Self {
            tasks: result.tasks,
            total: result.total,
            has_more: result.has_more,
        }
    }
}
