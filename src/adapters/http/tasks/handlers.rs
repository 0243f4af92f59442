//! HTTP handlers for enhancement task endpoints.

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::adapters::http::error::TaskApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::state::AppState;
use crate::application::handlers::tasks::{
    GetTaskStatusQuery, ListTasksQuery, SubmitEnhancementCommand,
};

use super::dto::{ListTasksParams, SubmitEnhancementRequest, TaskListResponse, TaskResponse};

/// POST /api/tasks - Charge credits and submit an enhancement job
pub async fn submit_task(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<SubmitEnhancementRequest>,
) -> Result<impl IntoResponse, TaskApiError> {
    let handler = state.submit_enhancement_handler();
    let cmd = SubmitEnhancementCommand {
        user_id: user.id,
        model: request.model,
        image_url: request.image_url,
    };

    let task = handler.handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(TaskResponse { task })))
}

/// GET /api/tasks/:id - Task status, polling the provider while it runs
pub async fn get_task(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(task_id): Path<String>,
) -> Result<impl IntoResponse, TaskApiError> {
    let handler = state.task_status_handler();
    let query = GetTaskStatusQuery {
        user_id: user.id,
        task_id,
    };

    let task = handler.handle(query).await?;

    Ok(Json(TaskResponse { task }))
}

/// GET /api/tasks/list - A page of the caller's tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<ListTasksParams>,
) -> Result<impl IntoResponse, TaskApiError> {
    let handler = state.list_tasks_handler();
    let query = ListTasksQuery {
        user_id: user.id,
        status: params.status,
        limit: params.limit,
        offset: params.offset,
    };

    let result = handler.handle(query).await?;

    Ok(Json(TaskListResponse::from(result)))
}
