//! Axum router configuration for enhancement task endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{get_task, list_tasks, submit_task};
use crate::adapters::http::state::AppState;

/// Create the tasks router, mounted at `/api/tasks`.
///
/// # Routes
/// - `POST /` - Submit an enhancement
/// - `GET /list?status&limit&offset` - Paged task list
/// - `GET /:id` - Task status
pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_task))
        .route("/list", get(list_tasks))
        .route("/:id", get(get_task))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::test_support::test_state;

    #[test]
    fn task_routes_creates_router() {
        let router = task_routes();
        let _: Router<()> = router.with_state(test_state());
    }
}
