//! ListTasksHandler - a page of the caller's tasks.

use std::sync::Arc;

use crate::domain::enhancement::{EnhancementTask, TaskError, TaskStatus};
use crate::domain::foundation::UserId;
use crate::ports::{TaskQuery, TaskRepository};

pub const DEFAULT_TASK_PAGE_SIZE: u32 = 20;
pub const MAX_TASK_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct ListTasksQuery {
    pub user_id: UserId,
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListTasksResult {
    pub tasks: Vec<EnhancementTask>,
    pub total: u64,
    pub has_more: bool,
}

pub struct ListTasksHandler {
    tasks: Arc<dyn TaskRepository>,
}

impl ListTasksHandler {
    pub fn new(tasks: Arc<dyn TaskRepository>) -> Self {
        Self { tasks }
    }

    pub async fn handle(&self, query: ListTasksQuery) -> Result<ListTasksResult, TaskError> {
        let status = query
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "all")
            .map(str::parse::<TaskStatus>)
            .transpose()?;

        let window = TaskQuery {
            status,
            limit: query
                .limit
                .unwrap_or(DEFAULT_TASK_PAGE_SIZE)
                .clamp(1, MAX_TASK_PAGE_SIZE),
            offset: query.offset.unwrap_or(0),
        };

        let page = self.tasks.list(&query.user_id, window).await?;
        let has_more = page.has_more(&window);
        Ok(ListTasksResult {
            tasks: page.tasks,
            total: page.total,
            has_more,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{other_user, user, BillingFixture};
    use crate::domain::enhancement::{EnhancementModel, ProviderUpdate};
    use crate::domain::foundation::Timestamp;

    async fn seed(fx: &BillingFixture, user_id: &UserId, count: usize, completed: usize) {
        let model = EnhancementModel::find("real-esrgan").unwrap();
        for i in 0..count {
            let mut task =
                EnhancementTask::new(user_id.clone(), model, format!("https://img/{}.png", i))
                    .unwrap();
            task.created_at = Timestamp::now().add_days(-(i as i64));
            if i < completed {
                task.apply_update(ProviderUpdate::completed("https://out/x.png"))
                    .unwrap();
            }
            fx.tasks.create(&task).await.unwrap();
        }
    }

    fn query(status: Option<&str>, limit: Option<u32>, offset: Option<u32>) -> ListTasksQuery {
        ListTasksQuery {
            user_id: user().id,
            status: status.map(str::to_string),
            limit,
            offset,
        }
    }

    #[tokio::test]
    async fn pages_newest_first() {
        let fx = BillingFixture::new();
        seed(&fx, &user().id, 5, 0).await;
        let handler = ListTasksHandler::new(fx.tasks.clone());

        let first = handler.handle(query(None, Some(2), None)).await.unwrap();
        let last = handler
            .handle(query(None, Some(2), Some(4)))
            .await
            .unwrap();

        assert_eq!(first.tasks.len(), 2);
        assert_eq!(first.total, 5);
        assert!(first.has_more);
        assert!(first.tasks[0].created_at > first.tasks[1].created_at);
        assert_eq!(last.tasks.len(), 1);
        assert!(!last.has_more);
    }

    #[tokio::test]
    async fn filters_by_status() {
        let fx = BillingFixture::new();
        seed(&fx, &user().id, 4, 1).await;
        let handler = ListTasksHandler::new(fx.tasks.clone());

        let completed = handler
            .handle(query(Some("completed"), None, None))
            .await
            .unwrap();
        let all = handler.handle(query(Some("all"), None, None)).await.unwrap();

        assert_eq!(completed.total, 1);
        assert_eq!(all.total, 4);
    }

    #[tokio::test]
    async fn only_own_tasks_are_listed() {
        let fx = BillingFixture::new();
        seed(&fx, &other_user().id, 3, 0).await;

        let result = ListTasksHandler::new(fx.tasks.clone())
            .handle(query(None, None, None))
            .await
            .unwrap();

        assert_eq!(result.total, 0);
        assert!(!result.has_more);
    }

    #[tokio::test]
    async fn unknown_status_is_rejected() {
        let fx = BillingFixture::new();

        let result = ListTasksHandler::new(fx.tasks.clone())
            .handle(query(Some("cancelled"), None, None))
            .await;

        assert!(matches!(result, Err(TaskError::ValidationFailed { .. })));
    }
}
