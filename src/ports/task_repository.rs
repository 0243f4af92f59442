//! TaskRepository port - enhancement task rows.

use async_trait::async_trait;

use crate::domain::enhancement::{EnhancementTask, TaskStatus};
use crate::domain::foundation::{DomainError, TaskId, UserId};

/// Filter and window for listing a user's tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub limit: u32,
    pub offset: u32,
}

/// One page of tasks, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPage {
    pub tasks: Vec<EnhancementTask>,
    /// Matching tasks across all pages.
    pub total: u64,
}

impl TaskPage {
    pub fn has_more(&self, query: &TaskQuery) -> bool {
        u64::from(query.offset) + (self.tasks.len() as u64) < self.total
    }
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: &EnhancementTask) -> Result<(), DomainError>;

    async fn update(&self, task: &EnhancementTask) -> Result<(), DomainError>;

    /// Finds a task owned by `user_id`.
    async fn find(&self, user_id: &UserId, id: &TaskId)
        -> Result<Option<EnhancementTask>, DomainError>;

    async fn list(&self, user_id: &UserId, query: TaskQuery) -> Result<TaskPage, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn TaskRepository) {}
    }

    #[test]
    fn has_more_when_window_ends_before_total() {
        let query = TaskQuery {
            status: None,
            limit: 2,
            offset: 0,
        };
        let page = TaskPage {
            tasks: Vec::new(),
            total: 3,
        };
        assert!(page.has_more(&query));

        let last = TaskQuery { offset: 3, ..query };
        assert!(!page.has_more(&last));
    }
}
