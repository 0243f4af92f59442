//! In-memory enhancement task store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::enhancement::EnhancementTask;
use crate::domain::foundation::{DomainError, ErrorCode, TaskId, UserId};
use crate::ports::{TaskPage, TaskQuery, TaskRepository};

#[derive(Default)]
pub struct InMemoryTaskRepository {
    rows: Mutex<HashMap<TaskId, EnhancementTask>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a task regardless of owner.
    pub fn get(&self, id: &TaskId) -> Option<EnhancementTask> {
        self.rows.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, task: &EnhancementTask) -> Result<(), DomainError> {
        self.rows.lock().unwrap().insert(task.id, task.clone());
        Ok(())
    }

    async fn update(&self, task: &EnhancementTask) -> Result<(), DomainError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&task.id) {
            Some(row) => {
                *row = task.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::TaskNotFound,
                format!("Task {} not found", task.id),
            )),
        }
    }

    async fn find(
        &self,
        user_id: &UserId,
        id: &TaskId,
    ) -> Result<Option<EnhancementTask>, DomainError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(id)
            .filter(|t| &t.user_id == user_id)
            .cloned())
    }

    async fn list(&self, user_id: &UserId, query: TaskQuery) -> Result<TaskPage, DomainError> {
        let mut matching: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|t| &t.user_id == user_id)
            .filter(|t| query.status.map_or(true, |s| t.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let tasks = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();
        Ok(TaskPage { tasks, total })
    }
}
