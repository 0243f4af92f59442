//! PostgreSQL implementation of TaskRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::enhancement::{EnhancementTask, ProviderKind, TaskStatus};
use crate::domain::foundation::{DomainError, ErrorCode, TaskId, Timestamp, UserId};
use crate::ports::{TaskPage, TaskQuery, TaskRepository};

pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str = "id, user_id, status, progress, original_url, enhanced_url, provider, model, \
                       provider_task_id, credits_consumed, error, created_at, updated_at, completed_at";

#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    user_id: String,
    status: String,
    progress: i16,
    original_url: String,
    enhanced_url: Option<String>,
    provider: String,
    model: String,
    provider_task_id: Option<String>,
    credits_consumed: i64,
    error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<TaskRow> for EnhancementTask {
    type Error = DomainError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(EnhancementTask {
            id: TaskId::from_uuid(row.id),
            user_id: UserId::new(row.user_id)
                .map_err(|e| DomainError::database(format!("Invalid user_id: {}", e)))?,
            status: row.status.parse::<TaskStatus>()?,
            progress: row.progress.clamp(0, 100) as u8,
            original_url: row.original_url,
            enhanced_url: row.enhanced_url,
            provider: row.provider.parse::<ProviderKind>()?,
            model: row.model,
            provider_task_id: row.provider_task_id,
            credits_consumed: row.credits_consumed,
            error: row.error,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
            completed_at: row.completed_at.map(Timestamp::from_datetime),
        })
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn create(&self, task: &EnhancementTask) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "INSERT INTO enhancement_tasks ({}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
            COLUMNS
        ))
        .bind(task.id.as_uuid())
        .bind(task.user_id.as_str())
        .bind(task.status.as_str())
        .bind(i16::from(task.progress))
        .bind(&task.original_url)
        .bind(task.enhanced_url.as_deref())
        .bind(task.provider.as_str())
        .bind(&task.model)
        .bind(task.provider_task_id.as_deref())
        .bind(task.credits_consumed)
        .bind(task.error.as_deref())
        .bind(task.created_at.as_datetime())
        .bind(task.updated_at.as_datetime())
        .bind(task.completed_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to create task: {}", e)))?;
        Ok(())
    }

    async fn update(&self, task: &EnhancementTask) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE enhancement_tasks SET
                status = $2,
                progress = $3,
                enhanced_url = $4,
                provider_task_id = $5,
                error = $6,
                updated_at = $7,
                completed_at = $8
            WHERE id = $1
            "#,
        )
        .bind(task.id.as_uuid())
        .bind(task.status.as_str())
        .bind(i16::from(task.progress))
        .bind(task.enhanced_url.as_deref())
        .bind(task.provider_task_id.as_deref())
        .bind(task.error.as_deref())
        .bind(task.updated_at.as_datetime())
        .bind(task.completed_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update task: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::TaskNotFound,
                format!("Task {} not found", task.id),
            ));
        }
        Ok(())
    }

    async fn find(
        &self,
        user_id: &UserId,
        id: &TaskId,
    ) -> Result<Option<EnhancementTask>, DomainError> {
        let row: Option<TaskRow> = sqlx::query_as(&format!(
            "SELECT {} FROM enhancement_tasks WHERE id = $1 AND user_id = $2",
            COLUMNS
        ))
        .bind(id.as_uuid())
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load task: {}", e)))?;

        row.map(EnhancementTask::try_from).transpose()
    }

    async fn list(&self, user_id: &UserId, query: TaskQuery) -> Result<TaskPage, DomainError> {
        let status = query.status.map(|s| s.as_str());

        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM enhancement_tasks
            WHERE user_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            COLUMNS
        ))
        .bind(user_id.as_str())
        .bind(status)
        .bind(i64::from(query.limit))
        .bind(i64::from(query.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list tasks: {}", e)))?;

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM enhancement_tasks WHERE user_id = $1 AND ($2::TEXT IS NULL OR status = $2)",
        )
        .bind(user_id.as_str())
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to count tasks: {}", e)))?;

        let tasks = rows
            .into_iter()
            .map(EnhancementTask::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TaskPage {
            tasks,
            total: total.max(0) as u64,
        })
    }
}
