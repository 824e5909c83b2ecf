//! PostgreSQL implementation of TaskRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use butler_core::entities::{NewTask, Task, TaskStatus, TaskType};
use butler_core::traits::{RepoResult, TaskRepository};
use butler_core::value_objects::Snowflake;

use crate::mappers::snowflakes_to_i64;
use crate::models::TaskModel;

use super::error::{map_check_violation, map_db_error};

const TASK_COLUMNS: &str =
    "id, task_type, member_ids, role_ids, status, error, created_at, modified_at";

/// PostgreSQL implementation of TaskRepository
#[derive(Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    /// Create a new PgTaskRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Conditional status update; only rows currently in `from` move
    ///
    /// Moves that are not edges of the task state machine are rejected
    /// before touching the database.
    async fn advance(
        &self,
        id: i64,
        from: TaskStatus,
        to: TaskStatus,
        error: Option<&str>,
    ) -> RepoResult<bool> {
        from.ensure_transition(to)?;

        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET status = $3, error = COALESCE($4, error), modified_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    #[instrument(skip(self, task), fields(task_type = %task.task_type))]
    async fn create(&self, task: &NewTask) -> RepoResult<Task> {
        let model = sqlx::query_as::<_, TaskModel>(&format!(
            r#"
            INSERT INTO tasks (task_type, member_ids, role_ids)
            VALUES ($1, $2, $3)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(task.task_type.as_str())
        .bind(snowflakes_to_i64(&task.member_ids))
        .bind(snowflakes_to_i64(&task.role_ids))
        .fetch_one(&self.pool)
        .await
        .map_err(map_check_violation)?;

        Task::try_from(model)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Task>> {
        let result = sqlx::query_as::<_, TaskModel>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Task::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        status: Option<TaskStatus>,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Task>> {
        let results = sqlx::query_as::<_, TaskModel>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(status.map(TaskStatus::as_str))
        .bind(limit.clamp(1, 500))
        .bind(offset.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        results.into_iter().map(Task::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn find_by_status(&self, status: TaskStatus) -> RepoResult<Vec<Task>> {
        let results = sqlx::query_as::<_, TaskModel>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE status = $1
            ORDER BY created_at, id
            "#
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        results.into_iter().map(Task::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn mark_started(&self, id: i64) -> RepoResult<bool> {
        self.advance(id, TaskStatus::InQueue, TaskStatus::Started, None)
            .await
    }

    #[instrument(skip(self))]
    async fn mark_finished(&self, id: i64) -> RepoResult<bool> {
        self.advance(id, TaskStatus::Started, TaskStatus::Finished, None)
            .await
    }

    #[instrument(skip(self))]
    async fn mark_failed(&self, id: i64, error: &str) -> RepoResult<bool> {
        self.advance(id, TaskStatus::Started, TaskStatus::Failed, Some(error))
            .await
    }

    #[instrument(skip(self, member_ids), fields(members = member_ids.len()))]
    async fn exists_matching(
        &self,
        task_type: TaskType,
        member_ids: &[Snowflake],
    ) -> RepoResult<bool> {
        // Two-way containment is set equality, independent of order and duplicates
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM tasks
                WHERE task_type = $1 AND member_ids @> $2 AND member_ids <@ $2
            )
            "#,
        )
        .bind(task_type.as_str())
        .bind(snowflakes_to_i64(member_ids))
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(exists)
    }
}
