//! Task service
//!
//! Queues moderation tasks and exposes their progress.

use tracing::{info, instrument};
use validator::Validate;

use butler_core::NewTask;

use crate::dto::{CreateTaskRequest, ListTasksQuery, PageResponse, TaskResponse, DEFAULT_PAGE_LIMIT};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Task service
pub struct TaskService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> TaskService<'a> {
    /// Create a new TaskService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Queue a task in `IN_QUEUE`
    #[instrument(skip(self, request), fields(task_type = %request.task_type))]
    pub async fn create_task(&self, request: CreateTaskRequest) -> ServiceResult<TaskResponse> {
        request
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        let new_task = NewTask::new(request.task_type, request.member_ids, request.role_ids)?;
        let task = self.ctx.task_repo().create(&new_task).await?;

        info!(task_id = task.id, members = task.member_ids.len(), "Task queued");
        Ok(TaskResponse::from(task))
    }

    /// Get a task by ID
    #[instrument(skip(self))]
    pub async fn get_task(&self, task_id: i64) -> ServiceResult<TaskResponse> {
        let task = self
            .ctx
            .task_repo()
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task", task_id.to_string()))?;

        Ok(TaskResponse::from(task))
    }

    /// List tasks newest first
    #[instrument(skip(self))]
    pub async fn list_tasks(&self, query: ListTasksQuery) -> ServiceResult<PageResponse<TaskResponse>> {
        query
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        let offset = query.offset.unwrap_or(0);
        let tasks = self.ctx.task_repo().list(query.status, limit, offset).await?;

        Ok(PageResponse::new(
            tasks.iter().map(TaskResponse::from).collect(),
            limit,
            offset,
        ))
    }
}
