//! Task handlers
//!
//! Endpoints for queueing moderation tasks and following their progress.

use axum::{extract::State, Json};
use butler_service::dto::{
    ApiResponse, CreateTaskRequest, ListTasksQuery, PageResponse, TaskResponse,
};
use butler_service::TaskService;

use crate::extractors::{TaskIdPath, ValidatedJson, ValidatedQuery};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// Queue a task
///
/// POST /tasks
pub async fn create_task(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateTaskRequest>,
) -> ApiResult<Created<Json<ApiResponse<TaskResponse>>>> {
    let service = TaskService::new(state.service_context());
    let task = service.create_task(request).await?;
    Ok(Created(Json(ApiResponse::new(task))))
}

/// Get a task
///
/// GET /tasks/{task_id}
pub async fn get_task(
    State(state): State<AppState>,
    TaskIdPath(task_id): TaskIdPath,
) -> ApiResult<Json<ApiResponse<TaskResponse>>> {
    let service = TaskService::new(state.service_context());
    let task = service.get_task(task_id).await?;
    Ok(Json(ApiResponse::new(task)))
}

/// List tasks
///
/// GET /tasks?status=&limit=&offset=
pub async fn list_tasks(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListTasksQuery>,
) -> ApiResult<Json<PageResponse<TaskResponse>>> {
    let service = TaskService::new(state.service_context());
    Ok(Json(service.list_tasks(query).await?))
}
