//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.

use serde::Deserialize;
use validator::Validate;

use butler_core::{Snowflake, TaskStatus, TaskType};

/// Default page size for list endpoints
pub const DEFAULT_PAGE_LIMIT: i64 = 50;

// ============================================================================
// Task Requests
// ============================================================================

/// Queue a moderation task
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTaskRequest {
    pub task_type: TaskType,

    #[validate(length(min = 1, max = 1000, message = "member_ids must hold 1-1000 ids"))]
    pub member_ids: Vec<Snowflake>,

    /// Required for ASSIGN_ROLE / REMOVE_ROLE, empty otherwise
    #[serde(default)]
    #[validate(length(max = 250, message = "role_ids must hold at most 250 ids"))]
    pub role_ids: Vec<Snowflake>,
}

/// `GET /tasks` query
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListTasksQuery {
    pub status: Option<TaskStatus>,

    #[validate(range(min = 1, max = 100, message = "limit must be 1-100"))]
    pub limit: Option<i64>,

    #[validate(range(min = 0, message = "offset must not be negative"))]
    pub offset: Option<i64>,
}

// ============================================================================
// Roster Requests
// ============================================================================

/// `GET /members` query
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct MemberQuery {
    #[validate(length(min = 1, max = 100, message = "search must be 1-100 characters"))]
    pub search: Option<String>,

    pub role_id: Option<Snowflake>,

    pub bot: Option<bool>,

    #[validate(range(min = 0, max = 5, message = "min_engagement must be 0-5"))]
    pub min_engagement: Option<i16>,

    #[validate(range(min = 1, max = 1000, message = "limit must be 1-1000"))]
    pub limit: Option<i64>,

    #[validate(range(min = 0, message = "offset must not be negative"))]
    pub offset: Option<i64>,
}

// ============================================================================
// Settings Requests
// ============================================================================

/// Partial settings update
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSettingsRequest {
    #[validate(range(min = 0, max = 7, message = "delete_message_days_when_banned must be 0-7"))]
    pub delete_message_days_when_banned: Option<i16>,
}
