//! Task database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for tasks table
#[derive(Debug, Clone, FromRow)]
pub struct TaskModel {
    pub id: i64,
    pub task_type: String,
    pub member_ids: Vec<i64>,
    pub role_ids: Vec<i64>,
    pub status: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}
