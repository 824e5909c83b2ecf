//! Response DTOs for API endpoints
//!
//! All response DTOs implement `Serialize` for JSON output.
//! Snowflake IDs are serialized as strings for JavaScript compatibility.

use chrono::{DateTime, Utc};
use serde::Serialize;

use butler_core::{TaskStatus, TaskType};

// ============================================================================
// Common Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Offset-paginated list
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub data: Vec<T>,
    pub limit: i64,
    pub offset: i64,
}

impl<T> PageResponse<T> {
    pub fn new(data: Vec<T>, limit: i64, offset: i64) -> Self {
        Self {
            data,
            limit,
            offset,
        }
    }
}

// ============================================================================
// Task Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TaskResponse {
    pub id: i64,
    pub task_type: TaskType,
    pub member_ids: Vec<String>,
    pub role_ids: Vec<String>,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

// ============================================================================
// Roster Responses
// ============================================================================

/// Mirrored member
#[derive(Debug, Clone, Serialize)]
pub struct MemberResponse {
    pub id: String,
    pub name: String,
    pub username: String,
    pub discriminator: String,
    pub nick: Option<String>,
    pub avatar_url: String,
    pub bot: bool,
    pub pending: bool,
    pub engagement_score: i16,
    pub messages_count: i64,
    pub age_of_account: String,
    pub role_ids: Vec<String>,
    pub premium_since: Option<DateTime<Utc>>,
    pub joined_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Mirrored role
#[derive(Debug, Clone, Serialize)]
pub struct RoleResponse {
    pub id: String,
    pub name: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Settings Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SettingsResponse {
    pub delete_message_days_when_banned: i16,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

// ============================================================================
// Health Responses
// ============================================================================

/// Basic health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Readiness check response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

/// Health check status for each backing store
#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub database: String,
}

impl ReadinessResponse {
    pub fn ready(database_healthy: bool) -> Self {
        Self {
            status: if database_healthy { "ready" } else { "not_ready" }.to_string(),
            timestamp: Utc::now(),
            checks: HealthChecks {
                database: if database_healthy { "healthy" } else { "unhealthy" }.to_string(),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}
