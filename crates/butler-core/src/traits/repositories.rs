//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation.

use async_trait::async_trait;

use crate::entities::{
    MemberFilter, MirrorMember, MirrorRole, NewTask, Settings, Task, TaskStatus, TaskType,
};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Task Repository
// ============================================================================

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persist a new task in `IN_QUEUE`
    async fn create(&self, task: &NewTask) -> RepoResult<Task>;

    /// Find task by ID
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Task>>;

    /// List tasks, newest first, optionally filtered by status
    async fn list(
        &self,
        status: Option<TaskStatus>,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Task>>;

    /// All tasks in the given status, oldest first
    async fn find_by_status(&self, status: TaskStatus) -> RepoResult<Vec<Task>>;

    /// `IN_QUEUE -> STARTED`. Returns `false` when the task was already claimed.
    async fn mark_started(&self, id: i64) -> RepoResult<bool>;

    /// `STARTED -> FINISHED`
    async fn mark_finished(&self, id: i64) -> RepoResult<bool>;

    /// `STARTED -> FAILED`, storing the error text
    async fn mark_failed(&self, id: i64, error: &str) -> RepoResult<bool>;

    /// Whether any task of `task_type` targets exactly this member set
    async fn exists_matching(
        &self,
        task_type: TaskType,
        member_ids: &[Snowflake],
    ) -> RepoResult<bool>;
}

// ============================================================================
// Roster Repository
// ============================================================================

#[async_trait]
pub trait RosterRepository: Send + Sync {
    /// Replace every mirrored role, member and link in one transaction
    async fn replace_all(&self, roles: &[MirrorRole], members: &[MirrorMember])
        -> RepoResult<()>;

    /// List mirrored members ordered by account creation
    async fn list_members(&self, filter: &MemberFilter) -> RepoResult<Vec<MirrorMember>>;

    /// Find a mirrored member by ID
    async fn find_member(&self, id: Snowflake) -> RepoResult<Option<MirrorMember>>;

    /// List mirrored roles, highest position first
    async fn list_roles(&self) -> RepoResult<Vec<MirrorRole>>;
}

// ============================================================================
// Settings Repository
// ============================================================================

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Load the singleton row, inserting defaults on first access
    async fn get_or_create(&self) -> RepoResult<Settings>;

    /// Persist changed settings
    async fn update(&self, settings: &Settings) -> RepoResult<Settings>;
}
