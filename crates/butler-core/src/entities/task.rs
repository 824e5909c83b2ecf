//! Task entity - one queued moderation action against a set of members

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Moderation action carried by a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    /// Remove members from the community
    Kick,
    /// Remove members and purge their recent messages
    Ban,
    /// Add every listed role to each member
    AssignRole,
    /// Remove every listed role from each member
    RemoveRole,
}

impl TaskType {
    /// Stored representation
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kick => "KICK",
            Self::Ban => "BAN",
            Self::AssignRole => "ASSIGN_ROLE",
            Self::RemoveRole => "REMOVE_ROLE",
        }
    }

    /// Whether this action operates on roles (and therefore needs `role_ids`)
    #[inline]
    pub const fn requires_roles(self) -> bool {
        matches!(self, Self::AssignRole | Self::RemoveRole)
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KICK" => Ok(Self::Kick),
            "BAN" => Ok(Self::Ban),
            "ASSIGN_ROLE" => Ok(Self::AssignRole),
            "REMOVE_ROLE" => Ok(Self::RemoveRole),
            other => Err(DomainError::ValidationError(format!(
                "unknown task type: {other}"
            ))),
        }
    }
}

/// Task lifecycle state
///
/// `IN_QUEUE -> STARTED -> {FINISHED | FAILED}`. FINISHED and FAILED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    InQueue,
    Started,
    Finished,
    Failed,
}

impl TaskStatus {
    /// Stored representation
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InQueue => "IN_QUEUE",
            Self::Started => "STARTED",
            Self::Finished => "FINISHED",
            Self::Failed => "FAILED",
        }
    }

    /// FINISHED and FAILED accept no further transitions
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }

    /// Check whether `self -> next` is an edge of the task state machine
    pub const fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (Self::InQueue, Self::Started)
                | (Self::Started, Self::Finished)
                | (Self::Started, Self::Failed)
        )
    }

    /// Reject any move that is not an edge of the state machine
    pub fn ensure_transition(self, next: TaskStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::InvalidTaskTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_QUEUE" => Ok(Self::InQueue),
            "STARTED" => Ok(Self::Started),
            "FINISHED" => Ok(Self::Finished),
            "FAILED" => Ok(Self::Failed),
            other => Err(DomainError::ValidationError(format!(
                "unknown task status: {other}"
            ))),
        }
    }
}

/// Persisted task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub task_type: TaskType,
    pub member_ids: Vec<Snowflake>,
    pub role_ids: Vec<Snowflake>,
    pub status: TaskStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// A task that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub task_type: TaskType,
    pub member_ids: Vec<Snowflake>,
    pub role_ids: Vec<Snowflake>,
}

impl NewTask {
    /// Build a task, enforcing the member/role invariants
    pub fn new(
        task_type: TaskType,
        member_ids: Vec<Snowflake>,
        role_ids: Vec<Snowflake>,
    ) -> Result<Self, DomainError> {
        if member_ids.is_empty() {
            return Err(DomainError::ValidationError(
                "a task needs at least one member id".to_string(),
            ));
        }
        if task_type.requires_roles() && role_ids.is_empty() {
            return Err(DomainError::ValidationError(format!(
                "{task_type} needs at least one role id"
            )));
        }
        if !task_type.requires_roles() && !role_ids.is_empty() {
            return Err(DomainError::ValidationError(format!(
                "{task_type} does not take role ids"
            )));
        }
        Ok(Self {
            task_type,
            member_ids,
            role_ids,
        })
    }

    /// Ban task for the given members
    pub fn ban(member_ids: Vec<Snowflake>) -> Result<Self, DomainError> {
        Self::new(TaskType::Ban, member_ids, Vec::new())
    }
}
