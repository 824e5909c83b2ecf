//! Task entity <-> model mapper

use butler_core::entities::{Task, TaskStatus, TaskType};
use butler_core::error::DomainError;
use butler_core::value_objects::Snowflake;

use crate::models::TaskModel;

/// Convert TaskModel to Task entity; unknown enum text is a data error
impl TryFrom<TaskModel> for Task {
    type Error = DomainError;

    fn try_from(model: TaskModel) -> Result<Self, Self::Error> {
        let task_type: TaskType = model
            .task_type
            .parse()
            .map_err(|e: DomainError| DomainError::DatabaseError(e.to_string()))?;
        let status: TaskStatus = model
            .status
            .parse()
            .map_err(|e: DomainError| DomainError::DatabaseError(e.to_string()))?;

        Ok(Task {
            id: model.id,
            task_type,
            member_ids: model.member_ids.into_iter().map(Snowflake::new).collect(),
            role_ids: model.role_ids.into_iter().map(Snowflake::new).collect(),
            status,
            error: model.error,
            created_at: model.created_at,
            modified_at: model.modified_at,
        })
    }
}

/// Raw ids for array binding
pub fn snowflakes_to_i64(ids: &[Snowflake]) -> Vec<i64> {
    ids.iter().map(|id| id.into_inner()).collect()
}
