//! Entity to DTO mappers
//!
//! Implements `From` conversions from domain entities to response DTOs.

use butler_core::{MirrorMember, MirrorRole, Settings, Snowflake, Task};

use super::responses::{MemberResponse, RoleResponse, SettingsResponse, TaskResponse};

fn ids(ids: &[Snowflake]) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            task_type: task.task_type,
            member_ids: ids(&task.member_ids),
            role_ids: ids(&task.role_ids),
            status: task.status,
            error: task.error.clone(),
            created_at: task.created_at,
            modified_at: task.modified_at,
        }
    }
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self::from(&task)
    }
}

impl From<&MirrorMember> for MemberResponse {
    fn from(member: &MirrorMember) -> Self {
        Self {
            id: member.id.to_string(),
            name: member.name.clone(),
            username: member.username.clone(),
            discriminator: member.discriminator.clone(),
            nick: member.nick.clone(),
            avatar_url: member.avatar_url.clone(),
            bot: member.bot,
            pending: member.pending,
            engagement_score: member.engagement_score,
            messages_count: member.messages_count,
            age_of_account: member.age_of_account.clone(),
            role_ids: ids(&member.role_ids),
            premium_since: member.premium_since,
            joined_at: member.joined_at,
            created_at: member.created_at,
        }
    }
}

impl From<&MirrorRole> for RoleResponse {
    fn from(role: &MirrorRole) -> Self {
        Self {
            id: role.id.to_string(),
            name: role.name.clone(),
            position: role.position,
            created_at: role.created_at,
        }
    }
}

impl From<&Settings> for SettingsResponse {
    fn from(settings: &Settings) -> Self {
        Self {
            delete_message_days_when_banned: settings.delete_message_days_when_banned,
            created_at: settings.created_at,
            modified_at: settings.modified_at,
        }
    }
}
