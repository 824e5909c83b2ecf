//! Role entities - live platform roles and their mirrored rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// A role as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRole {
    pub id: Snowflake,
    pub name: String,
    pub position: i32,
}

impl PlatformRole {
    /// Role creation time, derived from the id
    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.id.created_at()
    }

    /// The implicit @everyone role shares its id with the guild
    #[inline]
    pub fn is_everyone(&self, guild_id: Snowflake) -> bool {
        self.id == guild_id
    }
}

/// Mirrored role row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRole {
    pub id: Snowflake,
    pub name: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&PlatformRole> for MirrorRole {
    fn from(role: &PlatformRole) -> Self {
        Self {
            id: role.id,
            name: role.name.clone(),
            position: role.position,
            created_at: role.created_at(),
        }
    }
}
