//! Member entities - live platform members and their mirrored rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// A member as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformMember {
    pub id: Snowflake,
    pub username: String,
    pub discriminator: String,
    /// Account-wide display name, if the user set one
    pub global_name: Option<String>,
    /// Guild-specific nickname
    pub nick: Option<String>,
    pub avatar_url: String,
    pub bot: bool,
    /// Has not passed membership screening yet
    pub pending: bool,
    pub role_ids: Vec<Snowflake>,
    pub joined_at: Option<DateTime<Utc>>,
    pub premium_since: Option<DateTime<Utc>>,
}

impl PlatformMember {
    /// Account creation time, derived from the id
    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.id.created_at()
    }

    /// `name#discriminator`
    pub fn tag(&self) -> String {
        format!("{}#{}", self.username, self.discriminator)
    }

    /// Name shown in the guild: nickname, then global name, then username
    pub fn display_name(&self) -> &str {
        self.nick
            .as_deref()
            .or(self.global_name.as_deref())
            .unwrap_or(&self.username)
    }

    /// Check if member has a specific role
    #[inline]
    pub fn has_role(&self, role_id: Snowflake) -> bool {
        self.role_ids.contains(&role_id)
    }

    /// Check if member holds any of the given roles
    pub fn has_any_role(&self, role_ids: &[Snowflake]) -> bool {
        self.role_ids.iter().any(|id| role_ids.contains(id))
    }
}

/// Mirrored member row
///
/// Replaced wholesale on every roster sync; `engagement_score`, `age_of_account`
/// and `messages_count` are derived at sync time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorMember {
    pub id: Snowflake,
    pub bot: bool,
    pub avatar_url: String,
    pub name: String,
    /// `name#discriminator`
    pub username: String,
    pub discriminator: String,
    pub nick: Option<String>,
    pub engagement_score: i16,
    pub messages_count: i64,
    pub age_of_account: String,
    pub pending: bool,
    pub premium_since: Option<DateTime<Utc>>,
    pub joined_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub role_ids: Vec<Snowflake>,
}

impl MirrorMember {
    /// Check if member has a specific role
    #[inline]
    pub fn has_role(&self, role_id: Snowflake) -> bool {
        self.role_ids.contains(&role_id)
    }
}

/// Filters accepted when listing the mirror
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberFilter {
    /// Case-insensitive match on name, username or nickname
    pub search: Option<String>,
    pub role_id: Option<Snowflake>,
    pub bot: Option<bool>,
    pub min_engagement: Option<i16>,
    pub limit: i64,
    pub offset: i64,
}
