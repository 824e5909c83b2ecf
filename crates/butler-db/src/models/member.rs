//! Mirrored member database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Member row joined with its aggregated role IDs
#[derive(Debug, Clone, FromRow)]
pub struct MirrorMemberModel {
    pub id: i64,
    pub bot: bool,
    pub avatar_url: String,
    pub name: String,
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
    #[sqlx(default)]
    pub role_ids: Vec<i64>,
}
