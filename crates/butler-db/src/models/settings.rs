//! Settings database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for the settings singleton
#[derive(Debug, Clone, FromRow)]
pub struct SettingsModel {
    pub id: i16,
    pub delete_message_days_when_banned: i16,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}
