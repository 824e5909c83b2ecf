//! Mirrored role database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for mirror_roles table
#[derive(Debug, Clone, FromRow)]
pub struct MirrorRoleModel {
    pub id: i64,
    pub name: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}
