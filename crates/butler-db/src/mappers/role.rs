//! Mirrored role entity <-> model mapper

use chrono::{DateTime, Utc};

use butler_core::entities::MirrorRole;
use butler_core::value_objects::Snowflake;

use crate::models::MirrorRoleModel;

impl From<MirrorRoleModel> for MirrorRole {
    fn from(model: MirrorRoleModel) -> Self {
        MirrorRole {
            id: Snowflake::new(model.id),
            name: model.name,
            position: model.position,
            created_at: model.created_at,
        }
    }
}

/// Column-oriented role rows for an `UNNEST` bulk insert
#[derive(Debug, Default)]
pub struct RoleColumns {
    pub ids: Vec<i64>,
    pub names: Vec<String>,
    pub positions: Vec<i32>,
    pub created_at: Vec<DateTime<Utc>>,
}

impl RoleColumns {
    pub fn new(roles: &[MirrorRole]) -> Self {
        let mut columns = Self::default();
        for role in roles {
            columns.ids.push(role.id.into_inner());
            columns.names.push(role.name.clone());
            columns.positions.push(role.position);
            columns.created_at.push(role.created_at);
        }
        columns
    }
}
