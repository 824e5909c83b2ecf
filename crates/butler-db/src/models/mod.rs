//! Database models - SQLx-compatible structs for PostgreSQL tables

mod member;
mod role;
mod settings;
mod task;

pub use member::MirrorMemberModel;
pub use role::MirrorRoleModel;
pub use settings::SettingsModel;
pub use task::TaskModel;
