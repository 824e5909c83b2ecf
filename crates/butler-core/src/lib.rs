//! # butler-core
//!
//! Domain layer containing entities, value objects, error types, the
//! repository / platform / cache ports, and pure scoring utilities.
//! This crate has zero dependencies on infrastructure (database, HTTP, etc.).

pub mod analysis;
pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    CachedMessage, CachedMessageKey, ChannelKind, MemberFilter, MirrorMember, MirrorRole, NewTask,
    PlatformChannel, PlatformMember, PlatformMessage, PlatformRole, Settings, Task, TaskStatus,
    TaskType,
};
pub use error::{DomainError, PlatformError, PlatformResult};
pub use traits::{
    MessageCache, PlatformClient, RepoResult, RosterRepository, SettingsRepository,
    TaskRepository,
};
pub use value_objects::{Snowflake, SnowflakeParseError};
