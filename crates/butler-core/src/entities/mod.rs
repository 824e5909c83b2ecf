//! Domain entities - core business objects

mod channel;
mod member;
mod message;
mod role;
mod settings;
mod task;

pub use channel::{ChannelKind, PlatformChannel};
pub use member::{MemberFilter, MirrorMember, PlatformMember};
pub use message::{CachedMessage, CachedMessageKey, PlatformMessage};
pub use role::{MirrorRole, PlatformRole};
pub use settings::Settings;
pub use task::{NewTask, Task, TaskStatus, TaskType};
