//! Ports implemented by the infrastructure crates

mod cache;
mod platform;
mod repositories;

pub use cache::MessageCache;
pub use platform::PlatformClient;
pub use repositories::{RepoResult, RosterRepository, SettingsRepository, TaskRepository};
