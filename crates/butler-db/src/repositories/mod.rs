//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in butler-core.

mod error;
mod roster;
mod settings;
mod task;

pub use roster::PgRosterRepository;
pub use settings::PgSettingsRepository;
pub use task::PgTaskRepository;
