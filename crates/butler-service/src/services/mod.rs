//! Admin services
//!
//! Task queueing, roster reads and settings, shared by the HTTP surface.

pub mod context;
pub mod error;
pub mod roster;
pub mod settings;
pub mod task;

pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use roster::RosterService;
pub use settings::SettingsService;
pub use task::TaskService;
