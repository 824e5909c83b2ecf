//! # butler-service
//!
//! Application layer: the periodic moderation jobs and their scheduler,
//! the spam detector, and the admin services with their DTOs.

pub mod antispam;
pub mod dto;
pub mod jobs;
pub mod scheduler;
pub mod services;
pub mod state;

pub use antispam::{SpamDetector, SpamPolicy, SpamVerdict};
pub use jobs::{ActivityScanJob, AntifraudJob, AntifraudPolicy, GuildSyncJob, TaskExecutorJob};
pub use scheduler::{Invocation, JobStats, ScheduledJob, Scheduler, SingleFlight};
pub use services::{
    RosterService, ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult,
    SettingsService, TaskService,
};
pub use state::{ActivityCounter, ActivitySnapshot, RosterCache, RosterSnapshot};
