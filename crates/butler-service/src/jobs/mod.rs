//! Periodic jobs driven by the scheduler

mod activity_scan;
mod antifraud;
mod guild_sync;
mod task_executor;

pub use activity_scan::ActivityScanJob;
pub use antifraud::{find_impostors, AntifraudJob, AntifraudPolicy};
pub use guild_sync::{mirror_member, GuildSyncJob};
pub use task_executor::{TaskExecutorJob, AUDIT_REASON};
