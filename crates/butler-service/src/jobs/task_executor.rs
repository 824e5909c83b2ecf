//! Task execution: applies queued moderation tasks on the platform

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tracing::{debug, error, info, instrument, warn};

use butler_core::{
    DomainError, PlatformClient, PlatformError, Settings, SettingsRepository, Snowflake, Task, TaskRepository,
    TaskStatus, TaskType,
};

use crate::scheduler::ScheduledJob;

/// Audit log reason attached to every moderation action
pub const AUDIT_REASON: &str = "Discord_Management";

/// Drains `IN_QUEUE` tasks each cycle
pub struct TaskExecutorJob {
    platform: Arc<dyn PlatformClient>,
    task_repo: Arc<dyn TaskRepository>,
    settings_repo: Arc<dyn SettingsRepository>,
}

impl TaskExecutorJob {
    pub fn new(
        platform: Arc<dyn PlatformClient>,
        task_repo: Arc<dyn TaskRepository>,
        settings_repo: Arc<dyn SettingsRepository>,
    ) -> Self {
        Self {
            platform,
            task_repo,
            settings_repo,
        }
    }

    /// Apply a task to each of its members in order, stopping at the first hard error
    ///
    /// Members who already left are skipped. Any other failure, including a
    /// role or channel that no longer exists, fails the whole task.
    async fn execute(&self, task: &Task) -> anyhow::Result<()> {
        let delete_message_days = if task.task_type == TaskType::Ban {
            let settings = self
                .settings_repo
                .get_or_create()
                .await
                .context("loading settings")?;
            ban_delete_days(&settings)
        } else {
            0
        };

        for member_id in &task.member_ids {
            match self.apply(task, *member_id, delete_message_days).await {
                Ok(()) => {}
                Err(e) if e.is_member_gone() => {
                    debug!(task_id = task.id, member_id = %member_id, "Member not found, skipping");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    async fn apply(
        &self,
        task: &Task,
        member_id: Snowflake,
        delete_message_days: u8,
    ) -> Result<(), PlatformError> {
        let member = self.platform.resolve_member(member_id).await?;

        match task.task_type {
            TaskType::Kick => self.platform.kick(member.id, AUDIT_REASON).await,
            TaskType::Ban => {
                self.platform
                    .ban(member.id, delete_message_days, AUDIT_REASON)
                    .await
            }
            TaskType::AssignRole => {
                self.platform
                    .add_roles(member.id, &task.role_ids, AUDIT_REASON)
                    .await
            }
            TaskType::RemoveRole => {
                self.platform
                    .remove_roles(member.id, &task.role_ids, AUDIT_REASON)
                    .await
            }
        }
    }
}

fn ban_delete_days(settings: &Settings) -> u8 {
    let days = settings
        .delete_message_days_when_banned
        .clamp(0, Settings::MAX_DELETE_MESSAGE_DAYS);
    u8::try_from(days).unwrap_or(0)
}

#[async_trait]
impl ScheduledJob for TaskExecutorJob {
    fn name(&self) -> &'static str {
        "task_executor"
    }

    #[instrument(skip(self), fields(job = "task_executor"))]
    async fn run(&self) -> anyhow::Result<()> {
        let queued = self
            .task_repo
            .find_by_status(TaskStatus::InQueue)
            .await
            .context("loading queued tasks")?;

        for task in queued {
            if !self
                .task_repo
                .mark_started(task.id)
                .await
                .with_context(|| format!("claiming task {}", task.id))?
            {
                debug!(task_id = task.id, "Task already claimed");
                continue;
            }

            let recorded = match self.execute(&task).await {
                Ok(()) => {
                    info!(task_id = task.id, task_type = %task.task_type, members = task.member_ids.len(), "Task finished");
                    self.task_repo.mark_finished(task.id).await
                }
                Err(e) => {
                    let error = format!("{e:#}");
                    warn!(task_id = task.id, task_type = %task.task_type, error = %error, "Task failed");
                    self.task_repo.mark_failed(task.id, &error).await
                }
            };
            record_outcome(task.id, recorded);
        }

        Ok(())
    }
}

/// Log a completion write that did not land; the remaining tasks still run
fn record_outcome(task_id: i64, recorded: Result<bool, DomainError>) {
    match recorded {
        Ok(true) => {}
        Ok(false) => {
            warn!(task_id, "Task was no longer STARTED, outcome not recorded");
        }
        Err(e) => {
            error!(task_id, error = %e, "Failed to record task outcome");
        }
    }
}
