//! Antifraud: queues bans for members impersonating a protected identity

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use butler_core::analysis::contains_ignore_case;
use butler_core::{NewTask, PlatformMember, Snowflake, TaskRepository, TaskType};

use crate::scheduler::ScheduledJob;
use crate::state::{RosterCache, RosterSnapshot};

/// Protected term and the ids allowed to carry it
#[derive(Debug, Clone, Default)]
pub struct AntifraudPolicy {
    pub protected_term: String,
    pub allowed_member_ids: Vec<Snowflake>,
}

impl AntifraudPolicy {
    pub fn is_enabled(&self) -> bool {
        !self.protected_term.trim().is_empty()
    }

    /// Whether any of the member's names contain the term and the member is not allowed
    pub fn is_impostor(&self, member: &PlatformMember) -> bool {
        if self.allowed_member_ids.contains(&member.id) {
            return false;
        }

        let term = self.protected_term.trim();
        std::iter::once(member.username.as_str())
            .chain(member.global_name.as_deref())
            .chain(member.nick.as_deref())
            .any(|name| contains_ignore_case(name, term))
    }
}

pub struct AntifraudJob {
    roster: Arc<RosterCache>,
    task_repo: Arc<dyn TaskRepository>,
    policy: AntifraudPolicy,
}

impl AntifraudJob {
    pub fn new(
        roster: Arc<RosterCache>,
        task_repo: Arc<dyn TaskRepository>,
        policy: AntifraudPolicy,
    ) -> Self {
        Self {
            roster,
            task_repo,
            policy,
        }
    }
}

/// Sorted, deduplicated ids of impostors in a roster snapshot
pub fn find_impostors(snapshot: &RosterSnapshot, policy: &AntifraudPolicy) -> Vec<Snowflake> {
    snapshot
        .members
        .iter()
        .filter(|member| policy.is_impostor(member))
        .map(|member| member.id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[async_trait]
impl ScheduledJob for AntifraudJob {
    fn name(&self) -> &'static str {
        "antifraud"
    }

    #[instrument(skip(self), fields(job = "antifraud"))]
    async fn run(&self) -> anyhow::Result<()> {
        if !self.policy.is_enabled() {
            return Ok(());
        }

        let impostors = find_impostors(&self.roster.snapshot(), &self.policy);
        if impostors.is_empty() {
            return Ok(());
        }

        if self
            .task_repo
            .exists_matching(TaskType::Ban, &impostors)
            .await
            .context("checking for an existing ban task")?
        {
            debug!(members = impostors.len(), "Ban task already queued for impostors");
            return Ok(());
        }

        let task = self
            .task_repo
            .create(&NewTask::ban(impostors)?)
            .await
            .context("queueing ban task")?;
        info!(task_id = task.id, members = task.member_ids.len(), "Queued ban for impostors");

        Ok(())
    }
}
