//! Roster sync: platform roster into the local mirror

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use tracing::{info, instrument};

use butler_core::analysis::{engagement_score, humanize_age};
use butler_core::{
    MirrorMember, MirrorRole, PlatformClient, PlatformMember, RosterRepository, Snowflake,
};

use crate::scheduler::ScheduledJob;
use crate::state::{ActivitySnapshot, ActivityCounter, RosterCache, RosterSnapshot};

/// Fetches roles and members, publishes the in-memory snapshot, then
/// replaces the mirror in one transaction
pub struct GuildSyncJob {
    platform: Arc<dyn PlatformClient>,
    roster_repo: Arc<dyn RosterRepository>,
    roster: Arc<RosterCache>,
    activity: Arc<ActivityCounter>,
}

impl GuildSyncJob {
    pub fn new(
        platform: Arc<dyn PlatformClient>,
        roster_repo: Arc<dyn RosterRepository>,
        roster: Arc<RosterCache>,
        activity: Arc<ActivityCounter>,
    ) -> Self {
        Self {
            platform,
            roster_repo,
            roster,
            activity,
        }
    }
}

/// Mirror row for a member, scored with the given activity counts
pub fn mirror_member(
    member: &PlatformMember,
    guild_id: Snowflake,
    activity: &ActivitySnapshot,
    now: DateTime<Utc>,
) -> MirrorMember {
    let messages_count = activity.count(member.id);
    MirrorMember {
        id: member.id,
        bot: member.bot,
        avatar_url: member.avatar_url.clone(),
        name: member.username.clone(),
        username: member.tag(),
        discriminator: member.discriminator.clone(),
        nick: member.nick.clone(),
        engagement_score: engagement_score(messages_count),
        messages_count: i64::try_from(messages_count).unwrap_or(i64::MAX),
        age_of_account: humanize_age(now, member.created_at()),
        pending: member.pending,
        premium_since: member.premium_since,
        joined_at: member.joined_at,
        created_at: member.created_at(),
        role_ids: member
            .role_ids
            .iter()
            .copied()
            .filter(|id| *id != guild_id)
            .collect(),
    }
}

#[async_trait]
impl ScheduledJob for GuildSyncJob {
    fn name(&self) -> &'static str {
        "guild_sync"
    }

    #[instrument(skip(self), fields(job = "guild_sync"))]
    async fn run(&self) -> anyhow::Result<()> {
        let guild_id = self.platform.guild_id();

        let roles = self
            .platform
            .fetch_roles()
            .await
            .context("fetching roles")?;
        let members: Vec<PlatformMember> = self
            .platform
            .members()
            .try_collect()
            .await
            .context("fetching members")?;

        let snapshot = RosterSnapshot::new(roles, members);
        let now = snapshot.fetched_at.unwrap_or_else(Utc::now);
        let activity = self.activity.snapshot();

        let mirror_roles: Vec<MirrorRole> = snapshot
            .roles
            .iter()
            .filter(|role| !role.is_everyone(guild_id))
            .map(MirrorRole::from)
            .collect();
        let mirror_members: Vec<MirrorMember> = snapshot
            .members
            .iter()
            .map(|member| mirror_member(member, guild_id, &activity, now))
            .collect();

        // Antifraud reads the fresh roster even if the mirror write fails
        self.roster.replace(snapshot);

        self.roster_repo
            .replace_all(&mirror_roles, &mirror_members)
            .await
            .context("replacing roster mirror")?;

        info!(
            roles = mirror_roles.len(),
            members = mirror_members.len(),
            activity_authors = activity.authors(),
            "Roster mirror replaced"
        );
        Ok(())
    }
}
