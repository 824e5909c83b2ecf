//! Duplicate-message spam detection

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use butler_core::analysis::tokenize;
use butler_core::{
    CachedMessage, CachedMessageKey, MessageCache, PlatformClient, PlatformMessage, Snowflake,
};

use crate::jobs::AUDIT_REASON;
use crate::services::ServiceResult;

/// Direct message sent when a member repeats themselves
pub const WARNING_TEXT: &str = "Please don't spam or you will be muted.";
/// Direct message sent after the mute
pub const MUTED_TEXT: &str = "You were muted for spam, have a nice day.";

/// Tuning for the detector
#[derive(Debug, Clone)]
pub struct SpamPolicy {
    /// How long messages stay in the cache
    pub retention: Duration,
    /// Duplicates tolerated before the mute
    pub retries_until_mute: usize,
    pub mute_role_id: Snowflake,
    /// Roles whose holders are never flagged
    pub exempt_role_ids: Vec<Snowflake>,
}

/// Outcome of handling one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpamVerdict {
    /// DM, exempt author, empty content or outside the retention window
    Ignored,
    /// Stored without action
    Cached,
    /// Stored and the author was warned
    Warned,
    /// Author muted; `purged` messages deleted from channels and cache
    Muted { purged: usize },
}

/// Number of copies once the current message is counted; zero without prior copies
pub fn repeat_count(prior_matches: usize) -> usize {
    if prior_matches == 0 {
        0
    } else {
        prior_matches + 1
    }
}

/// Part of the retention window left for a message created at `created_at`
pub fn remaining_retention(
    retention: Duration,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<Duration> {
    let age = (now - created_at).to_std().unwrap_or(Duration::ZERO);
    retention.checked_sub(age).filter(|left| !left.is_zero())
}

pub struct SpamDetector {
    platform: Arc<dyn PlatformClient>,
    cache: Arc<dyn MessageCache>,
    policy: SpamPolicy,
}

impl SpamDetector {
    pub fn new(
        platform: Arc<dyn PlatformClient>,
        cache: Arc<dyn MessageCache>,
        policy: SpamPolicy,
    ) -> Self {
        Self {
            platform,
            cache,
            policy,
        }
    }

    pub fn policy(&self) -> &SpamPolicy {
        &self.policy
    }

    /// Handle a newly posted message
    #[instrument(skip(self, message), fields(message_id = %message.id, author_id = %message.author_id))]
    pub async fn on_message(&self, message: &PlatformMessage) -> ServiceResult<SpamVerdict> {
        if !message.is_guild_message() {
            return Ok(SpamVerdict::Ignored);
        }
        self.process(message, self.policy.retention).await
    }

    /// Handle an edit; the current content is fetched since update events may be partial
    #[instrument(skip(self))]
    pub async fn on_message_edit(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        guild_id: Option<Snowflake>,
    ) -> ServiceResult<SpamVerdict> {
        if guild_id.is_none() {
            return Ok(SpamVerdict::Ignored);
        }
        let Some(ttl) =
            remaining_retention(self.policy.retention, message_id.created_at(), Utc::now())
        else {
            return Ok(SpamVerdict::Ignored);
        };

        let mut message = match self.platform.fetch_message(channel_id, message_id).await {
            Ok(message) => message,
            Err(e) if e.is_not_found() => {
                debug!("Edited message is gone");
                return Ok(SpamVerdict::Ignored);
            }
            Err(e) => return Err(e.into()),
        };
        message.guild_id = message.guild_id.or(guild_id);

        self.process(&message, ttl).await
    }

    /// Drop a deleted message from the cache. Returns whether it could still be cached.
    #[instrument(skip(self))]
    pub async fn on_message_delete(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        guild_id: Option<Snowflake>,
    ) -> ServiceResult<bool> {
        if guild_id.is_none()
            || remaining_retention(self.policy.retention, message_id.created_at(), Utc::now())
                .is_none()
        {
            return Ok(false);
        }

        self.cache
            .delete(&[CachedMessageKey::new(message_id, channel_id)])
            .await?;
        Ok(true)
    }

    async fn process(&self, message: &PlatformMessage, ttl: Duration) -> ServiceResult<SpamVerdict> {
        if self.is_exempt(message).await? {
            return Ok(SpamVerdict::Ignored);
        }

        let content = tokenize(&message.content);
        if content.is_empty() {
            return Ok(SpamVerdict::Ignored);
        }

        let key = message.cache_key();
        let mut duplicates = self
            .cache
            .find_duplicates(&content, message.author_id)
            .await?;
        // An edited message is already cached under its own key
        duplicates.retain(|duplicate| *duplicate != key);

        let repeats = repeat_count(duplicates.len());
        let entry = CachedMessage {
            content,
            author_id: message.author_id,
        };

        if repeats > self.policy.retries_until_mute {
            duplicates.push(key);
            let purged = self.mute(message.author_id, &duplicates).await?;
            return Ok(SpamVerdict::Muted { purged });
        }

        self.cache.put(key, &entry, ttl).await?;

        if repeats > 1 {
            debug!(repeats, "Warning author about repeated messages");
            self.notify(message.author_id, WARNING_TEXT).await;
            return Ok(SpamVerdict::Warned);
        }

        Ok(SpamVerdict::Cached)
    }

    async fn is_exempt(&self, message: &PlatformMessage) -> ServiceResult<bool> {
        if self.policy.exempt_role_ids.is_empty() {
            return Ok(false);
        }

        let holds_exempt_role =
            |roles: &[Snowflake]| roles.iter().any(|role| self.policy.exempt_role_ids.contains(role));

        if let Some(roles) = &message.author_role_ids {
            return Ok(holds_exempt_role(roles));
        }

        match self.platform.resolve_member(message.author_id).await {
            Ok(member) => Ok(holds_exempt_role(&member.role_ids)),
            Err(e) if e.is_member_gone() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn mute(&self, author_id: Snowflake, messages: &[CachedMessageKey]) -> ServiceResult<usize> {
        self.platform
            .add_roles(author_id, &[self.policy.mute_role_id], AUDIT_REASON)
            .await?;

        for key in messages {
            match self
                .platform
                .delete_message(key.channel_id, key.message_id)
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    warn!(message_id = %key.message_id, channel_id = %key.channel_id, error = %e, "Failed to delete spam message");
                }
            }
        }

        self.cache.delete(messages).await?;
        self.notify(author_id, MUTED_TEXT).await;

        info!(author_id = %author_id, purged = messages.len(), "Muted member for spam");
        Ok(messages.len())
    }

    /// Best-effort direct message; members may refuse DMs
    async fn notify(&self, user_id: Snowflake, text: &str) {
        if let Err(e) = self.platform.send_direct_message(user_id, text).await {
            debug!(user_id = %user_id, error = %e, "Direct message not delivered");
        }
    }
}
