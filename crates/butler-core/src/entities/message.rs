//! Message entities - platform messages and their spam-cache fingerprints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value_objects::Snowflake;

/// A message as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformMessage {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    /// `None` for direct messages
    pub guild_id: Option<Snowflake>,
    pub author_id: Snowflake,
    /// Author's guild roles when the event carried them
    pub author_role_ids: Option<Vec<Snowflake>>,
    pub content: String,
}

impl PlatformMessage {
    /// Message creation time, derived from the id
    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.id.created_at()
    }

    /// Whether the message was posted in a guild channel
    #[inline]
    pub fn is_guild_message(&self) -> bool {
        self.guild_id.is_some()
    }

    /// Cache key addressing this message
    #[inline]
    pub fn cache_key(&self) -> CachedMessageKey {
        CachedMessageKey::new(self.id, self.channel_id)
    }
}

/// Key of a spam-cache entry: (message id, channel id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CachedMessageKey {
    pub message_id: Snowflake,
    pub channel_id: Snowflake,
}

impl CachedMessageKey {
    /// Create a key
    pub const fn new(message_id: Snowflake, channel_id: Snowflake) -> Self {
        Self {
            message_id,
            channel_id,
        }
    }

    /// Parse the `<message_id>-<channel_id>` form
    pub fn parse(raw: &str) -> Option<Self> {
        let (message_id, channel_id) = raw.split_once('-')?;
        Some(Self::new(
            Snowflake::parse(message_id).ok()?,
            Snowflake::parse(channel_id).ok()?,
        ))
    }
}

impl fmt::Display for CachedMessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.message_id, self.channel_id)
    }
}

/// Body of a spam-cache entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedMessage {
    /// Tokenized content
    pub content: String,
    pub author_id: Snowflake,
}
