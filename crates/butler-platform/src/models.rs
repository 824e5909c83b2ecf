//! Wire models shared by the REST adapter and gateway dispatches
//!
//! Only the fields the worker reads are declared; everything else in the
//! platform's JSON is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use butler_core::{
    ChannelKind, PlatformChannel, PlatformMember, PlatformMessage, PlatformRole, Snowflake,
};

/// Base URL of the platform's media CDN
pub const CDN_BASE_URL: &str = "https://cdn.discordapp.com";

fn default_discriminator() -> String {
    "0".to_string()
}

/// User object
#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    pub id: Snowflake,
    pub username: String,
    /// "0" for accounts migrated to unique usernames
    #[serde(default = "default_discriminator")]
    pub discriminator: String,
    #[serde(default)]
    pub global_name: Option<String>,
    /// Avatar hash
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl UserPayload {
    /// Custom avatar when set, otherwise the default avatar for the account
    pub fn avatar_url(&self) -> String {
        match &self.avatar {
            Some(hash) => {
                let ext = if hash.starts_with("a_") { "gif" } else { "png" };
                format!("{CDN_BASE_URL}/avatars/{}/{hash}.{ext}", self.id)
            }
            None => {
                let index = match self.discriminator.parse::<u16>() {
                    Ok(0) | Err(_) => (self.id.into_inner() >> 22) % 6,
                    Ok(discriminator) => i64::from(discriminator % 5),
                };
                format!("{CDN_BASE_URL}/embed/avatars/{index}.png")
            }
        }
    }
}

/// Guild member object
#[derive(Debug, Clone, Deserialize)]
pub struct MemberPayload {
    pub user: UserPayload,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<Snowflake>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub premium_since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pending: bool,
}

impl From<MemberPayload> for PlatformMember {
    fn from(payload: MemberPayload) -> Self {
        let avatar_url = payload.user.avatar_url();
        Self {
            id: payload.user.id,
            username: payload.user.username,
            discriminator: payload.user.discriminator,
            global_name: payload.user.global_name,
            nick: payload.nick,
            avatar_url,
            bot: payload.user.bot,
            pending: payload.pending,
            role_ids: payload.roles,
            joined_at: payload.joined_at,
            premium_since: payload.premium_since,
        }
    }
}

/// Role object
#[derive(Debug, Clone, Deserialize)]
pub struct RolePayload {
    pub id: Snowflake,
    pub name: String,
    #[serde(default)]
    pub position: i32,
}

impl From<RolePayload> for PlatformRole {
    fn from(payload: RolePayload) -> Self {
        Self {
            id: payload.id,
            name: payload.name,
            position: payload.position,
        }
    }
}

/// Channel object
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelPayload {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<ChannelPayload> for PlatformChannel {
    fn from(payload: ChannelPayload) -> Self {
        Self {
            id: payload.id,
            name: payload.name,
            kind: ChannelKind::from_u8(payload.kind),
        }
    }
}

/// Member fields attached to guild message events
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialMemberPayload {
    #[serde(default)]
    pub roles: Vec<Snowflake>,
}

/// Message object
#[derive(Debug, Clone, Deserialize)]
pub struct MessagePayload {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    /// Only present on gateway events in guild channels
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    pub author: UserPayload,
    /// Empty without the message-content intent
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub member: Option<PartialMemberPayload>,
}

impl MessagePayload {
    /// Convert, filling in the guild for REST responses that omit it
    pub fn into_message(self, guild_id: Option<Snowflake>) -> PlatformMessage {
        PlatformMessage {
            id: self.id,
            channel_id: self.channel_id,
            guild_id: self.guild_id.or(guild_id),
            author_id: self.author.id,
            author_role_ids: self.member.map(|member| member.roles),
            content: self.content,
        }
    }
}

/// Identifies a message in update/delete dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MessageRef {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
}

/// Error body returned with non-success responses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorPayload {
    #[serde(default)]
    pub code: Option<u64>,
    #[serde(default)]
    pub message: String,
    /// Seconds, on 429 responses
    #[serde(default)]
    pub retry_after: Option<f64>,
}

/// Body of `PUT /guilds/{guild}/bans/{user}`
#[derive(Debug, Clone, Serialize)]
pub struct CreateBanBody {
    pub delete_message_seconds: u32,
}

impl CreateBanBody {
    pub fn from_days(days: u8) -> Self {
        Self {
            delete_message_seconds: u32::from(days) * 86_400,
        }
    }
}

/// Body of `POST /users/@me/channels`
#[derive(Debug, Clone, Serialize)]
pub struct CreateDmBody {
    pub recipient_id: Snowflake,
}

/// Body of `POST /channels/{channel}/messages`
#[derive(Debug, Clone, Serialize)]
pub struct CreateMessageBody<'a> {
    pub content: &'a str,
}
