//! Payload structures for gateway control frames

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use butler_core::Snowflake;

bitflags! {
    /// Gateway intents: which event groups the session subscribes to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Intents: u64 {
        const GUILDS = 1 << 0;
        /// Privileged
        const GUILD_MEMBERS = 1 << 1;
        const GUILD_MESSAGES = 1 << 9;
        const DIRECT_MESSAGES = 1 << 12;
        /// Privileged
        const MESSAGE_CONTENT = 1 << 15;
    }
}

impl Intents {
    /// What the moderation worker needs: members for the roster,
    /// message events with content for spam detection
    pub const fn moderation() -> Self {
        Self::GUILDS
            .union(Self::GUILD_MEMBERS)
            .union(Self::GUILD_MESSAGES)
            .union(Self::MESSAGE_CONTENT)
    }
}

impl Serialize for Intents {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.bits())
    }
}

/// Payload of op 10 (Hello)
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

/// Connection properties sent with Identify
#[derive(Debug, Clone, Serialize)]
pub struct IdentifyProperties {
    pub os: String,
    pub browser: String,
    pub device: String,
}

impl Default for IdentifyProperties {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            browser: env!("CARGO_PKG_NAME").to_string(),
            device: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

/// Payload of op 2 (Identify)
#[derive(Debug, Clone, Serialize)]
pub struct IdentifyPayload {
    pub token: String,
    pub intents: Intents,
    pub properties: IdentifyProperties,
}

impl IdentifyPayload {
    #[must_use]
    pub fn new(token: impl Into<String>, intents: Intents) -> Self {
        Self {
            token: token.into(),
            intents,
            properties: IdentifyProperties::default(),
        }
    }
}

/// Payload of op 6 (Resume)
#[derive(Debug, Clone, Serialize)]
pub struct ResumePayload {
    pub token: String,
    pub session_id: String,
    /// Last sequence number received
    pub seq: u64,
}

/// The parts of the READY dispatch the client keeps
#[derive(Debug, Clone, Deserialize)]
pub struct ReadyPayload {
    pub session_id: String,
    pub resume_gateway_url: Option<String>,
    pub user: ReadyUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadyUser {
    pub id: Snowflake,
    pub username: String,
}
