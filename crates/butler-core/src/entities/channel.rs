//! Channel entity - the subset of platform channels the worker cares about

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Platform channel kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    GuildText,
    Dm,
    GuildVoice,
    GroupDm,
    GuildCategory,
    GuildAnnouncement,
    Thread,
    GuildStageVoice,
    GuildForum,
    Other(u8),
}

impl ChannelKind {
    /// Map the platform's numeric channel type
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::GuildText,
            1 => Self::Dm,
            2 => Self::GuildVoice,
            3 => Self::GroupDm,
            4 => Self::GuildCategory,
            5 => Self::GuildAnnouncement,
            10..=12 => Self::Thread,
            13 => Self::GuildStageVoice,
            15 => Self::GuildForum,
            other => Self::Other(other),
        }
    }

    /// Channels with a readable message history
    #[inline]
    pub const fn has_history(self) -> bool {
        matches!(
            self,
            Self::GuildText | Self::GuildAnnouncement | Self::GuildVoice | Self::Thread
        )
    }
}

/// A guild channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformChannel {
    pub id: Snowflake,
    pub name: Option<String>,
    pub kind: ChannelKind,
}
