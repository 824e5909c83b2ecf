//! Test fixtures and data generators
//!
//! Builders for platform roles, members and messages.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{Duration, Utc};

use butler_core::{ChannelKind, PlatformChannel, PlatformMember, PlatformMessage, PlatformRole, Snowflake};

/// Counter for unique ids
static COUNTER: AtomicI64 = AtomicI64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> i64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Guild used by every fixture
pub const GUILD_ID: Snowflake = Snowflake::new(81_384_788_765_712_384);

/// A snowflake minted now, unique within the test binary
pub fn recent_id() -> Snowflake {
    Snowflake::new(Snowflake::from_datetime(Utc::now()).into_inner() + unique_suffix())
}

/// A snowflake minted `age` ago
pub fn aged_id(age: Duration) -> Snowflake {
    Snowflake::new(Snowflake::from_datetime(Utc::now() - age).into_inner() + unique_suffix())
}

pub fn everyone_role() -> PlatformRole {
    PlatformRole {
        id: GUILD_ID,
        name: "@everyone".to_string(),
        position: 0,
    }
}

pub fn role(id: i64, name: &str, position: i32) -> PlatformRole {
    PlatformRole {
        id: Snowflake::new(id),
        name: name.to_string(),
        position,
    }
}

/// A plain member holding only @everyone
pub fn member(id: i64, username: &str) -> PlatformMember {
    PlatformMember {
        id: Snowflake::new(id),
        username: username.to_string(),
        discriminator: "0001".to_string(),
        global_name: None,
        nick: None,
        avatar_url: format!("https://cdn.example/avatars/{id}.png"),
        bot: false,
        pending: false,
        role_ids: vec![GUILD_ID],
        joined_at: Some(Utc::now() - Duration::days(30)),
        premium_since: None,
    }
}

pub fn text_channel(id: i64, name: &str) -> PlatformChannel {
    PlatformChannel {
        id: Snowflake::new(id),
        name: Some(name.to_string()),
        kind: ChannelKind::GuildText,
    }
}

/// A guild message posted just now; the event carries no author roles
pub fn guild_message(channel_id: i64, author_id: i64, content: &str) -> PlatformMessage {
    PlatformMessage {
        id: recent_id(),
        channel_id: Snowflake::new(channel_id),
        guild_id: Some(GUILD_ID),
        author_id: Snowflake::new(author_id),
        author_role_ids: None,
        content: content.to_string(),
    }
}

/// A historical message for channel scans
pub fn history_message(channel_id: i64, author_id: i64) -> PlatformMessage {
    PlatformMessage {
        id: Snowflake::new(unique_suffix()),
        channel_id: Snowflake::new(channel_id),
        guild_id: Some(GUILD_ID),
        author_id: Snowflake::new(author_id),
        author_role_ids: None,
        content: "hello".to_string(),
    }
}
