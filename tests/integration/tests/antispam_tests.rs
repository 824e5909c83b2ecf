//! Spam detector integration tests over the in-memory cache and platform

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use integration_tests::*;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use butler_bot::events::{dispatch, pump_events};
use butler_core::{MessageCache, PlatformMessage, Snowflake};
use butler_platform::{GatewayEvent, MessageRef};
use butler_service::antispam::{MUTED_TEXT, WARNING_TEXT};
use butler_service::{SpamDetector, SpamPolicy, SpamVerdict};

const RETENTION: Duration = Duration::from_secs(3600);
const MUTE_ROLE: i64 = 666;
const STAFF_ROLE: i64 = 700;
const CHANNEL: i64 = 10;
const AUTHOR: i64 = 42;

struct Harness {
    platform: Arc<FakePlatform>,
    cache: Arc<InMemoryMessageCache>,
    detector: Arc<SpamDetector>,
}

impl Harness {
    fn new() -> Self {
        let platform = Arc::new(FakePlatform::new(GUILD_ID));
        let cache = Arc::new(InMemoryMessageCache::new());
        let policy = SpamPolicy {
            retention: RETENTION,
            retries_until_mute: 2,
            mute_role_id: Snowflake::new(MUTE_ROLE),
            exempt_role_ids: vec![Snowflake::new(STAFF_ROLE)],
        };
        let detector = Arc::new(SpamDetector::new(platform.clone(), cache.clone(), policy));

        Self {
            platform,
            cache,
            detector,
        }
    }

    /// Post a message on the platform and hand it to the detector
    async fn say(&self, content: &str) -> SpamVerdict {
        let message = guild_message(CHANNEL, AUTHOR, content);
        self.platform.post_message(message.clone());
        self.detector.on_message(&message).await.unwrap()
    }
}

#[tokio::test]
async fn test_repeated_message_warns_then_mutes() {
    let h = Harness::new();

    assert_eq!(h.say("Buy cheap followers NOW").await, SpamVerdict::Cached);
    assert_eq!(h.say("buy cheap followers now!!!").await, SpamVerdict::Warned);
    assert_eq!(h.cache.len(), 2);
    assert_eq!(h.platform.direct_messages(Snowflake::new(AUTHOR)), vec![WARNING_TEXT]);

    assert_eq!(
        h.say("BUY... cheap, followers now").await,
        SpamVerdict::Muted { purged: 3 }
    );

    let author = Snowflake::new(AUTHOR);
    assert!(h.platform.actions().contains(&PlatformAction::AddRoles {
        member_id: author,
        role_ids: vec![Snowflake::new(MUTE_ROLE)],
    }));
    let deleted = h
        .platform
        .actions()
        .iter()
        .filter(|a| matches!(a, PlatformAction::DeleteMessage { .. }))
        .count();
    assert_eq!(deleted, 3);
    assert!(h.cache.is_empty());
    assert_eq!(
        h.platform.direct_messages(author),
        vec![WARNING_TEXT, MUTED_TEXT]
    );
}

#[tokio::test]
async fn test_distinct_messages_and_authors_are_not_duplicates() {
    let h = Harness::new();

    assert_eq!(h.say("good morning").await, SpamVerdict::Cached);
    assert_eq!(h.say("good evening").await, SpamVerdict::Cached);

    let other = guild_message(CHANNEL, AUTHOR + 1, "good morning");
    assert_eq!(h.detector.on_message(&other).await.unwrap(), SpamVerdict::Cached);

    assert_eq!(h.cache.len(), 3);
    assert!(h.platform.actions().is_empty());
}

#[tokio::test]
async fn test_new_messages_cached_for_full_retention() {
    let h = Harness::new();
    let message = guild_message(CHANNEL, AUTHOR, "hello there");
    h.detector.on_message(&message).await.unwrap();

    assert_eq!(h.cache.ttl(message.cache_key()), Some(RETENTION));
}

#[tokio::test]
async fn test_exempt_role_from_event() {
    let h = Harness::new();
    let mut message = guild_message(CHANNEL, AUTHOR, "announcement");
    message.author_role_ids = Some(vec![Snowflake::new(STAFF_ROLE)]);

    for _ in 0..5 {
        let verdict = h.detector.on_message(&message).await.unwrap();
        assert_eq!(verdict, SpamVerdict::Ignored);
    }
    assert!(h.cache.is_empty());
}

#[tokio::test]
async fn test_exempt_role_resolved_from_platform() {
    let h = Harness::new();
    let mut staff = member(AUTHOR, "staff");
    staff.role_ids.push(Snowflake::new(STAFF_ROLE));
    h.platform.add_member(staff);

    assert_eq!(h.say("announcement").await, SpamVerdict::Ignored);

    // Unknown authors are not exempt
    let stranger = guild_message(CHANNEL, AUTHOR + 1, "announcement");
    assert_eq!(h.detector.on_message(&stranger).await.unwrap(), SpamVerdict::Cached);
}

#[tokio::test]
async fn test_direct_and_empty_messages_ignored() {
    let h = Harness::new();

    let mut direct = guild_message(CHANNEL, AUTHOR, "hello");
    direct.guild_id = None;
    assert_eq!(h.detector.on_message(&direct).await.unwrap(), SpamVerdict::Ignored);

    assert_eq!(h.say("!!! ??? ...").await, SpamVerdict::Ignored);
    assert!(h.cache.is_empty());
}

#[tokio::test]
async fn test_edit_recaches_without_matching_itself() {
    let h = Harness::new();
    let mut message = guild_message(CHANNEL, AUTHOR, "first draft");
    h.platform.post_message(message.clone());
    h.detector.on_message(&message).await.unwrap();

    message.content = "final text".to_string();
    h.platform.post_message(message.clone());
    let verdict = h
        .detector
        .on_message_edit(message.channel_id, message.id, message.guild_id)
        .await
        .unwrap();
    assert_eq!(verdict, SpamVerdict::Cached);

    // Editing without changing the text is not a repeat either
    let verdict = h
        .detector
        .on_message_edit(message.channel_id, message.id, message.guild_id)
        .await
        .unwrap();
    assert_eq!(verdict, SpamVerdict::Cached);

    let ttl = h.cache.ttl(message.cache_key()).unwrap();
    assert!(ttl <= RETENTION);
    let duplicates = h
        .cache
        .find_duplicates("final text", message.author_id)
        .await
        .unwrap();
    assert_eq!(duplicates, vec![message.cache_key()]);
}

#[tokio::test]
async fn test_edits_outside_window_or_of_missing_messages_ignored() {
    let h = Harness::new();

    let old = PlatformMessage {
        id: aged_id(ChronoDuration::hours(2)),
        ..guild_message(CHANNEL, AUTHOR, "old news")
    };
    h.platform.post_message(old.clone());
    let verdict = h
        .detector
        .on_message_edit(old.channel_id, old.id, old.guild_id)
        .await
        .unwrap();
    assert_eq!(verdict, SpamVerdict::Ignored);

    let gone = recent_id();
    let verdict = h
        .detector
        .on_message_edit(Snowflake::new(CHANNEL), gone, Some(GUILD_ID))
        .await
        .unwrap();
    assert_eq!(verdict, SpamVerdict::Ignored);
    assert!(h.cache.is_empty());
}

#[tokio::test]
async fn test_delete_removes_cache_entry() {
    let h = Harness::new();
    let message = guild_message(CHANNEL, AUTHOR, "oops");
    h.detector.on_message(&message).await.unwrap();
    assert!(h.cache.contains(message.cache_key()));

    let removed = h
        .detector
        .on_message_delete(message.channel_id, message.id, message.guild_id)
        .await
        .unwrap();
    assert!(removed);
    assert!(h.cache.is_empty());

    let old = aged_id(ChronoDuration::hours(3));
    let removed = h
        .detector
        .on_message_delete(Snowflake::new(CHANNEL), old, Some(GUILD_ID))
        .await
        .unwrap();
    assert!(!removed);
}

// ============================================================================
// Gateway event routing
// ============================================================================

#[tokio::test]
async fn test_dispatch_routes_events() {
    let h = Harness::new();
    let message = guild_message(CHANNEL, AUTHOR, "routed");

    let verdict = dispatch(&h.detector, GatewayEvent::MessageCreate(message.clone()))
        .await
        .unwrap();
    assert_eq!(verdict, Some(SpamVerdict::Cached));

    let delete = GatewayEvent::MessageDelete(MessageRef {
        id: message.id,
        channel_id: message.channel_id,
        guild_id: message.guild_id,
    });
    assert_eq!(dispatch(&h.detector, delete).await.unwrap(), None);
    assert!(h.cache.is_empty());

    let resumed = dispatch(&h.detector, GatewayEvent::Resumed).await.unwrap();
    assert_eq!(resumed, None);
}

#[tokio::test]
async fn test_pump_feeds_detector_until_sender_closes() {
    let h = Harness::new();
    let (tx, rx) = mpsc::channel(16);

    for _ in 0..3 {
        let message = guild_message(CHANNEL, AUTHOR, "join my server");
        h.platform.post_message(message.clone());
        tx.send(GatewayEvent::MessageCreate(message)).await.unwrap();
    }
    drop(tx);

    pump_events(rx, Some(h.detector.clone()), CancellationToken::new()).await;

    assert_eq!(
        h.platform.direct_messages(Snowflake::new(AUTHOR)),
        vec![WARNING_TEXT, MUTED_TEXT]
    );
    assert!(h.cache.is_empty());
}

#[tokio::test]
async fn test_pump_without_detector_drops_events() {
    let (tx, rx) = mpsc::channel(4);
    tx.send(GatewayEvent::MessageCreate(guild_message(CHANNEL, AUTHOR, "hi")))
        .await
        .unwrap();
    drop(tx);

    // Returns once the channel is drained
    pump_events(rx, None, CancellationToken::new()).await;
}
