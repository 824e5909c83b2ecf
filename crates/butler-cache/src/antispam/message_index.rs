//! RediSearch-backed recent-message cache for spam detection.
//!
//! Each cached message is a hash `antispam:message:<message_id>-<channel_id>`
//! with the tokenized `content` and the `author_id`. A full-text index over
//! that prefix answers "has this author posted the same text recently".

use std::time::Duration;

use async_trait::async_trait;
use redis::Value;
use tracing::{debug, info, instrument};

use butler_core::entities::{CachedMessage, CachedMessageKey};
use butler_core::traits::{MessageCache, RepoResult};
use butler_core::value_objects::Snowflake;

use crate::pool::{RedisPool, RedisPoolError, RedisResult};

/// Index name
pub const INDEX_NAME: &str = "idx:antispam";
/// Key prefix covered by the index
pub const KEY_PREFIX: &str = "antispam:message:";

/// Upper bound on duplicates fetched per query
const SEARCH_LIMIT: usize = 1000;

/// Error text RediSearch returns when `FT.CREATE` targets an existing index
const INDEX_EXISTS: &str = "Index already exists";

/// Redis key of a cached message
pub fn cache_key(key: CachedMessageKey) -> String {
    format!("{KEY_PREFIX}{key}")
}

/// Recover the message key from a Redis key
pub fn parse_cache_key(raw: &str) -> Option<CachedMessageKey> {
    raw.strip_prefix(KEY_PREFIX).and_then(CachedMessageKey::parse)
}

/// Query matching the author's cached messages that contain `content` as a phrase
///
/// `content` is expected to be tokenized already, so it holds only
/// alphanumerics and single spaces and needs no escaping.
pub fn duplicate_query(content: &str, author_id: Snowflake) -> String {
    format!("@author_id:{{{author_id}}} @content:\"{content}\"")
}

/// Pull `(key, content)` pairs out of an `FT.SEARCH ... RETURN 1 content` reply
///
/// RESP2 shape: `[total, key1, [field, value, ...], key2, [...], ...]`.
pub fn parse_search_reply(reply: &Value) -> RedisResult<Vec<(String, Option<String>)>> {
    let Value::Array(items) = reply else {
        return Err(RedisPoolError::UnexpectedReply(format!("{reply:?}")));
    };

    let mut hits = Vec::new();
    let mut rest = items.iter().skip(1);
    while let Some(key) = rest.next() {
        let key: String = redis::from_redis_value(key)?;
        let content = match rest.next() {
            Some(Value::Array(fields)) => fields
                .chunks(2)
                .find_map(|pair| match pair {
                    [name, value] => {
                        let name: String = redis::from_redis_value(name).ok()?;
                        (name == "content")
                            .then(|| redis::from_redis_value::<String>(value).ok())
                            .flatten()
                    }
                    _ => None,
                }),
            _ => None,
        };
        hits.push((key, content));
    }
    Ok(hits)
}

/// [`MessageCache`] over Redis with the RediSearch module
#[derive(Clone, Debug)]
pub struct RedisMessageCache {
    pool: RedisPool,
}

impl RedisMessageCache {
    /// Create a new cache over the given pool
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageCache for RedisMessageCache {
    #[instrument(skip(self))]
    async fn ensure_index(&self) -> RepoResult<()> {
        let mut conn = self.pool.get().await?;

        // Stop words and stemming are off: matching is exact on token sequences
        let result = redis::cmd("FT.CREATE")
            .arg(INDEX_NAME)
            .arg("ON")
            .arg("HASH")
            .arg("PREFIX")
            .arg(1)
            .arg(KEY_PREFIX)
            .arg("STOPWORDS")
            .arg(0)
            .arg("SCHEMA")
            .arg("content")
            .arg("TEXT")
            .arg("NOSTEM")
            .arg("author_id")
            .arg("TAG")
            .query_async::<()>(&mut conn)
            .await;

        match result {
            Ok(()) => {
                info!(index = INDEX_NAME, "Spam index created");
                Ok(())
            }
            Err(e) if e.to_string().contains(INDEX_EXISTS) => {
                debug!(index = INDEX_NAME, "Spam index already exists");
                Ok(())
            }
            Err(e) => Err(RedisPoolError::from(e).into()),
        }
    }

    #[instrument(skip(self, entry), fields(key = %key))]
    async fn put(
        &self,
        key: CachedMessageKey,
        entry: &CachedMessage,
        ttl: Duration,
    ) -> RepoResult<()> {
        let mut conn = self.pool.get().await?;
        let redis_key = cache_key(key);
        let ttl_seconds = i64::try_from(ttl.as_secs().max(1)).unwrap_or(i64::MAX);

        redis::pipe()
            .atomic()
            .hset_multiple(
                &redis_key,
                &[
                    ("content", entry.content.clone()),
                    ("author_id", entry.author_id.to_string()),
                ],
            )
            .ignore()
            .expire(&redis_key, ttl_seconds)
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(RedisPoolError::from)?;

        Ok(())
    }

    #[instrument(skip(self, content))]
    async fn find_duplicates(
        &self,
        content: &str,
        author_id: Snowflake,
    ) -> RepoResult<Vec<CachedMessageKey>> {
        if content.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.get().await?;
        let reply: Value = redis::cmd("FT.SEARCH")
            .arg(INDEX_NAME)
            .arg(duplicate_query(content, author_id))
            .arg("RETURN")
            .arg(1)
            .arg("content")
            .arg("LIMIT")
            .arg(0)
            .arg(SEARCH_LIMIT)
            .query_async(&mut conn)
            .await
            .map_err(RedisPoolError::from)?;

        // A phrase query also matches longer messages; keep exact equals only
        let keys = parse_search_reply(&reply)?
            .into_iter()
            .filter(|(_, cached)| cached.as_deref() == Some(content))
            .filter_map(|(key, _)| parse_cache_key(&key))
            .collect();

        Ok(keys)
    }

    #[instrument(skip(self, keys), fields(count = keys.len()))]
    async fn delete(&self, keys: &[CachedMessageKey]) -> RepoResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let redis_keys: Vec<String> = keys.iter().copied().map(cache_key).collect();

        let mut conn = self.pool.get().await?;
        redis::cmd("DEL")
            .arg(&redis_keys)
            .query_async::<i64>(&mut conn)
            .await
            .map_err(RedisPoolError::from)?;

        Ok(())
    }
}
