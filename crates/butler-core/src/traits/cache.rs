//! Searchable recent-message cache used by spam detection

use std::time::Duration;

use async_trait::async_trait;

use crate::entities::{CachedMessage, CachedMessageKey};
use crate::traits::RepoResult;
use crate::value_objects::Snowflake;

#[async_trait]
pub trait MessageCache: Send + Sync {
    /// Create the full-text index; an existing index is not an error
    async fn ensure_index(&self) -> RepoResult<()>;

    /// Store an entry that expires after `ttl`
    async fn put(
        &self,
        key: CachedMessageKey,
        entry: &CachedMessage,
        ttl: Duration,
    ) -> RepoResult<()>;

    /// Keys of cached messages by `author_id` whose tokenized content equals `content`
    async fn find_duplicates(
        &self,
        content: &str,
        author_id: Snowflake,
    ) -> RepoResult<Vec<CachedMessageKey>>;

    /// Remove entries; missing keys are ignored
    async fn delete(&self, keys: &[CachedMessageKey]) -> RepoResult<()>;
}
