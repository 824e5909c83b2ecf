//! Spam-detection message cache

mod message_index;

pub use message_index::{
    cache_key, duplicate_query, parse_cache_key, parse_search_reply, RedisMessageCache,
    INDEX_NAME, KEY_PREFIX,
};
