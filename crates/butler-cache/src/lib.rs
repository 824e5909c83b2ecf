//! # butler-cache
//!
//! Redis layer: a managed connection pool and the RediSearch-backed
//! recent-message cache used by spam detection.
//!
//! ## Example
//!
//! ```ignore
//! use butler_cache::{RedisMessageCache, RedisPool, RedisPoolConfig};
//! use butler_core::traits::MessageCache;
//!
//! let pool = RedisPool::new(RedisPoolConfig::from(&config.redis))?;
//! let cache = RedisMessageCache::new(pool);
//! cache.ensure_index().await?;
//! ```

pub mod antispam;
pub mod pool;

pub use antispam::RedisMessageCache;
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};
