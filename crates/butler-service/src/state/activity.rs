//! Per-author message counts produced by the activity scan

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use butler_core::Snowflake;

/// One complete count of guild history
#[derive(Debug, Clone, Default)]
pub struct ActivitySnapshot {
    counts: HashMap<Snowflake, u64>,
    pub scanned_at: Option<DateTime<Utc>>,
}

impl ActivitySnapshot {
    pub fn new(counts: HashMap<Snowflake, u64>) -> Self {
        Self {
            counts,
            scanned_at: Some(Utc::now()),
        }
    }

    /// Messages authored by `member`; zero when never seen
    pub fn count(&self, member: Snowflake) -> u64 {
        self.counts.get(&member).copied().unwrap_or(0)
    }

    /// Number of distinct authors
    pub fn authors(&self) -> usize {
        self.counts.len()
    }
}

/// Holder of the latest finished scan
///
/// A scan in progress never shows through: its counts are published in one
/// swap once the whole history was read.
#[derive(Debug, Default)]
pub struct ActivityCounter {
    current: RwLock<Arc<ActivitySnapshot>>,
}

impl ActivityCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<ActivitySnapshot> {
        Arc::clone(&self.current.read())
    }

    pub fn count(&self, member: Snowflake) -> u64 {
        self.current.read().count(member)
    }

    pub fn publish(&self, counts: HashMap<Snowflake, u64>) {
        *self.current.write() = Arc::new(ActivitySnapshot::new(counts));
    }
}
