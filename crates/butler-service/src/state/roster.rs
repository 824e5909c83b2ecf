//! In-memory roster snapshot shared by the sync and antifraud jobs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use butler_core::{PlatformMember, PlatformRole};

/// Roles and members as fetched by the latest completed roster sync
#[derive(Debug, Clone, Default)]
pub struct RosterSnapshot {
    pub roles: Vec<PlatformRole>,
    pub members: Vec<PlatformMember>,
    /// `None` until the first sync finished
    pub fetched_at: Option<DateTime<Utc>>,
}

impl RosterSnapshot {
    pub fn new(roles: Vec<PlatformRole>, members: Vec<PlatformMember>) -> Self {
        Self {
            roles,
            members,
            fetched_at: Some(Utc::now()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Holder of the current snapshot; replaced wholesale, never mutated
#[derive(Debug, Default)]
pub struct RosterCache {
    current: RwLock<Arc<RosterSnapshot>>,
}

impl RosterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest complete snapshot
    pub fn snapshot(&self) -> Arc<RosterSnapshot> {
        Arc::clone(&self.current.read())
    }

    pub fn replace(&self, snapshot: RosterSnapshot) {
        *self.current.write() = Arc::new(snapshot);
    }
}
