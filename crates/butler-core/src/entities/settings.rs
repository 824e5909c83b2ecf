//! Settings entity - operator-tunable policy, exactly one row

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Settings singleton
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub id: i16,
    /// Days of message history purged when a member is banned (0-7)
    pub delete_message_days_when_banned: i16,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Settings {
    /// Fixed primary key of the singleton row
    pub const SINGLETON_ID: i16 = 1;
    /// Default purge window on ban
    pub const DEFAULT_DELETE_MESSAGE_DAYS: i16 = 1;
    /// Largest purge window the platform accepts
    pub const MAX_DELETE_MESSAGE_DAYS: i16 = 7;

    /// Change the purge window, enforcing the accepted range
    pub fn set_delete_message_days(&mut self, days: i16) -> Result<(), DomainError> {
        if !(0..=Self::MAX_DELETE_MESSAGE_DAYS).contains(&days) {
            return Err(DomainError::ValidationError(format!(
                "delete_message_days_when_banned must be between 0 and {}",
                Self::MAX_DELETE_MESSAGE_DAYS
            )));
        }
        self.delete_message_days_when_banned = days;
        self.modified_at = Utc::now();
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Self::SINGLETON_ID,
            delete_message_days_when_banned: Self::DEFAULT_DELETE_MESSAGE_DAYS,
            created_at: now,
            modified_at: now,
        }
    }
}
