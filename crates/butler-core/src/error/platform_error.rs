//! Platform errors - failures reported by the chat platform adapter

use std::time::Duration;

use thiserror::Error;

/// Errors returned by a [`PlatformClient`](crate::traits::PlatformClient)
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    /// The member, message, channel or role does not exist (any more)
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    /// The bot lacks access to the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Rate limit still in force after the client's own retries
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// Any other non-success response
    #[error("Platform returned {status}: {message}")]
    Api {
        status: u16,
        code: Option<u64>,
        message: String,
    },

    /// Connection, TLS or timeout failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Gateway session failure
    #[error("Gateway error: {0}")]
    Gateway(String),
}

impl PlatformError {
    /// Shorthand for [`PlatformError::NotFound`]
    pub const fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    /// The addressed object does not exist (any more)
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Channels the bot cannot read are skipped by the activity scan
    #[inline]
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }

    /// The member (or the user behind it) is no longer in the guild
    ///
    /// Moderation skips these; a missing role or channel is a real failure.
    pub fn is_member_gone(&self) -> bool {
        matches!(self, Self::NotFound { resource: "member" | "user" })
    }
}

/// Result type for platform operations
pub type PlatformResult<T> = Result<T, PlatformError>;
