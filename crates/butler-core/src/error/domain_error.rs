//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::entities::TaskStatus;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    // =========================================================================
    // Business Rule Violations
    // =========================================================================
    #[error("Task cannot move from {from} to {to}")]
    InvalidTaskTransition { from: TaskStatus, to: TaskStatus },

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => "VALIDATION_ERROR",

            Self::InvalidTaskTransition { .. } => "INVALID_TASK_TRANSITION",

            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_))
    }

    /// Check if this is a state-machine conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::InvalidTaskTransition { .. })
    }
}
