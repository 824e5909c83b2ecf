//! Service context - dependency container for services
//!
//! Holds the repositories the admin services read and write.

use std::sync::Arc;

use butler_core::traits::{RosterRepository, SettingsRepository, TaskRepository};

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
///
/// Cheap to clone; every repository sits behind an `Arc`.
#[derive(Clone)]
pub struct ServiceContext {
    task_repo: Arc<dyn TaskRepository>,
    roster_repo: Arc<dyn RosterRepository>,
    settings_repo: Arc<dyn SettingsRepository>,
}

impl ServiceContext {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        roster_repo: Arc<dyn RosterRepository>,
        settings_repo: Arc<dyn SettingsRepository>,
    ) -> Self {
        Self {
            task_repo,
            roster_repo,
            settings_repo,
        }
    }

    /// Get the task repository
    pub fn task_repo(&self) -> &dyn TaskRepository {
        self.task_repo.as_ref()
    }

    /// Get the roster mirror repository
    pub fn roster_repo(&self) -> &dyn RosterRepository {
        self.roster_repo.as_ref()
    }

    /// Get the settings repository
    pub fn settings_repo(&self) -> &dyn SettingsRepository {
        self.settings_repo.as_ref()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .finish()
    }
}

/// Builder for creating ServiceContext
#[derive(Default)]
pub struct ServiceContextBuilder {
    task_repo: Option<Arc<dyn TaskRepository>>,
    roster_repo: Option<Arc<dyn RosterRepository>>,
    settings_repo: Option<Arc<dyn SettingsRepository>>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task_repo(mut self, repo: Arc<dyn TaskRepository>) -> Self {
        self.task_repo = Some(repo);
        self
    }

    pub fn roster_repo(mut self, repo: Arc<dyn RosterRepository>) -> Self {
        self.roster_repo = Some(repo);
        self
    }

    pub fn settings_repo(mut self, repo: Arc<dyn SettingsRepository>) -> Self {
        self.settings_repo = Some(repo);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext::new(
            self.task_repo
                .ok_or_else(|| ServiceError::validation("task_repo is required"))?,
            self.roster_repo
                .ok_or_else(|| ServiceError::validation("roster_repo is required"))?,
            self.settings_repo
                .ok_or_else(|| ServiceError::validation("settings_repo is required"))?,
        ))
    }
}
