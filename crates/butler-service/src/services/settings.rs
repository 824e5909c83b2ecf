//! Settings service

use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{SettingsResponse, UpdateSettingsRequest};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Settings service
pub struct SettingsService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> SettingsService<'a> {
    /// Create a new SettingsService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Current settings, created with defaults on first access
    #[instrument(skip(self))]
    pub async fn get_settings(&self) -> ServiceResult<SettingsResponse> {
        let settings = self.ctx.settings_repo().get_or_create().await?;
        Ok(SettingsResponse::from(&settings))
    }

    /// Apply a partial update
    #[instrument(skip(self))]
    pub async fn update_settings(
        &self,
        request: UpdateSettingsRequest,
    ) -> ServiceResult<SettingsResponse> {
        request
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        let mut settings = self.ctx.settings_repo().get_or_create().await?;
        let Some(days) = request.delete_message_days_when_banned else {
            return Ok(SettingsResponse::from(&settings));
        };

        settings.set_delete_message_days(days)?;
        let settings = self.ctx.settings_repo().update(&settings).await?;

        info!(delete_message_days_when_banned = days, "Settings updated");
        Ok(SettingsResponse::from(&settings))
    }
}
