//! PostgreSQL implementation of SettingsRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use butler_core::entities::Settings;
use butler_core::traits::{RepoResult, SettingsRepository};

use crate::models::SettingsModel;

use super::error::{map_check_violation, map_db_error};

/// PostgreSQL implementation of SettingsRepository
#[derive(Clone)]
pub struct PgSettingsRepository {
    pool: PgPool,
}

impl PgSettingsRepository {
    /// Create a new PgSettingsRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    #[instrument(skip(self))]
    async fn get_or_create(&self) -> RepoResult<Settings> {
        // Concurrent first accesses race on the primary key; the loser inserts nothing
        sqlx::query(
            r#"
            INSERT INTO settings (id, delete_message_days_when_banned)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Settings::SINGLETON_ID)
        .bind(Settings::DEFAULT_DELETE_MESSAGE_DAYS)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        let model = sqlx::query_as::<_, SettingsModel>(
            r#"
            SELECT id, delete_message_days_when_banned, created_at, modified_at
            FROM settings
            WHERE id = $1
            "#,
        )
        .bind(Settings::SINGLETON_ID)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(Settings::from(model))
    }

    #[instrument(skip(self))]
    async fn update(&self, settings: &Settings) -> RepoResult<Settings> {
        let model = sqlx::query_as::<_, SettingsModel>(
            r#"
            INSERT INTO settings (id, delete_message_days_when_banned)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE
            SET delete_message_days_when_banned = EXCLUDED.delete_message_days_when_banned,
                modified_at = NOW()
            RETURNING id, delete_message_days_when_banned, created_at, modified_at
            "#,
        )
        .bind(Settings::SINGLETON_ID)
        .bind(settings.delete_message_days_when_banned)
        .fetch_one(&self.pool)
        .await
        .map_err(map_check_violation)?;

        Ok(Settings::from(model))
    }
}
