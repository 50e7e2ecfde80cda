//! Settings store: one configuration document per settings domain.

use anyhow::Result;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::error::ApiError;
use crate::settings::{RewardSettings, SettingsRecord, REWARD_SETTINGS_TYPE};

pub struct SettingsService {
    db_pool: PgPool,
}

impl SettingsService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Fetch the reward settings document, creating the canonical defaults
    /// on first read. The insert is an `ON CONFLICT DO NOTHING` upsert so
    /// concurrent first reads cannot race into duplicates.
    pub async fn get(&self) -> Result<SettingsRecord, ApiError> {
        sqlx::query(
            r#"
            INSERT INTO reward_settings (settings_type, payload, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (settings_type) DO NOTHING
            "#,
        )
        .bind(REWARD_SETTINGS_TYPE)
        .bind(Json(RewardSettings::default()))
        .bind(Utc::now())
        .execute(&self.db_pool)
        .await?;

        let record = sqlx::query_as::<_, SettingsRecord>(
            "SELECT * FROM reward_settings WHERE settings_type = $1",
        )
        .bind(REWARD_SETTINGS_TYPE)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(record)
    }

    /// Replace the payload wholesale and stamp the update time.
    pub async fn update(
        &self,
        payload: RewardSettings,
    ) -> Result<SettingsRecord, ApiError> {
        let record = sqlx::query_as::<_, SettingsRecord>(
            r#"
            INSERT INTO reward_settings (settings_type, payload, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (settings_type)
            DO UPDATE SET payload = EXCLUDED.payload, updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(REWARD_SETTINGS_TYPE)
        .bind(Json(payload))
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(record)
    }

    /// Replace the payload with the canonical defaults, independent of any
    /// prior customization.
    pub async fn reset(&self) -> Result<SettingsRecord, ApiError> {
        self.update(RewardSettings::default()).await
    }
}
