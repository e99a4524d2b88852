use sqlx::Row;

use vendaflow_core::domain::settings::{Setting, SettingValue};

use super::{decode_err, parse_timestamp, RepositoryError, SettingsRepository};
use crate::DbPool;

pub struct SqlSettingsRepository {
    pool: DbPool,
}

impl SqlSettingsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_setting(row: &sqlx::sqlite::SqliteRow) -> Result<Setting, RepositoryError> {
    let key: String = row.try_get("key").map_err(decode_err)?;
    let value_json: String = row.try_get("value_json").map_err(decode_err)?;
    let description: Option<String> = row.try_get("description").map_err(decode_err)?;
    let updated_at: String = row.try_get("updated_at").map_err(decode_err)?;

    let value = serde_json::from_str::<SettingValue>(&value_json)
        .map_err(|e| RepositoryError::Decode(format!("setting `{key}` has invalid value: {e}")))?;

    Ok(Setting { key, value, description, updated_at: parse_timestamp(&updated_at)? })
}

#[async_trait::async_trait]
impl SettingsRepository for SqlSettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<Setting>, RepositoryError> {
        let row = sqlx::query(
            "SELECT key, value_json, description, updated_at FROM app_setting WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_setting).transpose()
    }

    async fn upsert(&self, setting: Setting) -> Result<(), RepositoryError> {
        let value_json = serde_json::to_string(&setting.value).map_err(decode_err)?;

        sqlx::query(
            "INSERT INTO app_setting (key, value_json, description, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                 value_json = excluded.value_json,
                 description = COALESCE(excluded.description, app_setting.description),
                 updated_at = excluded.updated_at",
        )
        .bind(&setting.key)
        .bind(value_json)
        .bind(&setting.description)
        .bind(setting.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Setting>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT key, value_json, description, updated_at FROM app_setting ORDER BY key ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_setting).collect()
    }
}
