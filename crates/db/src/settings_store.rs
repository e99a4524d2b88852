use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use vendaflow_core::domain::settings::{Setting, SettingValue};

use crate::repositories::{RepositoryError, SettingsRepository};

/// Typed reads over the settings table.
///
/// A key with no stored value (or an empty one) falls back to the defaults
/// registered at startup, usually the credentials from process configuration.
#[derive(Clone)]
pub struct SettingsStore {
    repository: Arc<dyn SettingsRepository>,
    defaults: HashMap<String, String>,
}

impl SettingsStore {
    pub fn new(repository: Arc<dyn SettingsRepository>) -> Self {
        Self { repository, defaults: HashMap::new() }
    }

    pub fn with_defaults<I, K>(mut self, defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, String)>,
        K: Into<String>,
    {
        self.defaults.extend(defaults.into_iter().map(|(key, value)| (key.into(), value)));
        self
    }

    pub fn default_text(&self, key: &str) -> Option<String> {
        self.defaults.get(key).filter(|value| !value.trim().is_empty()).cloned()
    }

    pub async fn value(&self, key: &str) -> Result<Option<SettingValue>, RepositoryError> {
        Ok(self.repository.get(key).await?.map(|setting| setting.value))
    }

    pub async fn text(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let stored = self.value(key).await?.and_then(|value| value.as_text());
        Ok(stored.or_else(|| self.default_text(key)))
    }

    pub async fn text_or(&self, key: &str, fallback: &str) -> Result<String, RepositoryError> {
        Ok(self.text(key).await?.unwrap_or_else(|| fallback.to_string()))
    }

    /// Unparseable values read as `fallback`.
    pub async fn decimal_or(
        &self,
        key: &str,
        fallback: Decimal,
    ) -> Result<Decimal, RepositoryError> {
        Ok(self.value(key).await?.and_then(|value| value.as_decimal()).unwrap_or(fallback))
    }

    pub async fn flag(&self, key: &str) -> Result<bool, RepositoryError> {
        Ok(self.value(key).await?.and_then(|value| value.as_bool()).unwrap_or(false))
    }

    pub async fn set(
        &self,
        key: &str,
        value: impl Into<SettingValue>,
        description: Option<&str>,
    ) -> Result<(), RepositoryError> {
        self.repository
            .upsert(Setting {
                key: key.to_string(),
                value: value.into(),
                description: description.map(str::to_string),
                updated_at: Utc::now(),
            })
            .await
    }

    pub async fn list(&self) -> Result<Vec<Setting>, RepositoryError> {
        self.repository.list().await
    }
}
