use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Keys the runtime reads from the settings store.
pub mod keys {
    pub const COMPANY_NAME: &str = "company_name";
    pub const BOT_NAME: &str = "bot_name";
    pub const BUDGET_MARGIN: &str = "budget_margin";
    pub const AI_DRIVEN_BOT: &str = "ai_driven_bot";
    pub const CONTACT_PHONE: &str = "contact_phone";
    pub const GEMINI_API_KEY: &str = "gemini_api_key";
    pub const WHATSAPP_PHONE_NUMBER_ID: &str = "whatsapp_phone_number_id";
    pub const WHATSAPP_ACCESS_TOKEN: &str = "whatsapp_access_token";
    pub const WHATSAPP_VERIFY_TOKEN: &str = "whatsapp_verify_token";
}

/// A stored setting value. The admin surface writes whatever JSON scalar it
/// receives, so readers go through the typed accessors below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SettingValue {
    /// Text form of the value; empty strings count as unset.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(value) if value.trim().is_empty() => None,
            Self::Text(value) => Some(value.clone()),
            Self::Number(value) => Some(value.to_string()),
            Self::Bool(value) => Some(value.to_string()),
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Number(value) if value.is_finite() => Decimal::try_from(*value).ok(),
            Self::Number(_) | Self::Bool(_) => None,
            Self::Text(value) => Decimal::from_str(value.trim().replace(',', ".").as_str()).ok(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Number(value) => Some(*value != 0.0),
            Self::Text(value) => match value.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(true),
                "false" | "0" | "no" | "off" => Some(false),
                _ => None,
            },
        }
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: SettingValue,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}
