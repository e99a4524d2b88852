use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::Product;

/// Conversation stage stored on every lead.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeadStage {
    Welcome,
    WaitingName,
    WaitingEmail,
    ShowingCategories,
    Browsing,
    WaitingMeasurement,
    Done,
    /// A stored value this build does not know. Dispatch treats it like `Done`.
    Unrecognized(String),
}

impl LeadStage {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Welcome => "WELCOME",
            Self::WaitingName => "WAITING_NAME",
            Self::WaitingEmail => "WAITING_EMAIL",
            Self::ShowingCategories => "SHOWING_CATEGORIES",
            Self::Browsing => "BROWSING",
            Self::WaitingMeasurement => "WAITING_MEASUREMENT",
            Self::Done => "DONE",
            Self::Unrecognized(raw) => raw.as_str(),
        }
    }

    pub fn from_stored(raw: &str) -> Self {
        match raw {
            "WELCOME" => Self::Welcome,
            "WAITING_NAME" => Self::WaitingName,
            "WAITING_EMAIL" => Self::WaitingEmail,
            "SHOWING_CATEGORIES" => Self::ShowingCategories,
            "BROWSING" => Self::Browsing,
            "WAITING_MEASUREMENT" => Self::WaitingMeasurement,
            "DONE" => Self::Done,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn needs_catalog(&self) -> bool {
        matches!(self, Self::ShowingCategories)
    }

    pub fn needs_margin(&self) -> bool {
        matches!(self, Self::Browsing | Self::WaitingMeasurement)
    }
}

impl fmt::Display for LeadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How replies are produced, resolved once per inbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    FixedFlow,
    AiDriven,
}

impl OperatingMode {
    pub fn from_ai_flag(ai_driven: bool) -> Self {
        if ai_driven {
            Self::AiDriven
        } else {
            Self::FixedFlow
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FixedFlow => "fixed_flow",
            Self::AiDriven => "ai_driven",
        }
    }
}

/// Business data a transition may render into its replies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowContext {
    pub business_name: String,
    pub bot_name: String,
    pub contact_phone: String,
    pub margin_pct: Decimal,
    pub featured_products: Vec<Product>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileUpdate {
    Name(String),
    Email(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowOutcome {
    pub from: LeadStage,
    pub to: LeadStage,
    pub replies: Vec<String>,
    pub profile_update: Option<ProfileUpdate>,
}
