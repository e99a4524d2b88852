use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flows::states::LeadStage;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub String);

impl LeadId {
    pub fn generate() -> Self {
        Self(format!("LEAD-{}", Uuid::new_v4().simple()))
    }
}

/// Who authored a history entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    Customer,
    Bot,
    Agent,
}

impl Author {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Bot => "bot",
            Self::Agent => "agent",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "customer" => Some(Self::Customer),
            "bot" => Some(Self::Bot),
            "agent" => Some(Self::Agent),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub author: Author,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

pub const DEFAULT_LEAD_STATUS: &str = "new";

/// One conversation record per customer phone number.
///
/// `history` is append-only: entries are pushed through [`Lead::record`] and
/// never edited or reordered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub phone_number: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub status: String,
    pub stage: LeadStage,
    pub history: Vec<HistoryEntry>,
    pub bot_paused: bool,
    pub last_interaction: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    pub fn new(phone_number: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: LeadId::generate(),
            phone_number: phone_number.into(),
            name: None,
            email: None,
            status: DEFAULT_LEAD_STATUS.to_string(),
            stage: LeadStage::Welcome,
            history: Vec::new(),
            bot_paused: false,
            last_interaction: now,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn record(&mut self, author: Author, text: impl Into<String>, at: DateTime<Utc>) {
        self.history.push(HistoryEntry { author, text: text.into(), timestamp: at });
        self.updated_at = at;
    }

    /// Appends a customer message and bumps `last_interaction`.
    pub fn record_inbound(&mut self, text: impl Into<String>, at: DateTime<Utc>) {
        self.record(Author::Customer, text, at);
        self.last_interaction = at;
    }

    /// Appends an agent message, bumps `last_interaction` and hands the
    /// conversation over to a human.
    pub fn record_agent_reply(&mut self, text: impl Into<String>, at: DateTime<Utc>) {
        self.record(Author::Agent, text, at);
        self.last_interaction = at;
        self.bot_paused = true;
    }

    pub fn recent_history(&self, window: usize) -> &[HistoryEntry] {
        let start = self.history.len().saturating_sub(window);
        &self.history[start..]
    }

    pub fn count_by(&self, author: Author) -> usize {
        self.history.iter().filter(|entry| entry.author == author).count()
    }
}
