use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::lead::LeadId;

const CONVERSION_MARKERS: &[&str] = &["orçamento", "metragem"];

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisKind {
    AiChat,
    AdminSuggestion,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AiChat => "AI_CHAT",
            Self::AdminSuggestion => "ADMIN_SUGGESTION",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "AI_CHAT" => Some(Self::AiChat),
            "ADMIN_SUGGESTION" => Some(Self::AdminSuggestion),
            _ => None,
        }
    }
}

/// Input/output pair captured for every AI-generated reply.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: AnalysisId,
    pub lead_id: LeadId,
    pub kind: AnalysisKind,
    pub input: String,
    pub output: String,
    pub converted: bool,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn ai_chat(
        lead_id: LeadId,
        input: impl Into<String>,
        output: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(AnalysisKind::AiChat, lead_id, input.into(), output.into(), at)
    }

    /// A reply suggested to a human agent from the dashboard.
    pub fn admin_suggestion(
        lead_id: LeadId,
        input: impl Into<String>,
        output: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(AnalysisKind::AdminSuggestion, lead_id, input.into(), output.into(), at)
    }

    fn new(
        kind: AnalysisKind,
        lead_id: LeadId,
        input: String,
        output: String,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AnalysisId(Uuid::new_v4().to_string()),
            lead_id,
            kind,
            converted: indicates_conversion(&output),
            input,
            output,
            metadata: serde_json::Value::Null,
            created_at: at,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A reply that talks about a quote or a measurement counts as converting.
pub fn indicates_conversion(text: &str) -> bool {
    CONVERSION_MARKERS.iter().any(|marker| text.contains(marker))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{indicates_conversion, AnalysisKind, AnalysisRecord};
    use crate::domain::lead::LeadId;

    #[test]
    fn conversion_is_detected_from_quote_or_measurement_mentions() {
        assert!(indicates_conversion("Posso preparar seu orçamento agora!"));
        assert!(indicates_conversion("Qual a metragem do ambiente?"));
        assert!(!indicates_conversion("Bom dia! Como posso ajudar?"));
    }

    #[test]
    fn ai_chat_record_derives_converted_flag_from_output() {
        let record = AnalysisRecord::ai_chat(
            LeadId("LEAD-1".to_string()),
            "quero piso",
            "Me passe a metragem, por favor.",
            Utc::now(),
        );

        assert_eq!(record.kind, AnalysisKind::AiChat);
        assert!(record.converted);
        assert_eq!(AnalysisKind::parse(record.kind.as_str()), Some(AnalysisKind::AiChat));
    }

    #[test]
    fn suggestion_record_uses_admin_kind() {
        let record = AnalysisRecord::admin_suggestion(
            LeadId("LEAD-1".to_string()),
            "Empresa: Pereira",
            "Olá! Posso ajudar?",
            Utc::now(),
        );

        assert_eq!(record.kind, AnalysisKind::AdminSuggestion);
        assert!(!record.converted);
    }
}
