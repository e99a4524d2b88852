use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};

use vendaflow_core::config::EngineConfig;
use vendaflow_core::delivery::MessageSender;
use vendaflow_core::domain::analysis::AnalysisRecord;
use vendaflow_core::domain::lead::{Author, Lead, LeadId};
use vendaflow_core::domain::settings::keys;
use vendaflow_core::errors::{ApplicationError, DomainError};
use vendaflow_core::flows::{
    FlowContext, FlowEngine, LeadStage, OperatingMode, ProfileUpdate, SalesFlow,
    FEATURED_PRODUCT_LIMIT,
};
use vendaflow_db::repositories::{
    AnalysisRepository, LeadRepository, ProductRepository, RepositoryError,
};
use vendaflow_db::SettingsStore;

use crate::conversation::{
    sales_system_prompt, suggestion_context, suggestion_history, suggestion_prompt,
};
use crate::responder::AiResponder;

/// The word that moves an AI-driven conversation into browsing.
const AI_QUOTE_MARKER: &str = "orçamento";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("lead `{0}` was not found")]
    LeadNotFound(String),
    #[error("message text must not be empty")]
    EmptyText,
}

impl From<EngineError> for ApplicationError {
    fn from(value: EngineError) -> Self {
        match value {
            EngineError::Repository(RepositoryError::Decode(message)) => Self::CorruptData(message),
            EngineError::Repository(error) => Self::Persistence(error.to_string()),
            EngineError::LeadNotFound(id) => Self::Domain(DomainError::LeadNotFound(id)),
            EngineError::EmptyText => Self::Domain(DomainError::EmptyMessage),
        }
    }
}

/// What one inbound message did to its lead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub lead_id: LeadId,
    pub created: bool,
    pub paused: bool,
    /// `None` when the bot is paused and no mode was resolved.
    pub mode: Option<OperatingMode>,
    pub from: LeadStage,
    pub to: LeadStage,
    pub replies: Vec<String>,
}

/// Async mutexes keyed by phone number.
///
/// Entries nobody holds are dropped on the next acquire.
#[derive(Default)]
struct LeadLocks {
    slots: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl LeadLocks {
    async fn acquire(&self, phone_number: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = match self.slots.lock() {
                Ok(slots) => slots,
                Err(poisoned) => poisoned.into_inner(),
            };
            slots.retain(|key, slot| key == phone_number || Arc::strong_count(slot) > 1);
            slots.entry(phone_number.to_string()).or_default().clone()
        };
        slot.lock_owned().await
    }
}

pub struct ConversationEngine {
    leads: Arc<dyn LeadRepository>,
    catalog: Arc<dyn ProductRepository>,
    analysis: Arc<dyn AnalysisRepository>,
    settings: SettingsStore,
    responder: Arc<dyn AiResponder>,
    sender: Arc<dyn MessageSender>,
    config: EngineConfig,
    flow: FlowEngine<SalesFlow>,
    locks: LeadLocks,
}

impl ConversationEngine {
    pub fn new(
        leads: Arc<dyn LeadRepository>,
        catalog: Arc<dyn ProductRepository>,
        analysis: Arc<dyn AnalysisRepository>,
        settings: SettingsStore,
        responder: Arc<dyn AiResponder>,
        sender: Arc<dyn MessageSender>,
        config: EngineConfig,
    ) -> Self {
        Self {
            leads,
            catalog,
            analysis,
            settings,
            responder,
            sender,
            config,
            flow: FlowEngine::default(),
            locks: LeadLocks::default(),
        }
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn leads(&self) -> &Arc<dyn LeadRepository> {
        &self.leads
    }

    /// Handles one inbound customer message with the default sender.
    pub async fn process(
        &self,
        phone_number: &str,
        text: &str,
    ) -> Result<ProcessOutcome, EngineError> {
        self.process_with(phone_number, text, self.sender.as_ref()).await
    }

    /// Handles one inbound customer message, delivering replies through `sender`.
    ///
    /// The lead is written exactly once. Delivery never fails; repository
    /// errors propagate.
    pub async fn process_with(
        &self,
        phone_number: &str,
        text: &str,
        sender: &dyn MessageSender,
    ) -> Result<ProcessOutcome, EngineError> {
        let _guard = self.locks.acquire(phone_number).await;
        let now = Utc::now();

        let (mut lead, created) = match self.leads.find_by_phone(phone_number).await? {
            Some(lead) => (lead, false),
            None => (Lead::new(phone_number, now), true),
        };
        let from = lead.stage.clone();
        lead.record_inbound(text, now);

        if lead.bot_paused {
            let lead_id = lead.id.clone();
            self.leads.save(lead).await?;
            info!(
                event_name = "system.conversation.paused_skip",
                lead_id = %lead_id.0,
                "bot paused, inbound message recorded only"
            );
            return Ok(ProcessOutcome {
                lead_id,
                created,
                paused: true,
                mode: None,
                to: from.clone(),
                from,
                replies: Vec::new(),
            });
        }

        // Reset keywords restart the conversation in either mode.
        lead.stage = self.flow.entry_stage(&lead.stage, text);

        let mode = OperatingMode::from_ai_flag(self.settings.flag(keys::AI_DRIVEN_BOT).await?);
        let business_name =
            self.settings.text_or(keys::COMPANY_NAME, &self.config.business_name).await?;
        let bot_name = self.settings.text_or(keys::BOT_NAME, &self.config.bot_name).await?;

        let (replies, analysis) = match mode {
            OperatingMode::AiDriven => {
                let prompt = sales_system_prompt(&business_name, &bot_name);
                let reply = self
                    .responder
                    .generate(lead.recent_history(self.config.history_window), &prompt)
                    .await;
                if reply.contains(AI_QUOTE_MARKER) {
                    lead.stage = LeadStage::Browsing;
                }
                let record = AnalysisRecord::ai_chat(lead.id.clone(), text, reply.clone(), now)
                    .with_metadata(serde_json::json!({ "stage": lead.stage.as_str() }));
                (vec![reply], Some(record))
            }
            OperatingMode::FixedFlow => {
                let context = self.flow_context(&lead.stage, business_name, bot_name).await?;
                let outcome = self.flow.apply(&lead.stage, text, &context);
                match outcome.profile_update {
                    Some(ProfileUpdate::Name(name)) => lead.name = Some(name),
                    Some(ProfileUpdate::Email(email)) => lead.email = Some(email),
                    None => {}
                }
                lead.stage = outcome.to;
                (outcome.replies, None)
            }
        };

        for reply in &replies {
            sender.send(phone_number, reply).await;
            lead.record(Author::Bot, reply.clone(), Utc::now());
        }

        let lead_id = lead.id.clone();
        let to = lead.stage.clone();
        self.leads.save(lead).await?;

        if let Some(record) = analysis {
            if let Err(record_error) = self.analysis.record(record).await {
                warn!(
                    event_name = "system.analysis.record_failed",
                    lead_id = %lead_id.0,
                    error = %record_error,
                    "ai chat analysis was not stored"
                );
            }
        }

        info!(
            event_name = "system.conversation.processed",
            lead_id = %lead_id.0,
            mode = mode.as_str(),
            from = %from,
            to = %to,
            replies = replies.len(),
            "inbound message processed"
        );

        Ok(ProcessOutcome { lead_id, created, paused: false, mode: Some(mode), from, to, replies })
    }

    /// Sends a human agent's reply and hands the conversation over to them.
    pub async fn send_agent_message(
        &self,
        lead_id: &LeadId,
        text: &str,
    ) -> Result<Lead, EngineError> {
        if text.trim().is_empty() {
            return Err(EngineError::EmptyText);
        }

        let phone_number = self.phone_for(lead_id).await?;
        let _guard = self.locks.acquire(&phone_number).await;
        let mut lead = self.locked_lead(lead_id).await?;

        lead.record_agent_reply(text, Utc::now());
        self.leads.save(lead.clone()).await?;
        self.sender.send(&lead.phone_number, text).await;

        info!(
            event_name = "system.conversation.agent_reply",
            lead_id = %lead.id.0,
            "agent reply sent, bot paused"
        );
        Ok(lead)
    }

    pub async fn set_bot_paused(&self, lead_id: &LeadId, paused: bool) -> Result<Lead, EngineError> {
        let phone_number = self.phone_for(lead_id).await?;
        let _guard = self.locks.acquire(&phone_number).await;
        let mut lead = self.locked_lead(lead_id).await?;

        lead.bot_paused = paused;
        lead.updated_at = Utc::now();
        self.leads.save(lead.clone()).await?;

        info!(
            event_name = "system.conversation.pause_changed",
            lead_id = %lead.id.0,
            paused,
            "bot pause flag updated"
        );
        Ok(lead)
    }

    /// Drafts a reply an agent may send, from the lead's recent history and
    /// the whole catalog.
    pub async fn suggest_reply(&self, lead_id: &LeadId) -> Result<String, EngineError> {
        let phone_number = self.phone_for(lead_id).await?;
        let _guard = self.locks.acquire(&phone_number).await;
        let lead = self.locked_lead(lead_id).await?;

        let company_name =
            self.settings.text_or(keys::COMPANY_NAME, &self.config.business_name).await?;
        let products = self.catalog.list_all().await?;
        let context = suggestion_context(&company_name, &lead.stage, &products);
        let prompt = suggestion_prompt(&company_name, &context);
        let history = suggestion_history(lead.recent_history(self.config.history_window));

        let suggestion = self.responder.generate(&history, &prompt).await;

        let record = AnalysisRecord::admin_suggestion(
            lead.id.clone(),
            context,
            suggestion.clone(),
            Utc::now(),
        );
        if let Err(record_error) = self.analysis.record(record).await {
            warn!(
                event_name = "system.analysis.record_failed",
                lead_id = %lead.id.0,
                error = %record_error,
                "suggestion analysis was not stored"
            );
        }
        Ok(suggestion)
    }

    async fn flow_context(
        &self,
        entry: &LeadStage,
        business_name: String,
        bot_name: String,
    ) -> Result<FlowContext, EngineError> {
        let contact_phone =
            self.settings.text_or(keys::CONTACT_PHONE, &self.config.contact_phone).await?;
        let margin_pct = if entry.needs_margin() {
            self.settings.decimal_or(keys::BUDGET_MARGIN, self.config.default_margin()).await?
        } else {
            self.config.default_margin()
        };
        let featured_products = if entry.needs_catalog() {
            self.catalog.list_featured(FEATURED_PRODUCT_LIMIT as u32).await?
        } else {
            Vec::new()
        };

        Ok(FlowContext { business_name, bot_name, contact_phone, margin_pct, featured_products })
    }

    async fn phone_for(&self, lead_id: &LeadId) -> Result<String, EngineError> {
        self.leads
            .find_by_id(lead_id)
            .await?
            .map(|lead| lead.phone_number)
            .ok_or_else(|| EngineError::LeadNotFound(lead_id.0.clone()))
    }

    async fn locked_lead(&self, lead_id: &LeadId) -> Result<Lead, EngineError> {
        self.leads
            .find_by_id(lead_id)
            .await?
            .ok_or_else(|| EngineError::LeadNotFound(lead_id.0.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;

    use vendaflow_core::config::EngineConfig;
    use vendaflow_core::delivery::RecordingSender;
    use vendaflow_core::domain::analysis::AnalysisKind;
    use vendaflow_core::domain::lead::{Author, HistoryEntry, Lead, LeadId};
    use vendaflow_core::domain::product::{Product, ProductId};
    use vendaflow_core::domain::settings::keys;
    use vendaflow_core::errors::{ApplicationError, InterfaceError};
    use vendaflow_core::flows::engine::RESET_KEYWORDS;
    use vendaflow_core::flows::{LeadStage, OperatingMode};
    use vendaflow_db::repositories::{
        AnalysisRepository, InMemoryAnalysisRepository, InMemoryLeadRepository,
        InMemoryProductRepository, InMemorySettingsRepository, LeadRepository,
        ProductRepository, RepositoryError,
    };
    use vendaflow_db::SettingsStore;

    use super::{ConversationEngine, EngineError};
    use crate::responder::AiResponder;

    #[derive(Default)]
    struct ScriptedResponder {
        reply: String,
        calls: Mutex<Vec<(Vec<HistoryEntry>, String)>>,
    }

    impl ScriptedResponder {
        fn replying(reply: &str) -> Self {
            Self { reply: reply.to_string(), calls: Mutex::new(Vec::new()) }
        }

        fn calls(&self) -> Vec<(Vec<HistoryEntry>, String)> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl AiResponder for ScriptedResponder {
        async fn generate(&self, history: &[HistoryEntry], system_prompt: &str) -> String {
            self.calls
                .lock()
                .expect("calls lock")
                .push((history.to_vec(), system_prompt.to_string()));
            self.reply.clone()
        }
    }

    struct Harness {
        engine: ConversationEngine,
        leads: Arc<InMemoryLeadRepository>,
        catalog: Arc<InMemoryProductRepository>,
        analysis: Arc<InMemoryAnalysisRepository>,
        responder: Arc<ScriptedResponder>,
        sender: RecordingSender,
    }

    fn engine_config() -> EngineConfig {
        EngineConfig {
            history_window: 10,
            business_name: "Pereira Acabamentos".to_string(),
            bot_name: "Lia".to_string(),
            contact_phone: "19 9989-4281".to_string(),
            default_margin_pct: 10,
        }
    }

    fn harness(ai_reply: &str) -> Harness {
        let leads = Arc::new(InMemoryLeadRepository::default());
        let catalog = Arc::new(InMemoryProductRepository::default());
        let analysis = Arc::new(InMemoryAnalysisRepository::default());
        let settings = SettingsStore::new(Arc::new(InMemorySettingsRepository::default()));
        let responder = Arc::new(ScriptedResponder::replying(ai_reply));
        let sender = RecordingSender::default();
        let engine = ConversationEngine::new(
            leads.clone(),
            catalog.clone(),
            analysis.clone(),
            settings,
            responder.clone(),
            Arc::new(sender.clone()),
            engine_config(),
        );
        Harness { engine, leads, catalog, analysis, responder, sender }
    }

    fn product(index: usize) -> Product {
        Product {
            id: ProductId(format!("PROD-{index}")),
            name: format!("Porcelanato {index}"),
            description: None,
            category: "Porcelanatos".to_string(),
            original_price: Decimal::from(90),
            promotional_price: Decimal::from(80),
            unit: "m²".to_string(),
            featured: true,
            image_url: None,
            stock: 10,
        }
    }

    const PHONE: &str = "5519999990000";

    fn every_stage() -> Vec<LeadStage> {
        vec![
            LeadStage::Welcome,
            LeadStage::WaitingName,
            LeadStage::WaitingEmail,
            LeadStage::ShowingCategories,
            LeadStage::Browsing,
            LeadStage::WaitingMeasurement,
            LeadStage::Done,
            LeadStage::Unrecognized("LEGACY_STAGE".to_string()),
        ]
    }

    async fn seed_lead_at(h: &Harness, stage: LeadStage) {
        let mut lead = Lead::new(PHONE, Utc::now());
        lead.stage = stage;
        h.leads.save(lead).await.expect("seed lead");
    }

    #[tokio::test]
    async fn first_message_creates_lead_and_greets() {
        let h = harness("");

        let outcome = h.engine.process(PHONE, "Bom dia").await.expect("process");

        assert!(outcome.created);
        assert_eq!(outcome.mode, Some(OperatingMode::FixedFlow));
        assert_eq!(outcome.to, LeadStage::WaitingName);
        assert_eq!(h.sender.sent().len(), 2);
        assert!(h.sender.sent()[0].text.contains("*Pereira Acabamentos*"));

        let lead = h.leads.find_by_phone(PHONE).await.expect("find").expect("lead exists");
        let authors: Vec<_> = lead.history.iter().map(|entry| entry.author).collect();
        assert_eq!(authors, vec![Author::Customer, Author::Bot, Author::Bot]);
        assert_eq!(lead.stage, LeadStage::WaitingName);
    }

    #[tokio::test]
    async fn full_fixed_flow_reaches_budget_summary() {
        let h = harness("");
        h.catalog.save(product(1)).await.expect("save product");
        h.engine.settings().set(keys::BUDGET_MARGIN, 10.0, None).await.expect("margin");

        for text in ["oi", "Maria", "maria@example.com", "1", "1"] {
            h.engine.process(PHONE, text).await.expect("process");
        }
        let outcome = h.engine.process(PHONE, "20").await.expect("measurement");

        assert_eq!(outcome.to, LeadStage::Done);
        assert!(outcome.replies[0].contains("22.00"));

        let lead = h.leads.find_by_phone(PHONE).await.expect("find").expect("lead exists");
        assert_eq!(lead.name.as_deref(), Some("Maria"));
        assert_eq!(lead.email.as_deref(), Some("maria@example.com"));
        assert_eq!(lead.count_by(Author::Customer), 6);
    }

    #[tokio::test]
    async fn paused_lead_records_inbound_without_replying() {
        let h = harness("");
        let first = h.engine.process(PHONE, "oi").await.expect("process");
        h.engine.set_bot_paused(&first.lead_id, true).await.expect("pause");
        let sent_before = h.sender.sent().len();

        let outcome = h.engine.process(PHONE, "Maria").await.expect("process");

        assert!(outcome.paused);
        assert!(outcome.replies.is_empty());
        assert_eq!(h.sender.sent().len(), sent_before);
        let lead = h.leads.find_by_phone(PHONE).await.expect("find").expect("lead exists");
        assert_eq!(lead.stage, LeadStage::WaitingName);
        assert_eq!(lead.history.last().map(|entry| entry.text.as_str()), Some("Maria"));
        assert_eq!(lead.name, None);
    }

    #[tokio::test]
    async fn resumed_lead_continues_from_stored_stage() {
        let h = harness("");
        let first = h.engine.process(PHONE, "oi").await.expect("process");
        h.engine.set_bot_paused(&first.lead_id, true).await.expect("pause");
        h.engine.set_bot_paused(&first.lead_id, false).await.expect("resume");

        let outcome = h.engine.process(PHONE, "Maria").await.expect("process");

        assert_eq!(outcome.to, LeadStage::WaitingEmail);
    }

    #[tokio::test]
    async fn agent_message_pauses_bot_and_delivers() {
        let h = harness("");
        let first = h.engine.process(PHONE, "oi").await.expect("process");

        let lead = h
            .engine
            .send_agent_message(&first.lead_id, "Olá, aqui é o João da loja")
            .await
            .expect("agent send");

        assert!(lead.bot_paused);
        assert_eq!(lead.history.last().map(|entry| entry.author), Some(Author::Agent));
        assert_eq!(
            h.sender.sent().last().map(|message| message.text.as_str()),
            Some("Olá, aqui é o João da loja")
        );

        let outcome = h.engine.process(PHONE, "Obrigado").await.expect("process");
        assert!(outcome.paused);
    }

    #[tokio::test]
    async fn agent_message_rejects_blank_text_and_unknown_lead() {
        let h = harness("");

        let missing = h
            .engine
            .send_agent_message(&LeadId("LEAD-missing".to_string()), "Olá")
            .await
            .expect_err("unknown lead");
        assert!(matches!(missing, EngineError::LeadNotFound(_)));

        let first = h.engine.process(PHONE, "oi").await.expect("process");
        let blank =
            h.engine.send_agent_message(&first.lead_id, "   ").await.expect_err("blank text");
        assert!(matches!(blank, EngineError::EmptyText));
    }

    #[tokio::test]
    async fn ai_mode_sends_single_reply_and_records_analysis() {
        let h = harness("Posso preparar seu orçamento! Qual a metragem?");
        h.engine.settings().set(keys::AI_DRIVEN_BOT, true, None).await.expect("ai mode");

        let outcome = h.engine.process(PHONE, "Quero um porcelanato").await.expect("process");

        assert_eq!(outcome.mode, Some(OperatingMode::AiDriven));
        assert_eq!(outcome.replies.len(), 1);
        assert_eq!(outcome.to, LeadStage::Browsing);
        assert_eq!(h.sender.sent().len(), 1);

        let calls = h.responder.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.contains("Lia"));
        assert_eq!(calls[0].0.last().map(|entry| entry.text.as_str()), Some("Quero um porcelanato"));

        let records = h.analysis.list_for_lead(&outcome.lead_id).await.expect("records");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, AnalysisKind::AiChat);
        assert!(records[0].converted);
    }

    #[tokio::test]
    async fn ai_mode_keeps_stage_without_quote_mention() {
        let h = harness("Olá! Em que posso ajudar?");
        h.engine.settings().set(keys::AI_DRIVEN_BOT, "true", None).await.expect("ai mode");

        let outcome = h.engine.process(PHONE, "oi").await.expect("process");

        assert_eq!(outcome.to, LeadStage::Welcome);
    }

    #[tokio::test]
    async fn reset_keyword_restarts_fixed_flow_from_every_stage() {
        for stage in every_stage() {
            for keyword in RESET_KEYWORDS {
                let h = harness("");
                seed_lead_at(&h, stage.clone()).await;
                let text = format!("  {} ", keyword.to_uppercase());

                let outcome = h.engine.process(PHONE, &text).await.expect("process");

                assert_eq!(outcome.from, stage);
                assert_eq!(outcome.to, LeadStage::WaitingName, "{text:?} from {stage}");
                assert_eq!(outcome.replies.len(), 2, "{text:?} from {stage}");
                assert!(outcome.replies[0].contains("*Pereira Acabamentos*"));
                assert!(outcome.replies[1].contains("*Lia*"));
            }
        }
    }

    #[tokio::test]
    async fn reset_keyword_returns_ai_conversation_to_welcome() {
        for stage in every_stage() {
            for keyword in RESET_KEYWORDS {
                let h = harness("Olá de novo! Como posso ajudar?");
                h.engine.settings().set(keys::AI_DRIVEN_BOT, true, None).await.expect("ai mode");
                seed_lead_at(&h, stage.clone()).await;

                let outcome = h.engine.process(PHONE, keyword).await.expect("process");

                assert_eq!(outcome.mode, Some(OperatingMode::AiDriven));
                assert_eq!(outcome.to, LeadStage::Welcome, "{keyword} from {stage}");
                assert_eq!(outcome.replies, vec!["Olá de novo! Como posso ajudar?".to_string()]);
                let lead = h.leads.find_by_phone(PHONE).await.expect("find").expect("lead");
                assert_eq!(lead.stage, LeadStage::Welcome);
            }
        }
    }

    #[tokio::test]
    async fn ai_mode_keeps_done_stage_for_ordinary_text() {
        let h = harness("Obrigada pelo contato!");
        h.engine.settings().set(keys::AI_DRIVEN_BOT, true, None).await.expect("ai mode");
        seed_lead_at(&h, LeadStage::Done).await;

        let outcome = h.engine.process(PHONE, "valeu").await.expect("process");

        assert_eq!(outcome.to, LeadStage::Done);
    }

    #[tokio::test]
    async fn reset_in_ai_mode_still_moves_to_browsing_on_quote_mention() {
        let h = harness("Vamos montar seu orçamento?");
        h.engine.settings().set(keys::AI_DRIVEN_BOT, true, None).await.expect("ai mode");
        seed_lead_at(&h, LeadStage::Done).await;

        let outcome = h.engine.process(PHONE, "menu").await.expect("process");

        assert_eq!(outcome.to, LeadStage::Browsing);
    }

    #[test]
    fn decode_failures_surface_as_internal_errors() {
        let error = ApplicationError::from(EngineError::Repository(RepositoryError::Decode(
            "unknown author `robot`".to_string(),
        )));

        assert_eq!(error, ApplicationError::CorruptData("unknown author `robot`".to_string()));
        assert!(matches!(error.into_interface("req-9"), InterfaceError::Internal { .. }));
    }

    #[tokio::test]
    async fn ai_prompt_window_is_bounded() {
        let h = harness("Certo.");
        h.engine.settings().set(keys::AI_DRIVEN_BOT, true, None).await.expect("ai mode");

        for index in 0..8 {
            h.engine.process(PHONE, &format!("mensagem {index}")).await.expect("process");
        }

        let calls = h.responder.calls();
        assert_eq!(calls.last().map(|(history, _)| history.len()), Some(10));
    }

    #[tokio::test]
    async fn suggestion_uses_catalog_context_and_records_it() {
        let h = harness("Que tal agendar uma visita?");
        h.catalog.save(product(1)).await.expect("save product");
        let first = h.engine.process(PHONE, "oi").await.expect("process");

        let suggestion = h.engine.suggest_reply(&first.lead_id).await.expect("suggest");

        assert_eq!(suggestion, "Que tal agendar uma visita?");
        let calls = h.responder.calls();
        assert!(calls[0].1.contains("Estágio Atual do Lead: WAITING_NAME"));
        assert!(calls[0].1.contains("- Porcelanato 1 (Porcelanatos): R$ 80 (De: R$ 90)"));
        assert!(calls[0].0.iter().all(|entry| entry.author != Author::Agent));

        let records = h.analysis.list_for_lead(&first.lead_id).await.expect("records");
        assert_eq!(records[0].kind, AnalysisKind::AdminSuggestion);
    }

    #[tokio::test]
    async fn suggestion_for_unknown_lead_is_not_found() {
        let h = harness("");
        let error = h
            .engine
            .suggest_reply(&LeadId("LEAD-missing".to_string()))
            .await
            .expect_err("unknown lead");
        assert!(matches!(error, EngineError::LeadNotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_messages_from_one_phone_are_not_lost() {
        let h = Arc::new(harness(""));

        let tasks: Vec<_> = (0..5)
            .map(|index| {
                let h = h.clone();
                tokio::spawn(async move {
                    h.engine.process(PHONE, &format!("msg {index}")).await.expect("process");
                })
            })
            .collect();
        for task in tasks {
            task.await.expect("join");
        }

        let lead = h.leads.find_by_phone(PHONE).await.expect("find").expect("lead exists");
        assert_eq!(lead.count_by(Author::Customer), 5);
    }
}
