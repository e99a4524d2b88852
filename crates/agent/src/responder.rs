use async_trait::async_trait;
use tracing::{error, warn};

use vendaflow_core::domain::lead::{Author, HistoryEntry};
use vendaflow_core::domain::settings::keys;
use vendaflow_db::SettingsStore;

use crate::llm::{Content, ContentRole, LlmClient};

pub const MISSING_KEY_REPLY: &str = "Desculpe, meu cérebro de IA está desconectado no momento. Por favor, configure a chave de API.";
pub const FAILURE_REPLY: &str = "Ocorreu um erro ao processar sua solicitação com a IA.";
pub const EMPTY_REPLY: &str = "Não consegui gerar uma resposta.";

const SYSTEM_ACKNOWLEDGEMENT: &str = "Entendido. Eu sou seu assistente de vendas especializado e seguirei todas essas instruções para atender o cliente da melhor forma possível.";

/// Produces one reply for a conversation.
///
/// Never fails: a missing key or a provider failure comes back as a fixed
/// apology the customer can read.
#[async_trait]
pub trait AiResponder: Send + Sync {
    async fn generate(&self, history: &[HistoryEntry], system_prompt: &str) -> String;
}

pub fn build_contents(history: &[HistoryEntry], system_prompt: &str) -> Vec<Content> {
    let mut contents = Vec::with_capacity(history.len() + 2);
    if !system_prompt.trim().is_empty() {
        contents.push(Content::text(
            ContentRole::User,
            format!("INSTRUÇÕES DO SISTEMA (OBEDECER SEMPRE): {system_prompt}"),
        ));
        contents.push(Content::text(ContentRole::Model, SYSTEM_ACKNOWLEDGEMENT));
    }
    contents.extend(history.iter().map(|entry| {
        let role = match entry.author {
            Author::Customer => ContentRole::User,
            Author::Bot | Author::Agent => ContentRole::Model,
        };
        Content::text(role, entry.text.clone())
    }));
    contents
}

/// Resolves the API key from settings on every call so a key saved from the
/// dashboard takes effect without a restart.
pub struct GeminiResponder<C> {
    client: C,
    settings: SettingsStore,
}

impl<C> GeminiResponder<C>
where
    C: LlmClient,
{
    pub fn new(client: C, settings: SettingsStore) -> Self {
        Self { client, settings }
    }

    async fn api_key(&self) -> Option<String> {
        match self.settings.text(keys::GEMINI_API_KEY).await {
            Ok(key) => key,
            Err(lookup_error) => {
                warn!(
                    event_name = "system.ai.key_lookup_failed",
                    error = %lookup_error,
                    "falling back to configured api key"
                );
                self.settings.default_text(keys::GEMINI_API_KEY)
            }
        }
    }
}

#[async_trait]
impl<C> AiResponder for GeminiResponder<C>
where
    C: LlmClient,
{
    async fn generate(&self, history: &[HistoryEntry], system_prompt: &str) -> String {
        let Some(api_key) = self.api_key().await else {
            warn!(event_name = "system.ai.key_missing", "no gemini api key configured");
            return MISSING_KEY_REPLY.to_string();
        };

        let contents = build_contents(history, system_prompt);
        match self.client.generate_content(&api_key, &contents).await {
            Ok(Some(text)) => text,
            Ok(None) => EMPTY_REPLY.to_string(),
            Err(generation_error) => {
                error!(
                    event_name = "system.ai.generation_failed",
                    error = %generation_error,
                    "gemini request failed"
                );
                FAILURE_REPLY.to_string()
            }
        }
    }
}
