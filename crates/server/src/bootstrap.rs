use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;
use tracing::info;

use vendaflow_agent::{ConversationEngine, GeminiClient, GeminiResponder, LlmError};
use vendaflow_core::config::{AppConfig, ConfigError, LoadOptions};
use vendaflow_core::delivery::MessageSender;
use vendaflow_db::repositories::{
    SqlAnalysisRepository, SqlLeadRepository, SqlProductRepository, SqlSettingsRepository,
};
use vendaflow_db::{connect_with_settings, migrations, DbPool, SettingsStore};
use vendaflow_whatsapp::{
    BridgeError, BridgeRunner, BridgeStatus, CloudApiSender, DeliveryError, InboundHandler,
    InboundHandlerError, InboundMessage, ReconnectPolicy, SidecarBridgeClient,
};

/// Everything the HTTP handlers share.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConversationEngine>,
    pub settings: SettingsStore,
    pub app_secret: Option<SecretString>,
    pub bridge: Option<Arc<BridgeRunner>>,
    pub bridge_status: BridgeStatus,
}

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("ai client setup failed: {0}")]
    Llm(#[from] LlmError),
    #[error("whatsapp delivery setup failed: {0}")]
    Delivery(#[from] DeliveryError),
    #[error("whatsapp bridge setup failed: {0}")]
    Bridge(#[from] BridgeError),
}

/// Feeds bridge traffic into the engine, replying through the bridge.
pub struct EngineInboundHandler {
    engine: Arc<ConversationEngine>,
}

impl EngineInboundHandler {
    pub fn new(engine: Arc<ConversationEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl InboundHandler for EngineInboundHandler {
    async fn handle_inbound(
        &self,
        message: &InboundMessage,
        sender: &dyn MessageSender,
    ) -> Result<(), InboundHandlerError> {
        self.engine
            .process_with(&message.phone_number, &message.text, sender)
            .await
            .map(|_| ())
            .map_err(|error| InboundHandlerError(error.to_string()))
    }
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let settings = SettingsStore::new(Arc::new(SqlSettingsRepository::new(db_pool.clone())))
        .with_defaults(config.credential_defaults());
    let responder = GeminiResponder::new(GeminiClient::new(&config.llm)?, settings.clone());
    let cloud_sender = CloudApiSender::new(&config.whatsapp, settings.clone())?;

    let engine = Arc::new(ConversationEngine::new(
        Arc::new(SqlLeadRepository::new(db_pool.clone())),
        Arc::new(SqlProductRepository::new(db_pool.clone())),
        Arc::new(SqlAnalysisRepository::new(db_pool.clone())),
        settings.clone(),
        Arc::new(responder),
        Arc::new(cloud_sender),
        config.engine.clone(),
    ));

    let bridge_status = BridgeStatus::default();
    let bridge = if config.bridge.enabled {
        let client = SidecarBridgeClient::new(&config.bridge.command)?;
        Some(Arc::new(BridgeRunner::new(
            Arc::new(client),
            Arc::new(EngineInboundHandler::new(engine.clone())),
            bridge_status.clone(),
            ReconnectPolicy::from(&config.bridge),
        )))
    } else {
        None
    };

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        bridge_enabled = bridge.is_some(),
        ai_model = %config.llm.model,
        "conversation engine ready"
    );

    let state = AppState {
        engine,
        settings,
        app_secret: config.whatsapp.app_secret.clone(),
        bridge,
        bridge_status,
    };
    Ok(Application { config, db_pool, state })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use vendaflow_agent::{AiResponder, ConversationEngine};
    use vendaflow_core::config::EngineConfig;
    use vendaflow_core::delivery::RecordingSender;
    use vendaflow_core::domain::lead::HistoryEntry;
    use vendaflow_db::repositories::{
        InMemoryAnalysisRepository, InMemoryLeadRepository, InMemoryProductRepository,
        InMemorySettingsRepository,
    };
    use vendaflow_db::SettingsStore;
    use vendaflow_whatsapp::BridgeStatus;

    use super::AppState;

    pub struct FixedResponder {
        pub reply: String,
        pub prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AiResponder for FixedResponder {
        async fn generate(&self, _history: &[HistoryEntry], system_prompt: &str) -> String {
            self.prompts.lock().expect("prompts lock").push(system_prompt.to_string());
            self.reply.clone()
        }
    }

    pub struct TestContext {
        pub state: AppState,
        pub sender: RecordingSender,
        pub leads: Arc<InMemoryLeadRepository>,
    }

    pub fn context() -> TestContext {
        let leads = Arc::new(InMemoryLeadRepository::default());
        let settings = SettingsStore::new(Arc::new(InMemorySettingsRepository::default()))
            .with_defaults([(
                vendaflow_core::domain::settings::keys::WHATSAPP_VERIFY_TOKEN,
                "env-verify-token".to_string(),
            )]);
        let sender = RecordingSender::default();
        let engine = ConversationEngine::new(
            leads.clone(),
            Arc::new(InMemoryProductRepository::default()),
            Arc::new(InMemoryAnalysisRepository::default()),
            settings.clone(),
            Arc::new(FixedResponder {
                reply: "Sugestão: ofereça uma visita ao showroom.".to_string(),
                prompts: Mutex::new(Vec::new()),
            }),
            Arc::new(sender.clone()),
            EngineConfig {
                history_window: 10,
                business_name: "Pereira Acabamentos".to_string(),
                bot_name: "Lia".to_string(),
                contact_phone: "19 9989-4281".to_string(),
                default_margin_pct: 10,
            },
        );

        TestContext {
            state: AppState {
                engine: Arc::new(engine),
                settings,
                app_secret: None,
                bridge: None,
                bridge_status: BridgeStatus::default(),
            },
            sender,
            leads,
        }
    }
}
