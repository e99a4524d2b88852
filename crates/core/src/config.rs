use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::settings::keys;
use crate::flows::DEFAULT_MARGIN_PCT;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub whatsapp: WhatsAppConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub bridge: BridgeConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Cloud API credentials used when the settings table has no value.
#[derive(Clone, Debug)]
pub struct WhatsAppConfig {
    pub phone_number_id: Option<String>,
    pub access_token: Option<SecretString>,
    pub verify_token: Option<SecretString>,
    pub app_secret: Option<SecretString>,
    pub graph_base_url: String,
    pub api_version: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct BridgeConfig {
    pub enabled: bool,
    /// Sidecar program (and arguments) that drives the WhatsApp Web session.
    pub command: Vec<String>,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub history_window: usize,
    pub business_name: String,
    pub bot_name: String,
    pub contact_phone: String,
    pub default_margin_pct: u32,
}

impl EngineConfig {
    pub fn default_margin(&self) -> Decimal {
        Decimal::from(self.default_margin_pct)
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub server_port: Option<u16>,
    pub bridge_enabled: Option<bool>,
    pub llm_model: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://vendaflow.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            whatsapp: WhatsAppConfig {
                phone_number_id: None,
                access_token: None,
                verify_token: None,
                app_secret: None,
                graph_base_url: "https://graph.facebook.com".to_string(),
                api_version: "v22.0".to_string(),
                timeout_secs: 15,
            },
            llm: LlmConfig {
                api_key: None,
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                model: "gemini-1.5-flash".to_string(),
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 3000,
                graceful_shutdown_secs: 15,
            },
            bridge: BridgeConfig {
                enabled: false,
                command: Vec::new(),
                max_retries: 10,
                base_delay_ms: 1_000,
                max_delay_ms: 30_000,
            },
            engine: EngineConfig {
                history_window: 10,
                business_name: "Pereira Acabamentos".to_string(),
                bot_name: "Lia".to_string(),
                contact_phone: "19 9989-4281".to_string(),
                default_margin_pct: DEFAULT_MARGIN_PCT,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("vendaflow.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Fallback values for the credential settings an operator may leave unset
    /// in the settings table.
    pub fn credential_defaults(&self) -> Vec<(&'static str, String)> {
        let mut defaults = Vec::new();
        if let Some(value) = &self.whatsapp.phone_number_id {
            defaults.push((keys::WHATSAPP_PHONE_NUMBER_ID, value.clone()));
        }
        if let Some(value) = &self.whatsapp.access_token {
            defaults.push((keys::WHATSAPP_ACCESS_TOKEN, value.expose_secret().to_string()));
        }
        if let Some(value) = &self.whatsapp.verify_token {
            defaults.push((keys::WHATSAPP_VERIFY_TOKEN, value.expose_secret().to_string()));
        }
        if let Some(value) = &self.llm.api_key {
            defaults.push((keys::GEMINI_API_KEY, value.expose_secret().to_string()));
        }
        defaults
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(whatsapp) = patch.whatsapp {
            if let Some(phone_number_id) = whatsapp.phone_number_id {
                self.whatsapp.phone_number_id = Some(phone_number_id);
            }
            if let Some(access_token) = whatsapp.access_token {
                self.whatsapp.access_token = Some(secret_value(access_token));
            }
            if let Some(verify_token) = whatsapp.verify_token {
                self.whatsapp.verify_token = Some(secret_value(verify_token));
            }
            if let Some(app_secret) = whatsapp.app_secret {
                self.whatsapp.app_secret = Some(secret_value(app_secret));
            }
            if let Some(graph_base_url) = whatsapp.graph_base_url {
                self.whatsapp.graph_base_url = graph_base_url;
            }
            if let Some(api_version) = whatsapp.api_version {
                self.whatsapp.api_version = api_version;
            }
            if let Some(timeout_secs) = whatsapp.timeout_secs {
                self.whatsapp.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(api_key) = llm.api_key {
                self.llm.api_key = Some(secret_value(api_key));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(bridge) = patch.bridge {
            if let Some(enabled) = bridge.enabled {
                self.bridge.enabled = enabled;
            }
            if let Some(command) = bridge.command {
                self.bridge.command = command;
            }
            if let Some(max_retries) = bridge.max_retries {
                self.bridge.max_retries = max_retries;
            }
            if let Some(base_delay_ms) = bridge.base_delay_ms {
                self.bridge.base_delay_ms = base_delay_ms;
            }
            if let Some(max_delay_ms) = bridge.max_delay_ms {
                self.bridge.max_delay_ms = max_delay_ms;
            }
        }

        if let Some(engine) = patch.engine {
            if let Some(history_window) = engine.history_window {
                self.engine.history_window = history_window;
            }
            if let Some(business_name) = engine.business_name {
                self.engine.business_name = business_name;
            }
            if let Some(bot_name) = engine.bot_name {
                self.engine.bot_name = bot_name;
            }
            if let Some(contact_phone) = engine.contact_phone {
                self.engine.contact_phone = contact_phone;
            }
            if let Some(default_margin_pct) = engine.default_margin_pct {
                self.engine.default_margin_pct = default_margin_pct;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("VENDAFLOW_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("VENDAFLOW_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("VENDAFLOW_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("VENDAFLOW_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("VENDAFLOW_DATABASE_TIMEOUT_SECS", &value)?;
        }

        let phone_number_id = read_env("VENDAFLOW_WHATSAPP_PHONE_NUMBER_ID")
            .or_else(|| read_env("WHATSAPP_PHONE_NUMBER_ID"));
        if let Some(value) = phone_number_id {
            self.whatsapp.phone_number_id = Some(value);
        }
        let access_token = read_env("VENDAFLOW_WHATSAPP_ACCESS_TOKEN")
            .or_else(|| read_env("WHATSAPP_ACCESS_TOKEN"));
        if let Some(value) = access_token {
            self.whatsapp.access_token = Some(secret_value(value));
        }
        let verify_token = read_env("VENDAFLOW_WHATSAPP_VERIFY_TOKEN")
            .or_else(|| read_env("WHATSAPP_VERIFY_TOKEN"));
        if let Some(value) = verify_token {
            self.whatsapp.verify_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("VENDAFLOW_WHATSAPP_APP_SECRET") {
            self.whatsapp.app_secret = Some(secret_value(value));
        }
        if let Some(value) = read_env("VENDAFLOW_WHATSAPP_GRAPH_BASE_URL") {
            self.whatsapp.graph_base_url = value;
        }
        if let Some(value) = read_env("VENDAFLOW_WHATSAPP_API_VERSION") {
            self.whatsapp.api_version = value;
        }
        if let Some(value) = read_env("VENDAFLOW_WHATSAPP_TIMEOUT_SECS") {
            self.whatsapp.timeout_secs = parse_u64("VENDAFLOW_WHATSAPP_TIMEOUT_SECS", &value)?;
        }

        let api_key = read_env("VENDAFLOW_LLM_API_KEY").or_else(|| read_env("GEMINI_API_KEY"));
        if let Some(value) = api_key {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("VENDAFLOW_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("VENDAFLOW_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("VENDAFLOW_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("VENDAFLOW_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("VENDAFLOW_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("VENDAFLOW_SERVER_PORT") {
            self.server.port = parse_u16("VENDAFLOW_SERVER_PORT", &value)?;
        } else if let Some(value) = read_env("PORT") {
            self.server.port = parse_u16("PORT", &value)?;
        }
        if let Some(value) = read_env("VENDAFLOW_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("VENDAFLOW_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("VENDAFLOW_BRIDGE_ENABLED") {
            self.bridge.enabled = parse_bool("VENDAFLOW_BRIDGE_ENABLED", &value)?;
        }
        if let Some(value) = read_env("VENDAFLOW_BRIDGE_COMMAND") {
            self.bridge.command = value.split_whitespace().map(str::to_string).collect();
        }
        if let Some(value) = read_env("VENDAFLOW_BRIDGE_MAX_RETRIES") {
            self.bridge.max_retries = parse_u32("VENDAFLOW_BRIDGE_MAX_RETRIES", &value)?;
        }
        if let Some(value) = read_env("VENDAFLOW_BRIDGE_BASE_DELAY_MS") {
            self.bridge.base_delay_ms = parse_u64("VENDAFLOW_BRIDGE_BASE_DELAY_MS", &value)?;
        }
        if let Some(value) = read_env("VENDAFLOW_BRIDGE_MAX_DELAY_MS") {
            self.bridge.max_delay_ms = parse_u64("VENDAFLOW_BRIDGE_MAX_DELAY_MS", &value)?;
        }

        if let Some(value) = read_env("VENDAFLOW_ENGINE_HISTORY_WINDOW") {
            self.engine.history_window = parse_usize("VENDAFLOW_ENGINE_HISTORY_WINDOW", &value)?;
        }
        if let Some(value) = read_env("VENDAFLOW_ENGINE_BUSINESS_NAME") {
            self.engine.business_name = value;
        }
        if let Some(value) = read_env("VENDAFLOW_ENGINE_BOT_NAME") {
            self.engine.bot_name = value;
        }
        if let Some(value) = read_env("VENDAFLOW_ENGINE_CONTACT_PHONE") {
            self.engine.contact_phone = value;
        }
        if let Some(value) = read_env("VENDAFLOW_ENGINE_DEFAULT_MARGIN_PCT") {
            self.engine.default_margin_pct =
                parse_u32("VENDAFLOW_ENGINE_DEFAULT_MARGIN_PCT", &value)?;
        }

        let log_level =
            read_env("VENDAFLOW_LOGGING_LEVEL").or_else(|| read_env("VENDAFLOW_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("VENDAFLOW_LOGGING_FORMAT").or_else(|| read_env("VENDAFLOW_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(enabled) = overrides.bridge_enabled {
            self.bridge.enabled = enabled;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_whatsapp(&self.whatsapp)?;
        validate_llm(&self.llm)?;
        validate_server(&self.server)?;
        validate_bridge(&self.bridge)?;
        validate_engine(&self.engine)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("vendaflow.toml"), PathBuf::from("config/vendaflow.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_whatsapp(whatsapp: &WhatsAppConfig) -> Result<(), ConfigError> {
    if !is_http_url(&whatsapp.graph_base_url) {
        return Err(ConfigError::Validation(
            "whatsapp.graph_base_url must start with http:// or https://".to_string(),
        ));
    }

    if whatsapp.api_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "whatsapp.api_version must not be empty (e.g. `v22.0`)".to_string(),
        ));
    }

    if whatsapp.timeout_secs == 0 || whatsapp.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "whatsapp.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if !is_http_url(&llm.base_url) {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_bridge(bridge: &BridgeConfig) -> Result<(), ConfigError> {
    if bridge.enabled && bridge.command.is_empty() {
        return Err(ConfigError::Validation(
            "bridge.command must be set when bridge.enabled is true".to_string(),
        ));
    }

    if bridge.base_delay_ms == 0 {
        return Err(ConfigError::Validation(
            "bridge.base_delay_ms must be greater than zero".to_string(),
        ));
    }

    if bridge.max_delay_ms < bridge.base_delay_ms {
        return Err(ConfigError::Validation(
            "bridge.max_delay_ms must be greater than or equal to bridge.base_delay_ms"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_engine(engine: &EngineConfig) -> Result<(), ConfigError> {
    if engine.history_window == 0 {
        return Err(ConfigError::Validation(
            "engine.history_window must be greater than zero".to_string(),
        ));
    }

    if engine.business_name.trim().is_empty() || engine.bot_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "engine.business_name and engine.bot_name must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse::<u16>().map_err(|_| invalid_override(key, value))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| invalid_override(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    whatsapp: Option<WhatsAppPatch>,
    llm: Option<LlmPatch>,
    server: Option<ServerPatch>,
    bridge: Option<BridgePatch>,
    engine: Option<EnginePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WhatsAppPatch {
    phone_number_id: Option<String>,
    access_token: Option<String>,
    verify_token: Option<String>,
    app_secret: Option<String>,
    graph_base_url: Option<String>,
    api_version: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct BridgePatch {
    enabled: Option<bool>,
    command: Option<Vec<String>>,
    max_retries: Option<u32>,
    base_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    history_window: Option<usize>,
    business_name: Option<String>,
    bot_name: Option<String>,
    contact_phone: Option<String>,
    default_margin_pct: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
