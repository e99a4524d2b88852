use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use toml::Value;
use vendaflow_core::config::{AppConfig, LoadOptions};

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, value, env_keys) in effective_values(&config) {
        let source =
            field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key_path, &value, source));
    }

    lines.join("\n")
}

fn effective_values(config: &AppConfig) -> Vec<(&'static str, String, &'static [&'static str])> {
    vec![
        entry("database.url", config.database.url.clone(), &["VENDAFLOW_DATABASE_URL"]),
        entry(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["VENDAFLOW_DATABASE_MAX_CONNECTIONS"],
        ),
        entry(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["VENDAFLOW_DATABASE_TIMEOUT_SECS"],
        ),
        entry(
            "whatsapp.phone_number_id",
            config.whatsapp.phone_number_id.clone().unwrap_or_else(|| "<unset>".to_string()),
            &["VENDAFLOW_WHATSAPP_PHONE_NUMBER_ID", "WHATSAPP_PHONE_NUMBER_ID"],
        ),
        entry(
            "whatsapp.access_token",
            redact_secret(config.whatsapp.access_token.as_ref()),
            &["VENDAFLOW_WHATSAPP_ACCESS_TOKEN", "WHATSAPP_ACCESS_TOKEN"],
        ),
        entry(
            "whatsapp.verify_token",
            redact_secret(config.whatsapp.verify_token.as_ref()),
            &["VENDAFLOW_WHATSAPP_VERIFY_TOKEN", "WHATSAPP_VERIFY_TOKEN"],
        ),
        entry(
            "whatsapp.app_secret",
            redact_secret(config.whatsapp.app_secret.as_ref()),
            &["VENDAFLOW_WHATSAPP_APP_SECRET"],
        ),
        entry(
            "whatsapp.graph_base_url",
            config.whatsapp.graph_base_url.clone(),
            &["VENDAFLOW_WHATSAPP_GRAPH_BASE_URL"],
        ),
        entry(
            "whatsapp.api_version",
            config.whatsapp.api_version.clone(),
            &["VENDAFLOW_WHATSAPP_API_VERSION"],
        ),
        entry("llm.model", config.llm.model.clone(), &["VENDAFLOW_LLM_MODEL"]),
        entry("llm.base_url", config.llm.base_url.clone(), &["VENDAFLOW_LLM_BASE_URL"]),
        entry(
            "llm.api_key",
            redact_secret(config.llm.api_key.as_ref()),
            &["VENDAFLOW_LLM_API_KEY", "GEMINI_API_KEY"],
        ),
        entry("llm.timeout_secs", config.llm.timeout_secs.to_string(), &["VENDAFLOW_LLM_TIMEOUT_SECS"]),
        entry(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["VENDAFLOW_SERVER_BIND_ADDRESS"],
        ),
        entry("server.port", config.server.port.to_string(), &["VENDAFLOW_SERVER_PORT", "PORT"]),
        entry(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["VENDAFLOW_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        entry("bridge.enabled", config.bridge.enabled.to_string(), &["VENDAFLOW_BRIDGE_ENABLED"]),
        entry(
            "bridge.command",
            if config.bridge.command.is_empty() {
                "<unset>".to_string()
            } else {
                config.bridge.command.join(" ")
            },
            &["VENDAFLOW_BRIDGE_COMMAND"],
        ),
        entry(
            "bridge.max_retries",
            config.bridge.max_retries.to_string(),
            &["VENDAFLOW_BRIDGE_MAX_RETRIES"],
        ),
        entry(
            "engine.history_window",
            config.engine.history_window.to_string(),
            &["VENDAFLOW_ENGINE_HISTORY_WINDOW"],
        ),
        entry(
            "engine.business_name",
            config.engine.business_name.clone(),
            &["VENDAFLOW_ENGINE_BUSINESS_NAME"],
        ),
        entry("engine.bot_name", config.engine.bot_name.clone(), &["VENDAFLOW_ENGINE_BOT_NAME"]),
        entry(
            "engine.contact_phone",
            config.engine.contact_phone.clone(),
            &["VENDAFLOW_ENGINE_CONTACT_PHONE"],
        ),
        entry(
            "engine.default_margin_pct",
            config.engine.default_margin_pct.to_string(),
            &["VENDAFLOW_ENGINE_DEFAULT_MARGIN_PCT"],
        ),
        entry(
            "logging.level",
            config.logging.level.clone(),
            &["VENDAFLOW_LOGGING_LEVEL", "VENDAFLOW_LOG_LEVEL"],
        ),
        entry(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["VENDAFLOW_LOGGING_FORMAT", "VENDAFLOW_LOG_FORMAT"],
        ),
    ]
}

fn entry(
    key_path: &'static str,
    value: String,
    env_keys: &'static [&'static str],
) -> (&'static str, String, &'static [&'static str]) {
    (key_path, value, env_keys)
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("vendaflow.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/vendaflow.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps at most a four-character prefix of a secret.
fn redact_secret(secret: Option<&SecretString>) -> String {
    let Some(secret) = secret else {
        return "<unset>".to_string();
    };
    let trimmed = secret.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    if trimmed.chars().count() <= 8 {
        return "<redacted>".to_string();
    }

    let prefix: String = trimmed.chars().take(4).collect();
    format!("{prefix}***")
}
