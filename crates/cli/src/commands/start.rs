use std::sync::Arc;

use vendaflow_core::config::AppConfig;
use vendaflow_core::domain::settings::keys;
use vendaflow_db::repositories::SqlSettingsRepository;
use vendaflow_db::SettingsStore;

use crate::commands::{open_migrated, prepare, CommandResult};

/// Preflight for `vendaflow-server`: config, database and migrations, then
/// which transports have what they need.
pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("start") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_migrated(&config).await?;
        let settings = SettingsStore::new(Arc::new(SqlSettingsRepository::new(pool.clone())))
            .with_defaults(config.credential_defaults());

        let mut missing = Vec::new();
        for key in [
            keys::WHATSAPP_PHONE_NUMBER_ID,
            keys::WHATSAPP_ACCESS_TOKEN,
            keys::WHATSAPP_VERIFY_TOKEN,
            keys::GEMINI_API_KEY,
        ] {
            let present = settings
                .text(key)
                .await
                .map_err(|error| ("settings_lookup", error.to_string(), 6u8))?
                .is_some();
            if !present {
                missing.push(key);
            }
        }

        pool.close().await;
        Ok::<Vec<&'static str>, (&'static str, String, u8)>(missing)
    });

    match result {
        Ok(missing) => CommandResult::success("start", preflight_message(&config, &missing)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("start", error_class, message, exit_code)
        }
    }
}

fn preflight_message(config: &AppConfig, missing: &[&str]) -> String {
    let bridge = if config.bridge.enabled { "enabled" } else { "disabled" };
    let mut message = format!(
        "preflight passed; server will listen on {}:{} (whatsapp bridge {bridge})",
        config.server.bind_address, config.server.port
    );
    if !missing.is_empty() {
        message.push_str(&format!("; unset credentials: {}", missing.join(", ")));
    }
    message
}
