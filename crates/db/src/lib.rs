pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;
pub mod settings_store;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{CatalogSeed, SeedResult, VerificationCheck, VerificationResult};
pub use settings_store::SettingsStore;
