use async_trait::async_trait;
use thiserror::Error;

use vendaflow_core::domain::analysis::AnalysisRecord;
use vendaflow_core::domain::lead::{Lead, LeadId};
use vendaflow_core::domain::product::Product;
use vendaflow_core::domain::settings::Setting;

pub mod analysis;
pub mod lead;
pub mod memory;
pub mod product;
pub mod settings;

pub use analysis::SqlAnalysisRepository;
pub use lead::SqlLeadRepository;
pub use memory::{
    InMemoryAnalysisRepository, InMemoryLeadRepository, InMemoryProductRepository,
    InMemorySettingsRepository,
};
pub use product::SqlProductRepository;
pub use settings::SqlSettingsRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Lead store. One lead per phone number; history is append-only.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<Lead>, RepositoryError>;
    async fn find_by_id(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError>;
    async fn save(&self, lead: Lead) -> Result<(), RepositoryError>;
    async fn list_recent(&self, limit: u32) -> Result<Vec<Lead>, RepositoryError>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Featured products in catalog order.
    async fn list_featured(&self, limit: u32) -> Result<Vec<Product>, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError>;
    async fn save(&self, product: Product) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Setting>, RepositoryError>;
    async fn upsert(&self, setting: Setting) -> Result<(), RepositoryError>;
    async fn list(&self) -> Result<Vec<Setting>, RepositoryError>;
}

#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    async fn record(&self, record: AnalysisRecord) -> Result<(), RepositoryError>;
    async fn list_for_lead(&self, lead_id: &LeadId)
        -> Result<Vec<AnalysisRecord>, RepositoryError>;
}

pub(crate) fn decode_err(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

pub(crate) fn parse_timestamp(
    raw: &str,
) -> Result<chrono::DateTime<chrono::Utc>, RepositoryError> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid timestamp `{raw}`: {e}")))
}
