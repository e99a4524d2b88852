pub mod config;
pub mod delivery;
pub mod domain;
pub mod errors;
pub mod flows;

pub use delivery::{MessageSender, RecordingSender, SentMessage};
pub use domain::analysis::{AnalysisId, AnalysisKind, AnalysisRecord};
pub use domain::lead::{Author, HistoryEntry, Lead, LeadId};
pub use domain::product::{Product, ProductId};
pub use domain::settings::{Setting, SettingValue};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{FlowContext, FlowEngine, FlowOutcome, LeadStage, OperatingMode, ProfileUpdate};
