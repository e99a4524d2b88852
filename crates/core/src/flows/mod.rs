pub mod engine;
pub mod measurement;
pub mod replies;
pub mod states;

pub use engine::{
    is_reset_keyword, normalize_input, FlowDefinition, FlowEngine, SalesFlow, DEFAULT_MARGIN_PCT,
    FEATURED_PRODUCT_LIMIT,
};
pub use measurement::{parse_measurement, BudgetSummary};
pub use states::{FlowContext, FlowOutcome, LeadStage, OperatingMode, ProfileUpdate};
