use crate::flows::measurement::{parse_measurement, BudgetSummary};
use crate::flows::replies;
use crate::flows::states::{FlowContext, FlowOutcome, LeadStage, ProfileUpdate};

pub const RESET_KEYWORDS: [&str; 7] = ["menu", "oi", "olá", "ola", "inicio", "início", "restart"];
pub const SKIP_EMAIL_KEYWORD: &str = "pular";
pub const FEATURED_PRODUCT_LIMIT: usize = 3;
pub const DEFAULT_MARGIN_PCT: u32 = 10;

pub fn normalize_input(text: &str) -> String {
    text.trim().to_lowercase()
}

pub fn is_reset_keyword(text: &str) -> bool {
    let normalized = normalize_input(text);
    RESET_KEYWORDS.contains(&normalized.as_str())
}

pub trait FlowDefinition {
    fn initial_stage(&self) -> LeadStage;
    fn transition(&self, current: &LeadStage, text: &str, context: &FlowContext) -> FlowOutcome;
}

/// The scripted greeting, profile capture, catalog and measurement flow.
#[derive(Clone, Debug, Default)]
pub struct SalesFlow;

impl FlowDefinition for SalesFlow {
    fn initial_stage(&self) -> LeadStage {
        LeadStage::Welcome
    }

    fn transition(&self, current: &LeadStage, text: &str, context: &FlowContext) -> FlowOutcome {
        transition_sales(current, text, context)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_stage(&self) -> LeadStage {
        self.flow.initial_stage()
    }

    /// Stage the inbound text is dispatched from once reset keywords apply.
    pub fn entry_stage(&self, current: &LeadStage, text: &str) -> LeadStage {
        if is_reset_keyword(text) {
            self.flow.initial_stage()
        } else {
            current.clone()
        }
    }

    pub fn apply(&self, current: &LeadStage, text: &str, context: &FlowContext) -> FlowOutcome {
        let entry = self.entry_stage(current, text);
        let mut outcome = self.flow.transition(&entry, text, context);
        outcome.from = current.clone();
        outcome
    }
}

impl Default for FlowEngine<SalesFlow> {
    fn default() -> Self {
        Self::new(SalesFlow)
    }
}

fn transition_sales(current: &LeadStage, text: &str, context: &FlowContext) -> FlowOutcome {
    let mut profile_update = None;

    let (to, replies) = match current {
        LeadStage::Welcome => (
            LeadStage::WaitingName,
            vec![replies::greeting(&context.business_name), replies::ask_name(&context.bot_name)],
        ),
        LeadStage::WaitingName => {
            let name = text.trim().to_string();
            let replies = vec![replies::thank_name(&name), replies::ask_email()];
            profile_update = Some(ProfileUpdate::Name(name));
            (LeadStage::WaitingEmail, replies)
        }
        LeadStage::WaitingEmail => {
            if normalize_input(text) != SKIP_EMAIL_KEYWORD {
                profile_update = Some(ProfileUpdate::Email(text.trim().to_string()));
            }
            (LeadStage::ShowingCategories, vec![replies::category_menu()])
        }
        LeadStage::ShowingCategories => {
            let featured: Vec<_> =
                context.featured_products.iter().take(FEATURED_PRODUCT_LIMIT).cloned().collect();
            if featured.is_empty() {
                (LeadStage::WaitingName, vec![replies::empty_catalog(&context.contact_phone)])
            } else {
                (LeadStage::Browsing, vec![replies::featured_catalog(&featured)])
            }
        }
        LeadStage::Browsing => (
            LeadStage::WaitingMeasurement,
            vec![replies::ask_measurement(context.margin_pct)],
        ),
        LeadStage::WaitingMeasurement => {
            match parse_measurement(text) {
                Some(area) => {
                    let summary = BudgetSummary::compute(area, context.margin_pct);
                    (LeadStage::Done, vec![replies::budget_summary(&summary)])
                }
                None => (LeadStage::WaitingMeasurement, vec![replies::invalid_measurement()]),
            }
        }
        LeadStage::Done | LeadStage::Unrecognized(_) => {
            (LeadStage::ShowingCategories, vec![replies::reengage()])
        }
    };

    FlowOutcome { from: current.clone(), to, replies, profile_update }
}
