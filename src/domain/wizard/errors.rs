use rust_decimal::Decimal;

use crate::domain::gate::GateReport;
use super::value_objects::WizardStep;

// ============================================================================
// Wizard Business Rule Errors
// ============================================================================
//
// These are refusals, not failures: the store was left untouched and the
// caller is expected to show what needs correcting.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WizardError {
    #[error("{0}")]
    StepIncomplete(GateReport),

    #[error("Unknown catalog id: {0}")]
    UnknownProduct(String),

    #[error("Selecting {product_id} would exceed the budget ({projected} > {limit})")]
    BudgetExceeded {
        product_id: String,
        projected: Decimal,
        limit: Decimal,
    },

    #[error("Gloves size can only be chosen while gloves are selected")]
    GlovesNotSelected,

    #[error("Order {0} has been placed; the wizard is read-only")]
    OrderLocked(String),

    #[error("There is no step after {0}")]
    NoNextStep(WizardStep),

    #[error("There is no step before {0}")]
    NoPreviousStep(WizardStep),

    #[error("Orders can only be submitted from the summary step (currently on {0})")]
    NotOnSummary(WizardStep),

    #[error("Quantity of {product_id} cannot go any higher")]
    QuantityLimit { product_id: String },

    #[error("Submission controller still holds order {order_id}; reset it together with the wizard")]
    StaleSubmission { order_id: String },
}

impl WizardError {
    /// Per-field diagnostics when the refusal came from a step gate.
    pub fn gate_report(&self) -> Option<&GateReport> {
        match self {
            WizardError::StepIncomplete(report) => Some(report),
            _ => None,
        }
    }
}
