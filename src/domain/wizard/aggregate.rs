use serde::{Deserialize, Serialize};

use crate::catalog::GLOVES_ID;
use crate::state_machine::Reducer;
use super::actions::WizardAction;
use super::records::{CustomerRecord, InsuranceRecord};
use super::value_objects::{CareLevel, GlovesSize, Selection, WizardStep};

// ============================================================================
// Wizard State - aggregate root of one configuration session
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    // Navigation
    pub current_step: WizardStep,

    // Product configuration (step 1)
    pub selection: Selection,
    pub gloves_size: Option<GlovesSize>,
    pub care_level: Option<CareLevel>,
    /// Zero-cost add-on; never part of the budget
    pub extra_allowance: u8,

    // Form data (steps 2 and 3)
    pub customer: CustomerRecord,
    pub insurance: InsuranceRecord,

    // Set once by a successful submission
    pub order_id: Option<String>,
}

impl WizardState {
    pub fn is_complete(&self) -> bool {
        self.order_id.is_some()
    }

    pub fn gloves_quantity(&self) -> u32 {
        self.selection.quantity(GLOVES_ID)
    }
}

// ============================================================================
// Reducer Trait Implementation
// ============================================================================

impl Reducer for WizardState {
    type Action = WizardAction;

    fn initial() -> Self {
        Self::default()
    }

    fn apply(&self, action: &Self::Action) -> Self {
        match action {
            WizardAction::SetStep(step) => Self {
                current_step: *step,
                ..self.clone()
            },

            WizardAction::SetQuantity { product_id, quantity } => {
                // gloves without a quantity cannot keep a size
                let gloves_size = if product_id == GLOVES_ID && *quantity == 0 {
                    None
                } else {
                    self.gloves_size
                };

                Self {
                    selection: self.selection.with_quantity(product_id, *quantity),
                    gloves_size,
                    ..self.clone()
                }
            }

            WizardAction::SetGlovesSize(size) => Self {
                gloves_size: *size,
                ..self.clone()
            },

            WizardAction::SetCareLevel(level) => Self {
                care_level: Some(*level),
                ..self.clone()
            },

            WizardAction::SetExtraAllowance(count) => Self {
                extra_allowance: *count,
                ..self.clone()
            },

            WizardAction::MergeCustomer(patch) => Self {
                customer: self.customer.merged(patch),
                ..self.clone()
            },

            WizardAction::MergeInsurance(patch) => Self {
                insurance: self.insurance.merged(patch),
                ..self.clone()
            },

            WizardAction::RecordOrderId(order_id) => Self {
                order_id: Some(order_id.clone()),
                ..self.clone()
            },

            WizardAction::Reset => Self::initial(),
        }
    }

    fn action_kind(action: &Self::Action) -> &'static str {
        action.kind()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
