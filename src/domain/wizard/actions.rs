use super::records::{CustomerPatch, InsurancePatch};
use super::value_objects::{CareLevel, GlovesSize, WizardStep};

// ============================================================================
// Wizard Actions - the closed set of store transitions
// ============================================================================
//
// Actions are facts the store applies without question. Whether an action
// may be issued at all is decided beforehand by the command handler and the
// step gate.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum WizardAction {
    SetStep(WizardStep),
    SetQuantity {
        product_id: String,
        quantity: u32,
    },
    SetGlovesSize(Option<GlovesSize>),
    SetCareLevel(CareLevel),
    /// Caller clamps to `0..=EXTRA_ALLOWANCE_MAX`
    SetExtraAllowance(u8),
    MergeCustomer(CustomerPatch),
    MergeInsurance(InsurancePatch),
    RecordOrderId(String),
    Reset,
}

impl WizardAction {
    pub fn kind(&self) -> &'static str {
        match self {
            WizardAction::SetStep(_) => "set_step",
            WizardAction::SetQuantity { .. } => "set_quantity",
            WizardAction::SetGlovesSize(_) => "set_gloves_size",
            WizardAction::SetCareLevel(_) => "set_care_level",
            WizardAction::SetExtraAllowance(_) => "set_extra_allowance",
            WizardAction::MergeCustomer(_) => "merge_customer",
            WizardAction::MergeInsurance(_) => "merge_insurance",
            WizardAction::RecordOrderId(_) => "record_order_id",
            WizardAction::Reset => "reset",
        }
    }
}
