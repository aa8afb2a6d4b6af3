use super::records::{CustomerPatch, InsurancePatch};
use super::value_objects::{CareLevel, GlovesSize};

// ============================================================================
// Wizard Commands - Represent user intent
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum WizardCommand {
    /// Move to the next step if the current step's gate holds
    Advance,
    /// Move to the previous step
    Back,
    IncreaseQuantity {
        product_id: String,
    },
    DecreaseQuantity {
        product_id: String,
    },
    /// Jump straight to a quantity (draft import); admitted only within budget
    SetQuantity {
        product_id: String,
        quantity: u32,
    },
    SelectGlovesSize(GlovesSize),
    SelectCareLevel(CareLevel),
    IncreaseExtraAllowance,
    DecreaseExtraAllowance,
    UpdateCustomer(CustomerPatch),
    UpdateInsurance(InsurancePatch),
    Reset,
}
