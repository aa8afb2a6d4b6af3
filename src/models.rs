use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::domain::budget;
use crate::domain::wizard::WizardState;

// ============================================================================
// Wire Models - order submission payload and backend responses
// ============================================================================
//
// Field names are the backend's German names and must not change.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderPayload {
    pub products: Vec<ProductLinePayload>,
    pub customer: CustomerPayload,
    pub insurance: InsurancePayload,
    /// Zero-cost extra, kept out of the product list and the budget
    pub extra_washable: u8,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProductLinePayload {
    pub product_id: String,
    pub quantity: u32,
    pub size: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CustomerPayload {
    pub pflegegrad: String,
    pub anrede: String,
    pub titel: String,
    pub vorname: String,
    pub nachname: String,
    pub strasse: String,
    pub hausnr: String,
    pub adresszusatz: String,
    pub plz: String,
    pub stadt: String,
    /// Literal `DD.MM.YYYY`
    pub geburtsdatum: String,
    pub abweichende_adresse: String,
    pub hinweis: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct InsurancePayload {
    pub versicherungsart: String,
    pub beihilfe: bool,
    pub beihilfe_prozent: String,
    pub krankenkasse: String,
    pub versichertennummer: String,
    pub telefon: String,
    pub email: String,
    pub bezieht_bereits: bool,
    pub bemerkung: String,
    pub consent1: bool,
    pub consent2: bool,
    pub signature_insured: String,
    pub signature_care: String,
}

impl OrderPayload {
    /// Reshape wizard state into the submission format.
    pub fn from_state(state: &WizardState, catalog: &Catalog) -> Self {
        let products = budget::projection(&state.selection, state.gloves_size, catalog)
            .into_iter()
            .map(|line| ProductLinePayload {
                product_id: line.product_id,
                quantity: line.quantity,
                size: line.size.map(|size| size.as_str().to_string()),
            })
            .collect();

        let customer = &state.customer;
        let insurance = &state.insurance;

        Self {
            products,
            customer: CustomerPayload {
                pflegegrad: state
                    .care_level
                    .map(|level| level.as_str().to_string())
                    .unwrap_or_default(),
                anrede: customer
                    .salutation
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default(),
                titel: customer.title.trim().to_string(),
                vorname: customer.first_name.trim().to_string(),
                nachname: customer.last_name.trim().to_string(),
                strasse: customer.street.trim().to_string(),
                hausnr: customer.house_number.trim().to_string(),
                adresszusatz: customer.address_addendum.trim().to_string(),
                plz: customer.postal_code.trim().to_string(),
                stadt: customer.city.trim().to_string(),
                geburtsdatum: customer.birth_date.trim().to_string(),
                abweichende_adresse: customer.alternate_address.trim().to_string(),
                hinweis: customer.note.trim().to_string(),
            },
            insurance: InsurancePayload {
                versicherungsart: insurance.insurance_type.as_str().to_string(),
                beihilfe: insurance.subsidy_eligible,
                beihilfe_prozent: insurance
                    .subsidy_percent
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default(),
                krankenkasse: insurance.provider.trim().to_string(),
                versichertennummer: insurance.policy_number.trim().to_string(),
                telefon: insurance.phone.trim().to_string(),
                email: insurance.email.trim().to_string(),
                bezieht_bereits: insurance.already_receiving,
                bemerkung: insurance.remark.trim().to_string(),
                consent1: insurance.consent_cost_coverage,
                consent2: insurance.consent_provider_billing,
                signature_insured: insurance
                    .signature_insured
                    .as_ref()
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default(),
                signature_care: insurance
                    .signature_caregiver
                    .as_ref()
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default(),
            },
            extra_washable: state.extra_allowance,
        }
    }
}

/// Successful order creation; only the id is of interest.
#[derive(Deserialize, Clone, Debug)]
pub struct OrderCreatedResponse {
    pub id: String,
}

/// Error body the backend sends with non-2xx responses.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct ErrorResponse {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Human-readable detail; validation errors arrive as structured JSON.
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            serde_json::Value::String(_) | serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
