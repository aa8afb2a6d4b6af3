use serde::{Deserialize, Serialize};

use super::value_objects::{InsuranceType, Salutation, Signature, SubsidyPercent};

// ============================================================================
// Customer & Insurance Records - form data captured on steps 2 and 3
// ============================================================================

/// Delivery address and identity of the insured person.
///
/// Text fields hold exactly what was typed; blank checks trim at the gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub salutation: Option<Salutation>,
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub house_number: String,
    pub address_addendum: String,
    pub postal_code: String,
    pub city: String,
    /// `DD.MM.YYYY` as entered
    pub birth_date: String,
    pub alternate_address: String,
    pub note: String,
}

/// Field-level patch for [`CustomerRecord`]; `None` keeps the old value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerPatch {
    pub salutation: Option<Option<Salutation>>,
    pub title: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub address_addendum: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub birth_date: Option<String>,
    pub alternate_address: Option<String>,
    pub note: Option<String>,
}

impl CustomerPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl CustomerRecord {
    /// Shallow merge: every field the patch carries replaces ours.
    pub fn merged(&self, patch: &CustomerPatch) -> Self {
        Self {
            salutation: patch.salutation.unwrap_or(self.salutation),
            title: pick(&patch.title, &self.title),
            first_name: pick(&patch.first_name, &self.first_name),
            last_name: pick(&patch.last_name, &self.last_name),
            street: pick(&patch.street, &self.street),
            house_number: pick(&patch.house_number, &self.house_number),
            address_addendum: pick(&patch.address_addendum, &self.address_addendum),
            postal_code: pick(&patch.postal_code, &self.postal_code),
            city: pick(&patch.city, &self.city),
            birth_date: pick(&patch.birth_date, &self.birth_date),
            alternate_address: pick(&patch.alternate_address, &self.alternate_address),
            note: pick(&patch.note, &self.note),
        }
    }
}

/// Insurance details, consents and signatures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceRecord {
    pub insurance_type: InsuranceType,
    pub subsidy_eligible: bool,
    pub subsidy_percent: Option<SubsidyPercent>,
    pub provider: String,
    pub policy_number: String,
    pub phone: String,
    pub email: String,
    pub already_receiving: bool,
    pub remark: String,
    /// Cost-coverage request for consumable care aids
    pub consent_cost_coverage: bool,
    /// Provider assignment and forwarding of billing data
    pub consent_provider_billing: bool,
    pub signature_insured: Option<Signature>,
    pub signature_caregiver: Option<Signature>,
}

/// Field-level patch for [`InsuranceRecord`]; `None` keeps the old value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsurancePatch {
    pub insurance_type: Option<InsuranceType>,
    pub subsidy_eligible: Option<bool>,
    pub subsidy_percent: Option<Option<SubsidyPercent>>,
    pub provider: Option<String>,
    pub policy_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub already_receiving: Option<bool>,
    pub remark: Option<String>,
    pub consent_cost_coverage: Option<bool>,
    pub consent_provider_billing: Option<bool>,
    pub signature_insured: Option<Option<Signature>>,
    pub signature_caregiver: Option<Option<Signature>>,
}

impl InsurancePatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl InsuranceRecord {
    /// Shallow merge: every field the patch carries replaces ours.
    pub fn merged(&self, patch: &InsurancePatch) -> Self {
        Self {
            insurance_type: patch.insurance_type.unwrap_or(self.insurance_type),
            subsidy_eligible: patch.subsidy_eligible.unwrap_or(self.subsidy_eligible),
            subsidy_percent: patch.subsidy_percent.unwrap_or(self.subsidy_percent),
            provider: pick(&patch.provider, &self.provider),
            policy_number: pick(&patch.policy_number, &self.policy_number),
            phone: pick(&patch.phone, &self.phone),
            email: pick(&patch.email, &self.email),
            already_receiving: patch.already_receiving.unwrap_or(self.already_receiving),
            remark: pick(&patch.remark, &self.remark),
            consent_cost_coverage: patch
                .consent_cost_coverage
                .unwrap_or(self.consent_cost_coverage),
            consent_provider_billing: patch
                .consent_provider_billing
                .unwrap_or(self.consent_provider_billing),
            signature_insured: patch
                .signature_insured
                .clone()
                .unwrap_or_else(|| self.signature_insured.clone()),
            signature_caregiver: patch
                .signature_caregiver
                .clone()
                .unwrap_or_else(|| self.signature_caregiver.clone()),
        }
    }
}

fn pick(patched: &Option<String>, current: &str) -> String {
    patched.as_deref().unwrap_or(current).to_string()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_merge_keeps_unpatched_fields() {
        let record = CustomerRecord {
            first_name: "Anna".to_string(),
            city: "Berlin".to_string(),
            ..Default::default()
        };

        let merged = record.merged(&CustomerPatch {
            city: Some("Hamburg".to_string()),
            salutation: Some(Some(Salutation::Ms)),
            ..Default::default()
        });

        assert_eq!(merged.first_name, "Anna");
        assert_eq!(merged.city, "Hamburg");
        assert_eq!(merged.salutation, Some(Salutation::Ms));
        // the source record is untouched
        assert_eq!(record.city, "Berlin");
    }

    #[test]
    fn test_insurance_merge_can_clear_optional_values() {
        let record = InsuranceRecord {
            subsidy_eligible: true,
            subsidy_percent: Some(SubsidyPercent::Seventy),
            signature_caregiver: Some(Signature::from_encoded("data:image/png;base64,AAAA")),
            ..Default::default()
        };

        let merged = record.merged(&InsurancePatch {
            subsidy_percent: Some(None),
            signature_caregiver: Some(None),
            ..Default::default()
        });

        assert!(merged.subsidy_eligible);
        assert!(merged.subsidy_percent.is_none());
        assert!(merged.signature_caregiver.is_none());
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let record = InsuranceRecord {
            provider: "AOK".to_string(),
            consent_cost_coverage: true,
            ..Default::default()
        };

        assert!(InsurancePatch::default().is_empty());
        assert_eq!(record.merged(&InsurancePatch::default()), record);
        assert!(CustomerPatch::default().is_empty());
    }

    #[test]
    fn test_patch_deserializes_partial_json() {
        let patch: CustomerPatch =
            serde_json::from_str(r#"{"first_name": "Anna", "salutation": "Frau"}"#).unwrap();

        assert_eq!(patch.first_name.as_deref(), Some("Anna"));
        assert_eq!(patch.salutation, Some(Some(Salutation::Ms)));
        assert!(patch.last_name.is_none());
    }
}
