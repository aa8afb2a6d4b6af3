use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::domain::budget;
use crate::domain::wizard::{
    is_valid_postal_code, parse_birth_date, CustomerRecord, InsuranceRecord, WizardState, WizardStep,
};

// ============================================================================
// Step Gate - admission control for forward navigation
// ============================================================================
//
// Each step has one predicate that must hold before the wizard may move on.
// A failed gate is not an error: it yields a report listing every field that
// needs attention, so each can be corrected independently.
//
// ============================================================================

/// Form fields a gate can complain about, named as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FormField {
    CareLevel,
    Budget,
    GlovesSize,
    Salutation,
    FirstName,
    LastName,
    Street,
    HouseNumber,
    PostalCode,
    City,
    BirthDate,
    Provider,
    PolicyNumber,
    SubsidyPercent,
    ConsentCostCoverage,
    ConsentProviderBilling,
    SignatureInsured,
}

impl FormField {
    pub fn as_str(self) -> &'static str {
        match self {
            FormField::CareLevel => "pflegegrad",
            FormField::Budget => "budget",
            FormField::GlovesSize => "gloves_size",
            FormField::Salutation => "anrede",
            FormField::FirstName => "vorname",
            FormField::LastName => "nachname",
            FormField::Street => "strasse",
            FormField::HouseNumber => "hausnr",
            FormField::PostalCode => "plz",
            FormField::City => "stadt",
            FormField::BirthDate => "geburtsdatum",
            FormField::Provider => "krankenkasse",
            FormField::PolicyNumber => "versichertennummer",
            FormField::SubsidyPercent => "beihilfe_prozent",
            FormField::ConsentCostCoverage => "consent1",
            FormField::ConsentProviderBilling => "consent2",
            FormField::SignatureInsured => "signature_insured",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateViolation {
    #[error("a care level must be selected")]
    CareLevelMissing,

    #[error("selection total {total} exceeds the budget of {limit}")]
    OverBudget { total: Decimal, limit: Decimal },

    #[error("a gloves size (S-XL) must be chosen")]
    GlovesSizeMissing,

    #[error("{0} is required")]
    Required(FormField),

    #[error("birth date must be a real date in the form DD.MM.YYYY")]
    InvalidBirthDate,

    #[error("postal code must be exactly 5 digits")]
    InvalidPostalCode,

    #[error("a subsidy percentage must be chosen")]
    SubsidyPercentMissing,

    #[error("{0} must be confirmed")]
    ConsentMissing(FormField),

    #[error("the insured person's signature is required")]
    SignatureMissing,
}

impl GateViolation {
    /// Field the diagnostic belongs to.
    pub fn field(&self) -> FormField {
        match self {
            GateViolation::CareLevelMissing => FormField::CareLevel,
            GateViolation::OverBudget { .. } => FormField::Budget,
            GateViolation::GlovesSizeMissing => FormField::GlovesSize,
            GateViolation::Required(field) | GateViolation::ConsentMissing(field) => *field,
            GateViolation::InvalidBirthDate => FormField::BirthDate,
            GateViolation::InvalidPostalCode => FormField::PostalCode,
            GateViolation::SubsidyPercentMissing => FormField::SubsidyPercent,
            GateViolation::SignatureMissing => FormField::SignatureInsured,
        }
    }
}

/// Outcome of evaluating one step's gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateReport {
    pub step: WizardStep,
    pub violations: Vec<GateViolation>,
}

impl GateReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violation_for(&self, field: FormField) -> Option<&GateViolation> {
        self.violations.iter().find(|v| v.field() == field)
    }

    pub fn fields(&self) -> Vec<FormField> {
        self.violations.iter().map(GateViolation::field).collect()
    }
}

impl fmt::Display for GateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            return write!(f, "step {} is complete", self.step);
        }
        write!(f, "step {} is incomplete: ", self.step)?;
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", violation.field(), violation)?;
        }
        Ok(())
    }
}

/// Evaluate the gate guarding the way out of `step`.
pub fn check_step(step: WizardStep, state: &WizardState, catalog: &Catalog, limit: Decimal) -> GateReport {
    let violations = match step {
        WizardStep::Products => check_products(state, catalog, limit),
        WizardStep::Delivery => check_delivery(&state.customer),
        WizardStep::Insurance => check_insurance(&state.insurance),
        // submission is gated by the controller, not here
        WizardStep::Summary => Vec::new(),
    };

    GateReport { step, violations }
}

/// Backward navigation is free until an order exists.
pub fn can_retreat(state: &WizardState) -> bool {
    state.current_step.previous().is_some() && !state.is_complete()
}

fn check_products(state: &WizardState, catalog: &Catalog, limit: Decimal) -> Vec<GateViolation> {
    let mut violations = Vec::new();

    if state.care_level.is_none() {
        violations.push(GateViolation::CareLevelMissing);
    }

    let total = budget::total(&state.selection, catalog);
    if total > limit {
        violations.push(GateViolation::OverBudget { total, limit });
    }

    if state.gloves_quantity() > 0 && state.gloves_size.is_none() {
        violations.push(GateViolation::GlovesSizeMissing);
    }

    violations
}

fn check_delivery(customer: &CustomerRecord) -> Vec<GateViolation> {
    let mut violations = Vec::new();

    if customer.salutation.is_none() {
        violations.push(GateViolation::Required(FormField::Salutation));
    }

    let required = [
        (FormField::FirstName, &customer.first_name),
        (FormField::LastName, &customer.last_name),
        (FormField::Street, &customer.street),
        (FormField::HouseNumber, &customer.house_number),
    ];
    violations.extend(
        required
            .into_iter()
            .filter(|(_, value)| is_blank(value))
            .map(|(field, _)| GateViolation::Required(field)),
    );

    if is_blank(&customer.postal_code) {
        violations.push(GateViolation::Required(FormField::PostalCode));
    } else if !is_valid_postal_code(&customer.postal_code) {
        violations.push(GateViolation::InvalidPostalCode);
    }

    if is_blank(&customer.city) {
        violations.push(GateViolation::Required(FormField::City));
    }

    if is_blank(&customer.birth_date) {
        violations.push(GateViolation::Required(FormField::BirthDate));
    } else if parse_birth_date(&customer.birth_date).is_none() {
        violations.push(GateViolation::InvalidBirthDate);
    }

    violations
}

fn check_insurance(insurance: &InsuranceRecord) -> Vec<GateViolation> {
    let mut violations = Vec::new();

    if is_blank(&insurance.provider) {
        violations.push(GateViolation::Required(FormField::Provider));
    }
    if is_blank(&insurance.policy_number) {
        violations.push(GateViolation::Required(FormField::PolicyNumber));
    }
    if insurance.subsidy_eligible && insurance.subsidy_percent.is_none() {
        violations.push(GateViolation::SubsidyPercentMissing);
    }
    if !insurance.consent_cost_coverage {
        violations.push(GateViolation::ConsentMissing(FormField::ConsentCostCoverage));
    }
    if !insurance.consent_provider_billing {
        violations.push(GateViolation::ConsentMissing(FormField::ConsentProviderBilling));
    }
    if !insurance.signature_insured.as_ref().is_some_and(|s| s.is_present()) {
        violations.push(GateViolation::SignatureMissing);
    }

    violations
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogItem, GLOVES_ID};
    use crate::domain::budget::DEFAULT_BUDGET_LIMIT;
    use crate::domain::wizard::{
        CareLevel, GlovesSize, Salutation, Signature, SubsidyPercent, WizardAction,
    };
    use crate::state_machine::Reducer;
    use std::str::FromStr;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            CatalogItem::new("aprons", "Schutzschürzen", "Einmalgebrauch", Decimal::from_str("12.50").unwrap()),
            CatalogItem::new(GLOVES_ID, "Einmalhandschuhe", "100 Stk", Decimal::from_str("9.00").unwrap()),
        ])
        .unwrap()
    }

    fn products_ok() -> WizardState {
        WizardState::replay(&[
            WizardAction::SetCareLevel(CareLevel::Three),
            WizardAction::SetQuantity { product_id: "aprons".to_string(), quantity: 2 },
        ])
    }

    fn valid_customer() -> CustomerRecord {
        CustomerRecord {
            salutation: Some(Salutation::Ms),
            first_name: "Anna".to_string(),
            last_name: "Schmidt".to_string(),
            street: "Lindenstraße".to_string(),
            house_number: "12a".to_string(),
            postal_code: "10115".to_string(),
            city: "Berlin".to_string(),
            birth_date: "29.02.1944".to_string(),
            ..Default::default()
        }
    }

    fn valid_insurance() -> InsuranceRecord {
        InsuranceRecord {
            provider: "AOK Nordost".to_string(),
            policy_number: "A123456789".to_string(),
            consent_cost_coverage: true,
            consent_provider_billing: true,
            signature_insured: Some(Signature::from_png(&[1, 2, 3])),
            ..Default::default()
        }
    }

    fn products_gate(state: &WizardState) -> GateReport {
        check_step(WizardStep::Products, state, &catalog(), DEFAULT_BUDGET_LIMIT)
    }

    #[test]
    fn test_products_gate_passes() {
        assert!(products_gate(&products_ok()).passed());
    }

    #[test]
    fn test_products_gate_fails_without_care_level() {
        let state = WizardState {
            care_level: None,
            ..products_ok()
        };
        let report = products_gate(&state);

        assert_eq!(report.violations, vec![GateViolation::CareLevelMissing]);
    }

    #[test]
    fn test_products_gate_fails_without_gloves_size() {
        let state = products_ok().apply(&WizardAction::SetQuantity {
            product_id: GLOVES_ID.to_string(),
            quantity: 1,
        });
        let report = products_gate(&state);
        assert_eq!(report.violations, vec![GateViolation::GlovesSizeMissing]);

        let sized = state.apply(&WizardAction::SetGlovesSize(Some(GlovesSize::S)));
        assert!(products_gate(&sized).passed());
    }

    #[test]
    fn test_products_gate_fails_over_budget() {
        let state = products_ok().apply(&WizardAction::SetQuantity {
            product_id: "aprons".to_string(),
            quantity: 4,
        });
        let report = products_gate(&state);

        assert_eq!(report.fields(), vec![FormField::Budget]);
        assert!(matches!(
            report.violations[0],
            GateViolation::OverBudget { total, .. } if total == Decimal::from(50)
        ));
    }

    #[test]
    fn test_products_gate_ignores_extra_allowance() {
        let state = products_ok().apply(&WizardAction::SetExtraAllowance(4));
        assert!(products_gate(&state).passed());
    }

    #[test]
    fn test_delivery_gate_lists_every_missing_field() {
        let state = WizardState::initial();
        let report = check_step(WizardStep::Delivery, &state, &catalog(), DEFAULT_BUDGET_LIMIT);

        assert_eq!(
            report.fields(),
            vec![
                FormField::Salutation,
                FormField::FirstName,
                FormField::LastName,
                FormField::Street,
                FormField::HouseNumber,
                FormField::PostalCode,
                FormField::City,
                FormField::BirthDate,
            ]
        );
    }

    #[test]
    fn test_delivery_gate_blank_after_trim_is_missing() {
        let state = WizardState {
            customer: CustomerRecord {
                city: "   ".to_string(),
                ..valid_customer()
            },
            ..Default::default()
        };
        let report = check_step(WizardStep::Delivery, &state, &catalog(), DEFAULT_BUDGET_LIMIT);

        assert_eq!(report.violations, vec![GateViolation::Required(FormField::City)]);
    }

    #[test]
    fn test_delivery_gate_validates_formats() {
        let mut customer = valid_customer();
        customer.postal_code = "1011".to_string();
        customer.birth_date = "31.02.2020".to_string();
        let state = WizardState {
            customer,
            ..Default::default()
        };
        let report = check_step(WizardStep::Delivery, &state, &catalog(), DEFAULT_BUDGET_LIMIT);

        assert_eq!(
            report.violations,
            vec![GateViolation::InvalidPostalCode, GateViolation::InvalidBirthDate]
        );
        assert_eq!(
            report.violation_for(FormField::BirthDate),
            Some(&GateViolation::InvalidBirthDate)
        );
    }

    #[test]
    fn test_delivery_gate_leap_years() {
        for (date, ok) in [("29.02.2020", true), ("29.02.2019", false), ("31.02.2020", false)] {
            let state = WizardState {
                customer: CustomerRecord {
                    birth_date: date.to_string(),
                    ..valid_customer()
                },
                ..Default::default()
            };
            let report = check_step(WizardStep::Delivery, &state, &catalog(), DEFAULT_BUDGET_LIMIT);
            assert_eq!(report.passed(), ok, "birth date {date}");
        }
    }

    #[test]
    fn test_insurance_gate_passes_with_optional_fields_empty() {
        let state = WizardState {
            insurance: valid_insurance(),
            ..Default::default()
        };
        assert!(check_step(WizardStep::Insurance, &state, &catalog(), DEFAULT_BUDGET_LIMIT).passed());
    }

    #[test]
    fn test_insurance_gate_requires_percent_when_subsidised() {
        let mut insurance = valid_insurance();
        insurance.subsidy_eligible = true;
        let state = WizardState {
            insurance,
            ..Default::default()
        };
        let report = check_step(WizardStep::Insurance, &state, &catalog(), DEFAULT_BUDGET_LIMIT);
        assert_eq!(report.violations, vec![GateViolation::SubsidyPercentMissing]);

        let state = state.apply(&WizardAction::MergeInsurance(crate::domain::wizard::InsurancePatch {
            subsidy_percent: Some(Some(SubsidyPercent::Fifty)),
            ..Default::default()
        }));
        assert!(check_step(WizardStep::Insurance, &state, &catalog(), DEFAULT_BUDGET_LIMIT).passed());
    }

    #[test]
    fn test_insurance_gate_requires_consents_and_signature() {
        let mut insurance = valid_insurance();
        insurance.consent_provider_billing = false;
        insurance.signature_insured = Some(Signature::from_encoded(""));
        let state = WizardState {
            insurance,
            ..Default::default()
        };
        let report = check_step(WizardStep::Insurance, &state, &catalog(), DEFAULT_BUDGET_LIMIT);

        assert_eq!(
            report.fields(),
            vec![FormField::ConsentProviderBilling, FormField::SignatureInsured]
        );
    }

    #[test]
    fn test_summary_has_no_forward_gate() {
        let report = check_step(WizardStep::Summary, &WizardState::initial(), &catalog(), DEFAULT_BUDGET_LIMIT);
        assert!(report.passed());
    }

    #[test]
    fn test_retreat_rules() {
        let state = WizardState::initial();
        assert!(!can_retreat(&state));

        let on_summary = state.apply(&WizardAction::SetStep(WizardStep::Summary));
        assert!(can_retreat(&on_summary));

        let placed = on_summary.apply(&WizardAction::RecordOrderId("abc".to_string()));
        assert!(!can_retreat(&placed));
    }

    #[test]
    fn test_report_display_names_fields() {
        let report = GateReport {
            step: WizardStep::Insurance,
            violations: vec![
                GateViolation::Required(FormField::Provider),
                GateViolation::SignatureMissing,
            ],
        };

        assert_eq!(
            report.to_string(),
            "step insurance is incomplete: krankenkasse: krankenkasse is required; \
             signature_insured: the insured person's signature is required"
        );
    }
}
