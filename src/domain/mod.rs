// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// - wizard: the session aggregate (state, transitions, command handling)
// - budget: pure money derivations over a selection and the catalog
// - gate: per-step admission checks with field-level diagnostics
//
// Nothing in this layer performs I/O except WizardSession::submit, which
// goes through the submission controller.
//
// ============================================================================

pub mod wizard;
pub mod budget;
pub mod gate;
