// ============================================================================
// Wizard Domain - one care-box configuration session
// ============================================================================
//
// This module contains ALL wizard-specific code:
// - Value objects (WizardStep, CareLevel, GlovesSize, Selection, Signature)
// - Records (CustomerRecord, InsuranceRecord and their patches)
// - Actions (the store's named transitions)
// - Commands (user intent)
// - Errors (WizardError enum)
// - Aggregate (WizardState and its reducer)
// - Command Handler (WizardSession)
//
// ============================================================================

pub mod value_objects;
pub mod records;
pub mod actions;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod command_handler;

// Re-export for convenience
pub use value_objects::*;
pub use records::*;
pub use actions::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use command_handler::*;
