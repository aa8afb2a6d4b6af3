// ============================================================================
// Submission - order creation and artifact retrieval
// ============================================================================

pub mod artifacts;
pub mod controller;

pub use artifacts::*;
pub use controller::*;
