// ============================================================================
// State Machine Infrastructure
// ============================================================================
//
// Generic, reusable reducer abstraction.
// Domain-specific code is in src/domain/
//
// ============================================================================

mod reducer;

pub use reducer::Reducer;
