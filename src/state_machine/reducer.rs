// ============================================================================
// Reducer Pattern - Replace-Not-Patch State Transitions
// ============================================================================
//
// Key Principles:
// 1. State is a value; every transition produces a new value
// 2. The previous state is never mutated, so stale reads stay consistent
// 3. Actions form a closed set (one enum per state type)
// 4. The reducer itself rejects nothing; policy lives in front of it
//
// ============================================================================

/// Generic reducer trait - every wizard-like state type implements this
///
/// Type Parameters:
/// - `Action`: The closed set of transitions for this state
pub trait Reducer: Sized + Clone {
    type Action;

    /// State the machine starts in (and returns to on reset)
    fn initial() -> Self;

    /// Produce the successor state for one action
    fn apply(&self, action: &Self::Action) -> Self;

    /// Short, stable label for logs and metrics
    fn action_kind(action: &Self::Action) -> &'static str;

    /// Rebuild a state from its action history
    fn replay<'a, I>(actions: I) -> Self
    where
        I: IntoIterator<Item = &'a Self::Action>,
        Self::Action: 'a,
    {
        actions
            .into_iter()
            .fold(Self::initial(), |state, action| state.apply(action))
    }
}
