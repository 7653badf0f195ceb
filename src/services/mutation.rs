//! Optimistic mutation state
//!
//! Local state is patched before the backend confirms a change. The outcome
//! of the request is reported as a transition out of `Pending`; a failure
//! carries the action that would undo the local patch, and the caller decides
//! whether to apply it.

/// Outcome of an optimistic mutation
#[derive(Debug, Clone, PartialEq)]
pub enum MutationState<C> {
    /// Applied locally, not yet confirmed
    Pending,
    /// Backend accepted the change
    Confirmed,
    /// Backend rejected the change; `compensation` reverts the local patch
    Failed { error: String, compensation: C },
}

impl<C> MutationState<C> {
    pub fn is_pending(&self) -> bool {
        matches!(self, MutationState::Pending)
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, MutationState::Confirmed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, MutationState::Failed { .. })
    }

    /// Error message of a failed mutation
    pub fn error(&self) -> Option<&str> {
        match self {
            MutationState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Take the compensating action out of a failed mutation
    pub fn into_compensation(self) -> Option<C> {
        match self {
            MutationState::Failed { compensation, .. } => Some(compensation),
            _ => None,
        }
    }
}
