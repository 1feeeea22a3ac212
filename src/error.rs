//! Crate error type
//!
//! All failures surface synchronously to the caller; nothing in this crate
//! retries internally. The trainer decides whether a failure means skip,
//! log, or abort.

use thiserror::Error;

/// Errors produced by the batched environment and the replay store
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnakeDqnError {
    /// An action id outside the four recognized directions was supplied.
    /// This is a caller contract violation: actions must be validated
    /// before stepping.
    #[error("invalid action id {action} for instance {instance} (expected 0..4)")]
    InvalidAction { action: usize, instance: usize },

    /// A sample was requested before the store held enough transitions.
    /// Callers are expected to check `len()` first or skip the
    /// optimization step for this tick.
    #[error("replay store holds {available} transitions, {requested} requested")]
    InsufficientData { requested: usize, available: usize },

    /// A priority update referred to an entry that has been overwritten
    /// since it was sampled. Expected under high insertion throughput
    /// relative to capacity; callers treat it as a soft miss.
    #[error("replay index {index} was overwritten since sampling")]
    StaleIndex { index: usize },
}
