//! Error types for the optimization core.

use crate::exact::SolveStatus;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the optimization core.
#[derive(Debug, Error)]
pub enum Error {
    /// A source row failed validation. Aborts the whole run.
    #[error("invalid input for room '{room}': {reason}")]
    InvalidInput {
        /// Offending room identifier.
        room: String,
        /// What was wrong with the row.
        reason: String,
    },

    /// The exact solver failed for one partition. Recovered inside the
    /// dispatcher by re-solving with the greedy packer; surfaced only if
    /// the fallback also fails.
    #[error("exact solver failed for partition {partition} ({status}): {message}")]
    Solver {
        /// Label of the affected partition.
        partition: String,
        /// Engine outcome that triggered the failure.
        status: SolveStatus,
        /// Wrapped engine message.
        message: String,
    },

    /// A solver returned an assignment that violates a feasibility
    /// invariant, or a worker thread crashed. Fatal.
    #[error("internal error: {0}")]
    Internal(String),

    /// Caller-requested cancellation.
    #[error("optimization canceled")]
    Canceled,
}
