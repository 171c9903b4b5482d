//! Error type definitions
//!
//! A pause for user clarification is deliberately absent from this taxonomy:
//! it is an ordinary outcome ([`crate::plan::PlanOutcome::NeedsClarification`]),
//! and callers must be able to tell it apart from genuine failures at the
//! type level.

use thiserror::Error;

/// Failure reported by a planner implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("planner failed: {message}")]
pub struct PlanError {
    pub message: String,
}

impl PlanError {
    /// Create a new planner error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure reported by a searcher implementation for a single task.
///
/// Never fatal to a turn: the orchestrator degrades the failed task to a gap
/// note and keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("search failed: {message}")]
pub struct SearchError {
    pub message: String,
}

impl SearchError {
    /// Create a new search error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure reported by a report writer implementation.
///
/// Fatal to the turn: no partial report is ever surfaced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("report writing failed: {message}")]
pub struct WriteError {
    pub message: String,
}

impl WriteError {
    /// Create a new writer error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure reported by a handoff implementation.
///
/// The report is still considered successfully produced when delivery fails;
/// the failure travels in [`crate::report::DeliveryOutcome::Failed`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("delivery failed: {message}")]
pub struct DeliveryError {
    pub message: String,
}

impl DeliveryError {
    /// Create a new delivery error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Fatal error for a research turn.
///
/// Only the planner and writer edges can fail a whole turn. A failed search
/// becomes a gap note in the report, and a failed delivery is carried in the
/// completed outcome, so neither appears here. Messages are safe to surface
/// to the user verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error(transparent)]
    Planner(#[from] PlanError),

    #[error(transparent)]
    Writer(#[from] WriteError),
}
