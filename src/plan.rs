//! Planner contract
//!
//! The planner is an external collaborator: given the original query and any
//! prior clarification answers, it either pauses the turn with questions or
//! commits to an ordered list of web searches.
//!
//! The pause is a tagged variant, not an exception. Every layer between the
//! planner and the UI matches on [`PlanOutcome`] explicitly, which is what
//! lets the signal cross suspension points without any catch/re-raise
//! plumbing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::clarification::ClarificationRequest;
use crate::error::PlanError;

/// One planned web search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTask {
    /// The search term to use for the web search.
    pub query: String,
    /// Why this search matters for answering the research query.
    pub reason: String,
}

impl SearchTask {
    /// Create a new search task
    pub fn new(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// A task is dispatchable only when both fields are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.query.trim().is_empty() && !self.reason.trim().is_empty()
    }
}

/// Tagged planner result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanOutcome {
    /// The query is too ambiguous to research; ask the user these questions.
    NeedsClarification(ClarificationRequest),
    /// The query is clear; run these searches in order.
    Ready(Vec<SearchTask>),
}

impl PlanOutcome {
    /// Whether this outcome pauses the turn for user input.
    pub fn needs_clarification(&self) -> bool {
        matches!(self, Self::NeedsClarification(_))
    }
}

/// External planning collaborator.
///
/// The planner is treated as a pure function of `(query, answers)`; no
/// idempotence is required across calls. Returning `NeedsClarification`
/// twice for the same unresolved ambiguity is the planner's prerogative
/// (typically when the supplied answers were insufficient) — the caller just
/// runs another round.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Decide whether `query` is researchable.
    ///
    /// `answers` holds the text of every closed clarification round so far,
    /// oldest first; an empty slice means no round has happened yet.
    async fn plan(&self, query: &str, answers: &[String]) -> Result<PlanOutcome, PlanError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_task_validity() {
        assert!(SearchTask::new("quantum error correction 2024", "core topic").is_valid());
        assert!(!SearchTask::new("", "reason").is_valid());
        assert!(!SearchTask::new("query", "   ").is_valid());
    }

    #[test]
    fn test_plan_outcome_tagging() {
        let paused = PlanOutcome::NeedsClarification(ClarificationRequest::new(vec![
            "What scope?".to_string(),
        ]));
        assert!(paused.needs_clarification());

        let ready = PlanOutcome::Ready(vec![SearchTask::new("q", "r")]);
        assert!(!ready.needs_clarification());
    }
}
