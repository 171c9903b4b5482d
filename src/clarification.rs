//! Clarification round data types
//!
//! A clarification round is one cycle of the assistant asking disambiguating
//! questions and the user answering them. Rounds are opened by the session
//! layer when the planner pauses a turn and closed when the user replies;
//! at most one round is open per session at any time.

use serde::{Deserialize, Serialize};

/// Fallback question substituted when a planner pauses a turn without
/// providing any usable questions.
pub const FALLBACK_QUESTION: &str =
    "Could you provide more details about your research query?";

/// An ordered, non-empty list of clarifying questions.
///
/// The question list is preserved verbatim from the planner all the way to
/// the UI boundary; nothing in between reorders or rewrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationRequest {
    questions: Vec<String>,
}

impl ClarificationRequest {
    /// Create a request from planner-provided questions.
    ///
    /// Blank entries are dropped. If nothing usable remains the request
    /// falls back to [`FALLBACK_QUESTION`], so a request always carries at
    /// least one question.
    pub fn new(questions: Vec<String>) -> Self {
        let mut questions: Vec<String> = questions
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();

        if questions.is_empty() {
            questions.push(FALLBACK_QUESTION.to_string());
        }

        Self { questions }
    }

    /// The questions, in the order the planner asked them.
    pub fn questions(&self) -> &[String] {
        &self.questions
    }
}

/// One question/answer exchange within a session.
///
/// Questions are fixed at creation; the answer is attached later, once.
/// A round with no answer is the session's single open round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationRound {
    request: ClarificationRequest,
    answer: Option<String>,
}

impl ClarificationRound {
    /// Open a new, unanswered round for the given questions.
    pub fn open(request: ClarificationRequest) -> Self {
        Self {
            request,
            answer: None,
        }
    }

    /// The questions asked in this round.
    pub fn questions(&self) -> &[String] {
        self.request.questions()
    }

    /// The user's free-form answer text, if the round has been closed.
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    /// Whether the round has been answered.
    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }

    /// Close the round with the user's answer.
    ///
    /// Returns `false` (and leaves the original answer in place) if the
    /// round was already closed.
    pub fn close(&mut self, answer: impl Into<String>) -> bool {
        if self.answer.is_some() {
            return false;
        }
        self.answer = Some(answer.into());
        true
    }
}
