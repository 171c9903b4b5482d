//! Caller-owned session state and the chat boundary
//!
//! The session layer owns the conversation phase and the persisted query.
//! The orchestrator never mutates this state; it only returns outcomes the
//! session uses to decide transitions.
//!
//! The phase is never advanced ahead of the facts: it stays at its entry
//! value while a turn is being evaluated, becomes `Researching` only once
//! the plan is known to be ready (observed via the `SearchesPlanned` status
//! event), and settles per the terminal event. An observer polling the state
//! therefore cannot see "researching" when the turn is actually paused for
//! user input, and a failed turn never strands the state in the transient
//! phase.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clarification::{ClarificationRequest, ClarificationRound};
use crate::events::{StatusUpdate, TurnEvent};
use crate::orchestrator::{Orchestrator, RunOutcome};
use crate::report::{DeliveryOutcome, Report};

/// Conversation phase visible to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No query accepted yet.
    #[default]
    Initial,
    /// Clarifying questions are outstanding.
    WaitingForAnswers,
    /// A plan was accepted and the pipeline is running. Transient: a turn
    /// always leaves this phase before control returns to the user.
    Researching,
    /// A report was produced; further messages are ignored until reset.
    Complete,
}

impl SessionPhase {
    /// Whether the session accepts no further research input.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Per-conversation state, owned by the calling UI layer.
///
/// Serializable so a host can persist a paused conversation between turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// Current phase.
    pub phase: SessionPhase,
    /// Original research query; written once by the first accepted message.
    query: Option<String>,
    /// Clarification rounds, oldest first. At most the last one is open.
    rounds: Vec<ClarificationRound>,
}

impl SessionState {
    /// Create a fresh session state
    pub fn new() -> Self {
        Self::default()
    }

    /// The persisted original query, if one has been accepted.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// All clarification rounds so far, oldest first.
    pub fn rounds(&self) -> &[ClarificationRound] {
        &self.rounds
    }

    /// Answers of all closed rounds, oldest first.
    pub fn collected_answers(&self) -> Vec<String> {
        self.rounds
            .iter()
            .filter_map(|round| round.answer().map(str::to_string))
            .collect()
    }

    /// First write wins; the query is immutable across clarification rounds.
    fn set_query_once(&mut self, query: &str) {
        if self.query.is_none() {
            self.query = Some(query.to_string());
        }
    }

    /// Release a provisionally stored query after a first turn that failed
    /// outright. The query only becomes immutable once a turn has accepted
    /// it, i.e. left the initial phase.
    fn release_query(&mut self) {
        self.query = None;
    }

    /// Open a new round. The previous round, if any, must already be closed.
    fn push_round(&mut self, request: ClarificationRequest) {
        debug_assert!(
            self.rounds.iter().all(ClarificationRound::is_answered),
            "opening a round while another is unanswered"
        );
        self.rounds.push(ClarificationRound::open(request));
    }

    /// Close the open round with the user's answer text.
    fn close_open_round(&mut self, answer: &str) {
        if let Some(round) = self.rounds.iter_mut().rev().find(|r| !r.is_answered()) {
            round.close(answer);
        }
    }
}

/// Session-level reply for one user message.
#[derive(Debug, Clone)]
pub enum SessionReply {
    /// The assistant needs these answered before researching. Verbatim and
    /// in order, as the planner asked them.
    Questions(Vec<String>),
    /// Research finished. `delivery_problem` carries a handoff failure
    /// message when the report was produced but could not be delivered.
    Finished {
        report: Report,
        delivery_problem: Option<String>,
    },
    /// The turn failed with a user-visible message.
    Error(String),
    /// The session already completed; the user must reset to start over.
    AlreadyComplete,
}

/// One user's conversation, driving the orchestrator turn by turn.
///
/// A new user message is not processed until the previous turn has returned:
/// `handle_message` takes `&mut self`, so the single-writer rule holds by
/// construction.
pub struct ChatSession {
    orchestrator: Orchestrator,
    state: SessionState,
}

impl ChatSession {
    /// Create a session with fresh state
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            state: SessionState::new(),
        }
    }

    /// Restore a session from previously persisted state.
    pub fn from_state(orchestrator: Orchestrator, state: SessionState) -> Self {
        Self {
            orchestrator,
            state,
        }
    }

    /// Current session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    /// Reset the conversation, as when the user clears the chat.
    pub fn reset(&mut self) {
        info!("session reset");
        self.state = SessionState::new();
    }

    /// Handle one user message, discarding progress events.
    pub async fn handle_message(&mut self, text: &str) -> SessionReply {
        self.handle_message_with(text, |_| {}).await
    }

    /// Handle one user message, invoking `on_event` for every turn event as
    /// it is produced.
    pub async fn handle_message_with<F>(&mut self, text: &str, mut on_event: F) -> SessionReply
    where
        F: FnMut(&TurnEvent),
    {
        let text = text.trim();

        match self.state.phase {
            SessionPhase::Complete => SessionReply::AlreadyComplete,
            SessionPhase::Researching => SessionReply::Error(
                "a research turn is already in progress; wait for it to finish".to_string(),
            ),
            SessionPhase::Initial => {
                if text.is_empty() {
                    return SessionReply::Error(
                        "enter a research query to get started".to_string(),
                    );
                }
                self.state.set_query_once(text);
                self.run_turn(&mut on_event).await
            }
            SessionPhase::WaitingForAnswers => {
                if text.is_empty() {
                    return SessionReply::Error(
                        "please answer the clarifying questions, in free form".to_string(),
                    );
                }
                self.state.close_open_round(text);
                self.run_turn(&mut on_event).await
            }
        }
    }

    async fn run_turn<F>(&mut self, on_event: &mut F) -> SessionReply
    where
        F: FnMut(&TurnEvent),
    {
        let entry_phase = self.state.phase;
        let query = match self.state.query() {
            Some(query) => query.to_string(),
            None => return SessionReply::Error("no query recorded for this session".to_string()),
        };
        let answers = self.state.collected_answers();

        let (reporter, mut events) = crate::events::turn_channel();

        // Split borrows: the turn reads the orchestrator while the drain
        // loop updates the phase from observed events.
        let orchestrator = &self.orchestrator;
        let state = &mut self.state;

        let run = orchestrator.run_with_events(&query, &answers, reporter);
        let drain = async {
            while let Some(event) = events.next_event().await {
                if let TurnEvent::Status(StatusUpdate::SearchesPlanned { .. }) = &event {
                    // The clarification gate has passed: research is truly
                    // underway, and only now does the phase say so.
                    state.phase = SessionPhase::Researching;
                }
                on_event(&event);
            }
        };
        let (result, ()) = futures::join!(run, drain);

        match result {
            Ok(RunOutcome::ClarificationNeeded(request)) => {
                let questions = request.questions().to_vec();
                self.state.push_round(request);
                self.state.phase = SessionPhase::WaitingForAnswers;
                SessionReply::Questions(questions)
            }
            Ok(RunOutcome::Complete { report, delivery }) => {
                self.state.phase = SessionPhase::Complete;
                let delivery_problem = match delivery {
                    DeliveryOutcome::Failed(message) => Some(message),
                    _ => None,
                };
                SessionReply::Finished {
                    report,
                    delivery_problem,
                }
            }
            Err(err) => {
                // Surface the failure and return to where the turn started;
                // the state must never be left in the transient phase.
                self.state.phase = entry_phase;
                if entry_phase == SessionPhase::Initial {
                    // The session never really started; the next message is
                    // free to pose a different query.
                    self.state.release_query();
                }
                SessionReply::Error(err.to_string())
            }
        }
    }
}
