//! Turn progress events
//!
//! Each orchestrator turn produces a finite sequence of status events closed
//! by exactly one terminal event. The sender half enforces that shape at the
//! type level: [`TurnReporter::finish`] consumes the reporter, so no event
//! of any kind can be emitted once the outcome is decided. A consumer
//! rendering progress can therefore never see a "still working" update after
//! the turn has already paused for user input or finished.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::clarification::ClarificationRequest;
use crate::report::{DeliveryOutcome, Report};

/// Non-terminal progress update for a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusUpdate {
    /// The turn has started and the query is being analyzed.
    AnalyzingQuery,
    /// The planner is being consulted.
    PlanningSearches,
    /// The planner committed to a search plan. This is the first event that
    /// can only appear on the research path, never before a clarification
    /// pause.
    SearchesPlanned { count: usize },
    /// Search `index` (zero-based) of `total` is running.
    Searching {
        index: usize,
        total: usize,
        query: String,
    },
    /// A search failed and will appear as a gap in the report.
    SearchGap { index: usize, query: String },
    /// All searches done; the writer is composing the report.
    WritingReport,
    /// The report is being handed off for delivery.
    DeliveringReport,
}

/// Terminal event for a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnOutcome {
    /// The planner paused the turn; collect answers and run a new turn.
    ClarificationNeeded(ClarificationRequest),
    /// The pipeline ran to completion.
    Completed {
        report: Report,
        delivery: DeliveryOutcome,
    },
    /// The turn failed; the message is safe to show to the user.
    Failed(String),
}

/// One event in a turn's progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnEvent {
    Status(StatusUpdate),
    Finished(TurnOutcome),
}

impl TurnEvent {
    /// Whether this is the stream's terminal event.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

/// Sender half of a turn's event stream.
///
/// Status updates borrow the reporter; the terminal event consumes it.
pub struct TurnReporter {
    tx: Option<mpsc::UnboundedSender<TurnEvent>>,
}

impl TurnReporter {
    /// Reporter that drops every event, for callers that only want the
    /// returned outcome.
    pub fn discard() -> Self {
        Self { tx: None }
    }

    /// Emit a progress update.
    ///
    /// Sending never blocks and a departed consumer is not an error; a turn
    /// must not fail because nobody is watching it.
    pub fn status(&self, update: StatusUpdate) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(TurnEvent::Status(update));
        }
    }

    /// Emit the terminal event.
    ///
    /// Consuming `self` closes the stream: there is no way to emit anything
    /// afterwards, so the terminal event is guaranteed to be last.
    pub fn finish(self, outcome: TurnOutcome) {
        if let Some(tx) = self.tx {
            let _ = tx.send(TurnEvent::Finished(outcome));
        }
    }
}

/// Receiver half of a turn's event stream.
pub struct TurnEvents {
    rx: mpsc::UnboundedReceiver<TurnEvent>,
}

impl TurnEvents {
    /// Next event, or `None` once the terminal event has been consumed and
    /// the sender dropped.
    pub async fn next_event(&mut self) -> Option<TurnEvent> {
        self.rx.recv().await
    }
}

/// Create a connected reporter/consumer pair for one turn.
pub fn turn_channel() -> (TurnReporter, TurnEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TurnReporter { tx: Some(tx) }, TurnEvents { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_terminal_event_closes_the_stream() {
        let (reporter, mut events) = turn_channel();

        reporter.status(StatusUpdate::AnalyzingQuery);
        reporter.finish(TurnOutcome::Failed("boom".to_string()));

        assert_eq!(
            events.next_event().await,
            Some(TurnEvent::Status(StatusUpdate::AnalyzingQuery))
        );
        let terminal = events.next_event().await.unwrap();
        assert!(terminal.is_terminal());

        // Sender gone: the stream ends, nothing can follow the terminal.
        assert!(events.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_discard_reporter_is_inert() {
        let reporter = TurnReporter::discard();
        reporter.status(StatusUpdate::PlanningSearches);
        reporter.finish(TurnOutcome::Failed("ignored".to_string()));
    }

    #[tokio::test]
    async fn test_dropped_consumer_does_not_fail_the_turn() {
        let (reporter, events) = turn_channel();
        drop(events);

        reporter.status(StatusUpdate::WritingReport);
        reporter.finish(TurnOutcome::Failed("nobody watching".to_string()));
    }
}
