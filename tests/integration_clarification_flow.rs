//! Integration tests for the clarification pause/resume flow
//!
//! These tests drive full chat sessions against scripted collaborators and
//! verify the protocol end to end:
//! - clear queries research straight through to completion
//! - unclear queries pause with questions and resume on answers
//! - the original query persists across any number of rounds
//! - report source order matches planned order
//! - nothing is emitted after a turn's terminal event

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use deep_research_agent::{
    turn_channel, ChatSession, ClarificationRequest, DeliveryError, DeliveryReceipt, Handoff,
    Orchestrator, PlanError, PlanOutcome, Planner, Report, ReportWriter, SearchError,
    SearchSummary, SearchTask, Searcher, SessionPhase, SessionReply, StatusUpdate, TurnEvent,
    TurnOutcome, WriteError,
};

/// Planner that replays scripted outcomes in order and records its inputs.
struct SequencePlanner {
    outcomes: Mutex<VecDeque<PlanOutcome>>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl SequencePlanner {
    fn new(outcomes: Vec<PlanOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Planner for SequencePlanner {
    async fn plan(&self, query: &str, answers: &[String]) -> Result<PlanOutcome, PlanError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), answers.to_vec()));
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| PlanError::new("planner script exhausted"))
    }
}

/// Searcher with per-query artificial latency, so earlier-planned searches
/// can be made to take the longest.
struct LatencySearcher {
    delays_ms: HashMap<String, u64>,
    fail_queries: Vec<String>,
}

impl LatencySearcher {
    fn instant() -> Self {
        Self {
            delays_ms: HashMap::new(),
            fail_queries: Vec::new(),
        }
    }

    fn with_delays(delays_ms: HashMap<String, u64>) -> Self {
        Self {
            delays_ms,
            fail_queries: Vec::new(),
        }
    }

    fn failing_on(query: &str) -> Self {
        Self {
            delays_ms: HashMap::new(),
            fail_queries: vec![query.to_string()],
        }
    }
}

#[async_trait]
impl Searcher for LatencySearcher {
    async fn search(&self, task: &SearchTask) -> Result<SearchSummary, SearchError> {
        if let Some(delay) = self.delays_ms.get(&task.query) {
            tokio::time::sleep(Duration::from_millis(*delay)).await;
        }
        if self.fail_queries.contains(&task.query) {
            return Err(SearchError::new("synthetic outage"));
        }
        Ok(SearchSummary::new(
            task.clone(),
            format!("summary:{}", task.query),
        ))
    }
}

/// Writer that derives the source list from the summaries it was handed,
/// preserving their order.
struct SourceListWriter {
    fail: bool,
}

impl SourceListWriter {
    fn new() -> Self {
        Self { fail: false }
    }

    fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl ReportWriter for SourceListWriter {
    async fn write(
        &self,
        query: &str,
        summaries: &[SearchSummary],
    ) -> Result<Report, WriteError> {
        if self.fail {
            return Err(WriteError::new("synthesis model unavailable"));
        }
        let body = summaries
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let sources = summaries.iter().map(|s| s.task.query.clone()).collect();
        Ok(Report::new(
            format!("findings on {query}"),
            format!("# {query}\n{body}"),
            sources,
        ))
    }
}

/// Handoff that counts deliveries and can be told to fail.
struct CountingHandoff {
    deliveries: Mutex<usize>,
    fail: bool,
}

impl CountingHandoff {
    fn new() -> Self {
        Self {
            deliveries: Mutex::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            deliveries: Mutex::new(0),
            fail: true,
        }
    }

    fn count(&self) -> usize {
        *self.deliveries.lock().unwrap()
    }
}

#[async_trait]
impl Handoff for CountingHandoff {
    async fn deliver(&self, _report: &Report) -> Result<DeliveryReceipt, DeliveryError> {
        *self.deliveries.lock().unwrap() += 1;
        if self.fail {
            return Err(DeliveryError::new("mailer rejected the message"));
        }
        Ok(DeliveryReceipt::new())
    }
}

fn ready(tasks: Vec<SearchTask>) -> PlanOutcome {
    PlanOutcome::Ready(tasks)
}

fn pause(questions: Vec<&str>) -> PlanOutcome {
    PlanOutcome::NeedsClarification(ClarificationRequest::new(
        questions.into_iter().map(String::from).collect(),
    ))
}

fn three_tasks() -> Vec<SearchTask> {
    vec![
        SearchTask::new("t1", "first angle"),
        SearchTask::new("t2", "second angle"),
        SearchTask::new("t3", "third angle"),
    ]
}

/// Scenario: a clear query researches straight through to completion.
#[tokio::test]
async fn test_clear_query_completes() {
    let planner = Arc::new(SequencePlanner::new(vec![ready(three_tasks())]));
    let handoff = Arc::new(CountingHandoff::new());
    let mut session = ChatSession::new(Orchestrator::new(
        planner,
        Arc::new(LatencySearcher::instant()),
        Arc::new(SourceListWriter::new()),
        handoff.clone(),
    ));

    let reply = session
        .handle_message("Recent quantum computing breakthroughs in error correction from 2023-2024")
        .await;

    match reply {
        SessionReply::Finished {
            report,
            delivery_problem,
        } => {
            assert!(report.has_body());
            assert!(delivery_problem.is_none());
        }
        other => panic!("expected Finished, got {other:?}"),
    }
    assert_eq!(session.phase(), SessionPhase::Complete);
    // The report is handed off exactly once.
    assert_eq!(handoff.count(), 1);
}

/// Scenario: "AI stuff" pauses with questions, then the answered round
/// resumes research and completes.
#[tokio::test]
async fn test_unclear_query_pauses_then_resumes() {
    let planner = Arc::new(SequencePlanner::new(vec![
        pause(vec![
            "Which domain of AI?",
            "What time period?",
            "Technical depth or overview?",
        ]),
        ready(three_tasks()),
    ]));
    let mut session = ChatSession::new(Orchestrator::new(
        planner.clone(),
        Arc::new(LatencySearcher::instant()),
        Arc::new(SourceListWriter::new()),
        Arc::new(CountingHandoff::new()),
    ));

    let reply = session.handle_message("AI stuff").await;
    match reply {
        SessionReply::Questions(questions) => {
            assert_eq!(questions.len(), 3);
            assert_eq!(questions[0], "Which domain of AI?");
        }
        other => panic!("expected Questions, got {other:?}"),
    }
    assert_eq!(session.phase(), SessionPhase::WaitingForAnswers);
    assert_eq!(session.state().query(), Some("AI stuff"));

    let reply = session
        .handle_message("Healthcare applications, last 2 years, technical depth")
        .await;
    assert!(matches!(reply, SessionReply::Finished { .. }));
    assert_eq!(session.phase(), SessionPhase::Complete);

    // Second planner call re-used the original query and carried the answer.
    let calls = planner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].0, "AI stuff");
    assert_eq!(
        calls[1].1,
        ["Healthcare applications, last 2 years, technical depth"]
    );
    // The query persisted unchanged across the round.
    assert_eq!(session.state().query(), Some("AI stuff"));
}

/// Scenario: repeated unclear answers keep the session waiting, never
/// regressing to the initial phase, and the query survives every round.
#[tokio::test]
async fn test_repeated_unclear_answers_stay_waiting() {
    let planner = Arc::new(SequencePlanner::new(vec![
        pause(vec!["Round one question?"]),
        pause(vec!["Round two question?"]),
        ready(three_tasks()),
    ]));
    let mut session = ChatSession::new(Orchestrator::new(
        planner.clone(),
        Arc::new(LatencySearcher::instant()),
        Arc::new(SourceListWriter::new()),
        Arc::new(CountingHandoff::new()),
    ));

    session.handle_message("vague topic").await;
    assert_eq!(session.phase(), SessionPhase::WaitingForAnswers);

    let reply = session.handle_message("still vague answer").await;
    match reply {
        SessionReply::Questions(questions) => assert_eq!(questions, ["Round two question?"]),
        other => panic!("expected Questions, got {other:?}"),
    }
    assert_eq!(session.phase(), SessionPhase::WaitingForAnswers);
    assert_eq!(session.state().rounds().len(), 2);

    let reply = session.handle_message("a concrete answer at last").await;
    assert!(matches!(reply, SessionReply::Finished { .. }));
    assert_eq!(session.phase(), SessionPhase::Complete);

    // Both closed answers were offered to the final plan, oldest first.
    let calls = planner.calls();
    assert_eq!(calls[2].1, ["still vague answer", "a concrete answer at last"]);
    // Query idempotence across N rounds.
    assert_eq!(session.state().query(), Some("vague topic"));
}

/// Report source ordering reflects planned task order even when searches
/// take wildly different times to resolve.
#[tokio::test]
async fn test_report_sources_keep_planned_order() {
    let delays: HashMap<String, u64> =
        [("t1".to_string(), 60), ("t2".to_string(), 30), ("t3".to_string(), 0)]
            .into_iter()
            .collect();
    let planner = Arc::new(SequencePlanner::new(vec![ready(three_tasks())]));
    let mut session = ChatSession::new(Orchestrator::new(
        planner,
        Arc::new(LatencySearcher::with_delays(delays)),
        Arc::new(SourceListWriter::new()),
        Arc::new(CountingHandoff::new()),
    ));

    let reply = session.handle_message("ordering check topic").await;

    match reply {
        SessionReply::Finished { report, .. } => {
            assert_eq!(report.sources, ["t1", "t2", "t3"]);
        }
        other => panic!("expected Finished, got {other:?}"),
    }
}

/// Once a pause is decided, the event stream goes quiet: no research-phase
/// status ever follows, and the terminal event is last.
#[tokio::test]
async fn test_no_status_after_clarification_signal() {
    let planner = Arc::new(SequencePlanner::new(vec![pause(vec!["Scope?"])]));
    let orchestrator = Orchestrator::new(
        planner,
        Arc::new(LatencySearcher::instant()),
        Arc::new(SourceListWriter::new()),
        Arc::new(CountingHandoff::new()),
    );

    let (reporter, mut events) = turn_channel();
    orchestrator
        .run_with_events("AI stuff", &[], reporter)
        .await
        .unwrap();

    let mut seen = Vec::new();
    while let Some(event) = events.next_event().await {
        seen.push(event);
    }

    // Exactly one terminal event, and it is the last thing observed.
    let terminal_positions: Vec<usize> = seen
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_terminal())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(terminal_positions, [seen.len() - 1]);
    assert!(matches!(
        seen.last(),
        Some(TurnEvent::Finished(TurnOutcome::ClarificationNeeded(_)))
    ));

    // No research-phase status leaked out around the pause.
    for event in &seen {
        if let TurnEvent::Status(update) = event {
            assert!(
                matches!(
                    update,
                    StatusUpdate::AnalyzingQuery | StatusUpdate::PlanningSearches
                ),
                "unexpected research-phase status on a paused turn: {update:?}"
            );
        }
    }
}

/// The session phase is never observed as researching on a paused turn:
/// the event that triggers that transition is never emitted.
#[tokio::test]
async fn test_paused_turn_never_reports_research_progress() {
    let planner = Arc::new(SequencePlanner::new(vec![pause(vec!["Scope?"])]));
    let mut session = ChatSession::new(Orchestrator::new(
        planner,
        Arc::new(LatencySearcher::instant()),
        Arc::new(SourceListWriter::new()),
        Arc::new(CountingHandoff::new()),
    ));

    let mut saw_research_status = false;
    session
        .handle_message_with("AI stuff", |event| {
            if matches!(
                event,
                TurnEvent::Status(StatusUpdate::SearchesPlanned { .. })
                    | TurnEvent::Status(StatusUpdate::Searching { .. })
            ) {
                saw_research_status = true;
            }
        })
        .await;

    assert!(!saw_research_status);
    assert_eq!(session.phase(), SessionPhase::WaitingForAnswers);
}

/// A failed individual search degrades to a gap note in the report instead
/// of aborting the turn.
#[tokio::test]
async fn test_partial_search_failure_degrades() {
    let planner = Arc::new(SequencePlanner::new(vec![ready(three_tasks())]));
    let mut session = ChatSession::new(Orchestrator::new(
        planner,
        Arc::new(LatencySearcher::failing_on("t2")),
        Arc::new(SourceListWriter::new()),
        Arc::new(CountingHandoff::new()),
    ));

    let reply = session.handle_message("resilient topic").await;

    match reply {
        SessionReply::Finished { report, .. } => {
            // The failed slot stays visible and ordered.
            assert_eq!(report.sources, ["t1", "t2", "t3"]);
            assert!(report.body.contains("No results available for \"t2\""));
        }
        other => panic!("expected Finished, got {other:?}"),
    }
    assert_eq!(session.phase(), SessionPhase::Complete);
}

/// Delivery failure is reported alongside the report, which remains final.
#[tokio::test]
async fn test_handoff_failure_still_finishes() {
    let planner = Arc::new(SequencePlanner::new(vec![ready(three_tasks())]));
    let mut session = ChatSession::new(Orchestrator::new(
        planner,
        Arc::new(LatencySearcher::instant()),
        Arc::new(SourceListWriter::new()),
        Arc::new(CountingHandoff::failing()),
    ));

    let reply = session.handle_message("topic with broken mailer").await;

    match reply {
        SessionReply::Finished {
            report,
            delivery_problem,
        } => {
            assert!(report.has_body());
            assert!(delivery_problem.unwrap().contains("mailer rejected"));
        }
        other => panic!("expected Finished, got {other:?}"),
    }
    assert_eq!(session.phase(), SessionPhase::Complete);
}

/// A writer failure after an answered round surfaces an error and returns
/// the session to waiting — never stranded in the transient phase.
#[tokio::test]
async fn test_writer_failure_resets_to_entry_phase() {
    let planner = Arc::new(SequencePlanner::new(vec![
        pause(vec!["Scope?"]),
        ready(three_tasks()),
    ]));
    let mut session = ChatSession::new(Orchestrator::new(
        planner,
        Arc::new(LatencySearcher::instant()),
        Arc::new(SourceListWriter::failing()),
        Arc::new(CountingHandoff::new()),
    ));

    session.handle_message("needs one round").await;
    assert_eq!(session.phase(), SessionPhase::WaitingForAnswers);

    let reply = session.handle_message("here are the details").await;

    match reply {
        SessionReply::Error(message) => assert!(message.contains("synthesis model unavailable")),
        other => panic!("expected Error, got {other:?}"),
    }
    assert_eq!(session.phase(), SessionPhase::WaitingForAnswers);
    assert_eq!(session.state().query(), Some("needs one round"));
}

/// Planner whose first call fails outright, recording every query it sees.
struct FlakyPlanner {
    queries: Mutex<Vec<String>>,
}

impl FlakyPlanner {
    fn new() -> Self {
        Self {
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Planner for FlakyPlanner {
    async fn plan(&self, query: &str, _answers: &[String]) -> Result<PlanOutcome, PlanError> {
        let mut queries = self.queries.lock().unwrap();
        queries.push(query.to_string());
        if queries.len() == 1 {
            return Err(PlanError::new("planner offline"));
        }
        Ok(PlanOutcome::Ready(three_tasks()))
    }
}

/// A first turn that fails does not lock in the query: the user's retry may
/// pose a different one.
#[tokio::test]
async fn test_failed_first_turn_releases_the_query() {
    let planner = Arc::new(FlakyPlanner::new());
    let mut session = ChatSession::new(Orchestrator::new(
        planner.clone(),
        Arc::new(LatencySearcher::instant()),
        Arc::new(SourceListWriter::new()),
        Arc::new(CountingHandoff::new()),
    ));

    let reply = session.handle_message("first wording").await;
    assert!(matches!(reply, SessionReply::Error(_)));
    assert_eq!(session.phase(), SessionPhase::Initial);
    assert_eq!(session.state().query(), None);

    let reply = session.handle_message("second, better wording").await;
    assert!(matches!(reply, SessionReply::Finished { .. }));
    assert_eq!(
        planner.queries.lock().unwrap().as_slice(),
        ["first wording", "second, better wording"]
    );
    assert_eq!(session.state().query(), Some("second, better wording"));
}
