//! Research turn orchestration
//!
//! Drives planner → searcher → writer → handoff for a single turn and
//! surfaces the clarification pause as a tagged outcome. Exactly one
//! clarification round is handled per call: when the planner pauses, control
//! returns to the caller, which collects answers and invokes a new call with
//! the enriched answer list. Repeated pauses are therefore separate calls,
//! never an internal retry loop.

use std::sync::Arc;

use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::clarification::ClarificationRequest;
use crate::config::{ClarificationPolicy, ResearchConfig};
use crate::error::{OrchestratorError, PlanError, WriteError};
use crate::events::{StatusUpdate, TurnOutcome, TurnReporter};
use crate::plan::{PlanOutcome, Planner, SearchTask};
use crate::report::{DeliveryOutcome, Handoff, Report, ReportWriter};
use crate::search::{SearchSummary, Searcher};

/// Canned answer used by the single best-effort re-plan.
const BEST_EFFORT_ANSWER: &str =
    "The user is not available for clarification. Proceed with your best interpretation of the query.";

/// Outcome of one orchestrator call.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The planner needs answers before research can start.
    ClarificationNeeded(ClarificationRequest),
    /// Research ran to completion. The report is final even when delivery
    /// failed.
    Complete {
        report: Report,
        delivery: DeliveryOutcome,
    },
}

/// Drives one research turn across the four collaborators.
///
/// The orchestrator owns no conversation state: phase and query persistence
/// belong to the calling session layer, which decides transitions from the
/// returned outcome.
pub struct Orchestrator {
    planner: Arc<dyn Planner>,
    searcher: Arc<dyn Searcher>,
    writer: Arc<dyn ReportWriter>,
    handoff: Arc<dyn Handoff>,
    config: ResearchConfig,
}

impl Orchestrator {
    /// Create an orchestrator with default configuration
    pub fn new(
        planner: Arc<dyn Planner>,
        searcher: Arc<dyn Searcher>,
        writer: Arc<dyn ReportWriter>,
        handoff: Arc<dyn Handoff>,
    ) -> Self {
        Self {
            planner,
            searcher,
            writer,
            handoff,
            config: ResearchConfig::default(),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: ResearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration
    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Run one turn without observing progress events.
    pub async fn run(
        &self,
        query: &str,
        answers: &[String],
    ) -> Result<RunOutcome, OrchestratorError> {
        self.run_with_events(query, answers, TurnReporter::discard())
            .await
    }

    /// Run one turn, emitting progress on `reporter`.
    ///
    /// The reporter is finished with a terminal event mirroring the returned
    /// value on every path, including errors, so consumers can rely on the
    /// stream ending in exactly one terminal event.
    pub async fn run_with_events(
        &self,
        query: &str,
        answers: &[String],
        reporter: TurnReporter,
    ) -> Result<RunOutcome, OrchestratorError> {
        let turn_id = Uuid::new_v4();
        let span = tracing::info_span!("research_turn", %turn_id);

        let result = self.execute(query, answers, &reporter).instrument(span).await;

        match &result {
            Ok(RunOutcome::ClarificationNeeded(request)) => {
                reporter.finish(TurnOutcome::ClarificationNeeded(request.clone()));
            }
            Ok(RunOutcome::Complete { report, delivery }) => {
                reporter.finish(TurnOutcome::Completed {
                    report: report.clone(),
                    delivery: delivery.clone(),
                });
            }
            Err(err) => reporter.finish(TurnOutcome::Failed(err.to_string())),
        }

        result
    }

    async fn execute(
        &self,
        query: &str,
        answers: &[String],
        reporter: &TurnReporter,
    ) -> Result<RunOutcome, OrchestratorError> {
        reporter.status(StatusUpdate::AnalyzingQuery);
        reporter.status(StatusUpdate::PlanningSearches);

        let tasks = match self.plan_with_policy(query, answers).await? {
            PlanOutcome::NeedsClarification(request) => {
                // Return before any research-phase status can be emitted:
                // once the pause is decided, the stream must go quiet.
                info!(
                    questions = request.questions().len(),
                    "turn paused for clarification"
                );
                return Ok(RunOutcome::ClarificationNeeded(request));
            }
            PlanOutcome::Ready(tasks) => self.accept_tasks(tasks)?,
        };

        reporter.status(StatusUpdate::SearchesPlanned { count: tasks.len() });
        info!(count = tasks.len(), "search plan accepted");

        let summaries = self.run_searches(&tasks, reporter).await;

        reporter.status(StatusUpdate::WritingReport);
        let report = self.writer.write(query, &summaries).await?;
        if !report.has_body() {
            return Err(WriteError::new("writer produced an empty report body").into());
        }

        let delivery = self.deliver(&report, reporter).await;

        Ok(RunOutcome::Complete { report, delivery })
    }

    /// One planner call, plus the single re-plan the best-effort policy
    /// allows.
    async fn plan_with_policy(
        &self,
        query: &str,
        answers: &[String],
    ) -> Result<PlanOutcome, OrchestratorError> {
        let outcome = self.planner.plan(query, answers).await?;

        if !outcome.needs_clarification()
            || self.config.clarification == ClarificationPolicy::Interactive
        {
            return Ok(outcome);
        }

        info!("planner paused but policy is best-effort; re-planning once");
        let mut enriched = answers.to_vec();
        enriched.push(BEST_EFFORT_ANSWER.to_string());

        match self.planner.plan(query, &enriched).await? {
            PlanOutcome::NeedsClarification(_) => Err(PlanError::new(
                "planner still requires clarification under the best-effort policy",
            )
            .into()),
            ready => Ok(ready),
        }
    }

    /// Validate and cap the planner's task list.
    fn accept_tasks(
        &self,
        mut tasks: Vec<SearchTask>,
    ) -> Result<Vec<SearchTask>, OrchestratorError> {
        if tasks.is_empty() {
            return Err(PlanError::new("planner returned an empty search plan").into());
        }
        if tasks.iter().any(|t| !t.is_valid()) {
            return Err(PlanError::new("planner returned a search task with empty fields").into());
        }

        let cap = self.config.max_search_tasks;
        if tasks.len() > cap {
            warn!(
                planned = tasks.len(),
                cap, "truncating search plan to configured maximum"
            );
            tasks.truncate(cap);
        }

        Ok(tasks)
    }

    /// Dispatch searches in planned order.
    ///
    /// Failures degrade to gap notes so one bad search never aborts the
    /// batch, and the output order always matches the planned order.
    async fn run_searches(
        &self,
        tasks: &[SearchTask],
        reporter: &TurnReporter,
    ) -> Vec<SearchSummary> {
        let total = tasks.len();
        let mut summaries = Vec::with_capacity(total);

        for (index, task) in tasks.iter().enumerate() {
            reporter.status(StatusUpdate::Searching {
                index,
                total,
                query: task.query.clone(),
            });

            match self.searcher.search(task).await {
                Ok(summary) => summaries.push(summary),
                Err(err) => {
                    warn!(query = %task.query, error = %err, "search failed; recording gap");
                    reporter.status(StatusUpdate::SearchGap {
                        index,
                        query: task.query.clone(),
                    });
                    summaries.push(SearchSummary::gap(task.clone(), &err));
                }
            }
        }

        summaries
    }

    async fn deliver(&self, report: &Report, reporter: &TurnReporter) -> DeliveryOutcome {
        if !self.config.handoff_enabled {
            return DeliveryOutcome::Skipped;
        }

        reporter.status(StatusUpdate::DeliveringReport);
        match self.handoff.deliver(report).await {
            Ok(receipt) => {
                info!(receipt_id = %receipt.id, "report delivered");
                DeliveryOutcome::Delivered(receipt)
            }
            Err(err) => {
                warn!(error = %err, "handoff failed; report kept");
                DeliveryOutcome::Failed(err.to_string())
            }
        }
    }
}
