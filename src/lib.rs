//! deep-research-agent: interactive research assistant core
//!
//! A chat-driven research pipeline with an explicit clarification
//! pause/resume protocol:
//!
//! 1. A planner inspects the query and either commits to an ordered search
//!    plan or pauses the turn with clarifying questions.
//! 2. The session layer surfaces the questions verbatim, collects the user's
//!    answers, and re-runs the turn; the original query persists unchanged
//!    across any number of rounds.
//! 3. Searches run in planned order (failures degrade to gap notes), a
//!    writer composes the report, and a handoff collaborator delivers it.
//!
//! The pause is a tagged outcome, not an error: every layer matches on
//! [`PlanOutcome`] / [`RunOutcome`] instead of catching a control-flow
//! exception. Each turn's progress stream is closed by exactly one terminal
//! event, and the sender type makes emitting anything after it impossible.
//!
//! The hosted collaborators (LLM planner, web searcher, report writer,
//! delivery) sit behind the [`Planner`], [`Searcher`], [`ReportWriter`] and
//! [`Handoff`] traits; this crate defines the protocol between them, not
//! their implementations.
//!
//! # Example
//!
//! ```ignore
//! use deep_research_agent::{ChatSession, Orchestrator, SessionReply};
//!
//! let orchestrator = Orchestrator::new(planner, searcher, writer, handoff);
//! let mut session = ChatSession::new(orchestrator);
//!
//! match session.handle_message("AI stuff").await {
//!     SessionReply::Questions(questions) => {
//!         // Render the questions; the next message closes the round.
//!     }
//!     SessionReply::Finished { report, .. } => println!("{}", report.body),
//!     other => eprintln!("{other:?}"),
//! }
//! ```

pub mod clarification;
pub mod config;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod plan;
pub mod report;
pub mod search;
pub mod session;

// Re-exports for convenience
pub use clarification::{ClarificationRequest, ClarificationRound, FALLBACK_QUESTION};
pub use config::{ClarificationPolicy, ResearchConfig, DEFAULT_MAX_SEARCH_TASKS};
pub use error::{DeliveryError, OrchestratorError, PlanError, SearchError, WriteError};
pub use events::{turn_channel, StatusUpdate, TurnEvent, TurnEvents, TurnOutcome, TurnReporter};
pub use orchestrator::{Orchestrator, RunOutcome};
pub use plan::{PlanOutcome, Planner, SearchTask};
pub use report::{DeliveryOutcome, DeliveryReceipt, Handoff, Report, ReportWriter};
pub use search::{SearchSummary, Searcher};
pub use session::{ChatSession, SessionPhase, SessionReply, SessionState};
