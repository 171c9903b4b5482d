//! Interactive research chat demo
//!
//! Drives a full chat session against scripted in-process collaborators, so
//! the clarification pause/resume flow can be exercised end to end without
//! any hosted services.
//!
//! # Usage
//!
//! ```bash
//! # Default interactive run
//! cargo run --bin research-chat
//!
//! # Headless planning policy and a smaller search budget
//! cargo run --bin research-chat -- --policy best-effort --max-searches 3
//! ```
//!
//! Try a vague query ("AI stuff") to see the clarifying questions, then
//! answer them in free form. `reset` clears the conversation, `state` dumps
//! the session state as JSON, `exit` quits.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use deep_research_agent::{
    ChatSession, ClarificationPolicy, ClarificationRequest, DeliveryError, DeliveryReceipt,
    Handoff, Orchestrator, PlanError, PlanOutcome, Planner, Report, ReportWriter, ResearchConfig,
    SearchError, SearchSummary, SearchTask, Searcher, SessionReply, StatusUpdate, TurnEvent,
    WriteError,
};

/// Research chat CLI
#[derive(Parser, Debug)]
#[command(name = "research-chat")]
#[command(about = "Interactive deep-research assistant with clarification rounds")]
#[command(version)]
struct Args {
    /// Clarification handling policy
    #[arg(long, value_enum, default_value = "interactive")]
    policy: PolicyArg,

    /// Maximum searches per turn
    #[arg(long, default_value_t = 3)]
    max_searches: usize,

    /// Skip the delivery handoff
    #[arg(long)]
    no_handoff: bool,

    /// Print the final report as JSON instead of markdown
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Interactive,
    BestEffort,
}

impl From<PolicyArg> for ClarificationPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Interactive => ClarificationPolicy::Interactive,
            PolicyArg::BestEffort => ClarificationPolicy::BestEffort,
        }
    }
}

// =============================================================================
// Scripted collaborators
// =============================================================================

/// Filler words that mark a query as too vague to research.
const VAGUE_MARKERS: &[&str] = &["stuff", "things", "something", "anything", "etc"];

/// Heuristic stand-in for the hosted planning model.
///
/// A query is treated as unclear when it is very short or hedges with vague
/// filler; anything else gets a small fan of angled searches. Once any
/// clarification answers exist the plan always proceeds.
struct ScriptedPlanner;

fn looks_unclear(query: &str) -> bool {
    let lowered = query.to_lowercase();
    let words: Vec<&str> = lowered
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .collect();
    words.len() < 4 || words.iter().any(|w| VAGUE_MARKERS.contains(w))
}

#[async_trait]
impl Planner for ScriptedPlanner {
    async fn plan(&self, query: &str, answers: &[String]) -> Result<PlanOutcome, PlanError> {
        if answers.is_empty() && looks_unclear(query) {
            return Ok(PlanOutcome::NeedsClarification(ClarificationRequest::new(
                vec![
                    "What specific aspect or domain should the research focus on?".to_string(),
                    "Which time period matters (e.g. the last two years)?".to_string(),
                    "Should the report be a technical deep-dive or a high-level overview?"
                        .to_string(),
                ],
            )));
        }

        let focus = match answers.last() {
            Some(answer) => format!("{query} ({answer})"),
            None => query.to_string(),
        };

        Ok(PlanOutcome::Ready(vec![
            SearchTask::new(
                format!("{focus} overview"),
                "establish the current baseline on the topic",
            ),
            SearchTask::new(
                format!("{focus} recent developments"),
                "surface what changed lately",
            ),
            SearchTask::new(
                format!("{focus} expert analysis"),
                "capture informed assessments and criticism",
            ),
        ]))
    }
}

/// Searcher that fabricates a deterministic summary per task.
struct CannedSearcher;

#[async_trait]
impl Searcher for CannedSearcher {
    async fn search(&self, task: &SearchTask) -> Result<SearchSummary, SearchError> {
        // Brief pause so the status stream reads like real work.
        tokio::time::sleep(Duration::from_millis(150)).await;
        Ok(SearchSummary::new(
            task.clone(),
            format!(
                "Condensed findings for \"{}\". Collected to {}.",
                task.query, task.reason
            ),
        ))
    }
}

/// Writer that lays the summaries out as a markdown report.
struct TemplateWriter;

#[async_trait]
impl ReportWriter for TemplateWriter {
    async fn write(
        &self,
        query: &str,
        summaries: &[SearchSummary],
    ) -> Result<Report, WriteError> {
        let mut body = format!("# Research report: {query}\n");
        for summary in summaries {
            body.push_str(&format!("\n## {}\n\n{}\n", summary.task.query, summary.text));
        }

        let gaps = summaries.iter().filter(|s| s.gap).count();
        let short_summary = if gaps == 0 {
            format!(
                "A synthesized overview of \"{query}\" drawn from {} searches.",
                summaries.len()
            )
        } else {
            format!(
                "A synthesized overview of \"{query}\" drawn from {} searches ({gaps} unavailable).",
                summaries.len()
            )
        };

        let sources = summaries.iter().map(|s| s.task.query.clone()).collect();
        Ok(Report::new(short_summary, body, sources))
    }
}

/// Handoff that "delivers" by acknowledging on the terminal.
struct ConsoleHandoff;

#[async_trait]
impl Handoff for ConsoleHandoff {
    async fn deliver(&self, report: &Report) -> Result<DeliveryReceipt, DeliveryError> {
        tracing::info!(sources = report.sources.len(), "report accepted for delivery");
        Ok(DeliveryReceipt::new().with_detail("rendered to terminal"))
    }
}

// =============================================================================
// Output formatting
// =============================================================================

fn print_banner(args: &Args) {
    let separator = "━".repeat(60);
    println!();
    println!("{}", separator.cyan());
    println!("{}", "Deep Research - Interactive Mode".cyan().bold());
    println!("{}", separator.cyan());
    println!();
    println!("   Policy: {:?}", args.policy);
    println!("   Max searches per turn: {}", args.max_searches);
    println!(
        "   Delivery handoff: {}",
        if args.no_handoff { "disabled" } else { "enabled" }
    );
    println!();
    println!(
        "{}",
        "Enter a research topic. Vague queries trigger clarifying questions;".dimmed()
    );
    println!(
        "{}",
        "answer them in free form. Commands: reset, state, exit".dimmed()
    );
    println!();
}

fn status_line(update: &StatusUpdate) -> String {
    match update {
        StatusUpdate::AnalyzingQuery => "Analyzing your query...".to_string(),
        StatusUpdate::PlanningSearches => "Evaluating query clarity...".to_string(),
        StatusUpdate::SearchesPlanned { count } => {
            format!("Searches planned ({count}), starting to search...")
        }
        StatusUpdate::Searching { index, total, query } => {
            format!("Searching {}/{}: {}", index + 1, total, query)
        }
        StatusUpdate::SearchGap { query, .. } => {
            format!("Search unavailable, noting the gap: {query}")
        }
        StatusUpdate::WritingReport => "Searches complete, writing report...".to_string(),
        StatusUpdate::DeliveringReport => "Report written, delivering...".to_string(),
    }
}

fn print_event(event: &TurnEvent) {
    if let TurnEvent::Status(update) = event {
        println!("{}", format!("[status] {}", status_line(update)).dimmed());
    }
}

fn print_reply(reply: &SessionReply, json: bool) {
    match reply {
        SessionReply::Questions(questions) => {
            println!();
            println!(
                "{}",
                "I need some clarification to better understand your research needs:"
                    .yellow()
                    .bold()
            );
            for (i, question) in questions.iter().enumerate() {
                println!("  {}. {}", i + 1, question);
            }
            println!(
                "{}",
                "Please answer these questions in your next message, in free form.".dimmed()
            );
        }
        SessionReply::Finished {
            report,
            delivery_problem,
        } => {
            println!();
            if json {
                match serde_json::to_string_pretty(report) {
                    Ok(rendered) => println!("{rendered}"),
                    Err(err) => println!("{}", format!("could not render report: {err}").red()),
                }
            } else {
                println!("{}", report.body);
                println!();
                println!("{}", "Sources:".bold());
                for (i, source) in report.sources.iter().enumerate() {
                    println!("  [{}] {}", i + 1, source);
                }
            }
            if let Some(problem) = delivery_problem {
                println!();
                println!(
                    "{}",
                    format!("Report produced, but delivery failed: {problem}").yellow()
                );
            }
            println!();
            println!(
                "{}",
                "Research complete. Type `reset` to start a new topic.".green()
            );
        }
        SessionReply::Error(message) => {
            println!("{}", format!("[error] {message}").red());
        }
        SessionReply::AlreadyComplete => {
            println!(
                "{}",
                "Research already completed. Type `reset` to start a new topic.".yellow()
            );
        }
    }
}

// =============================================================================
// Main loop
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = Args::parse();
    print_banner(&args);

    let config = ResearchConfig::from_env()
        .with_max_search_tasks(args.max_searches)
        .with_clarification(args.policy.into())
        .with_handoff_enabled(!args.no_handoff);

    let orchestrator = Orchestrator::new(
        Arc::new(ScriptedPlanner),
        Arc::new(CannedSearcher),
        Arc::new(TemplateWriter),
        Arc::new(ConsoleHandoff),
    )
    .with_config(config);

    let mut session = ChatSession::new(orchestrator);

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{} ", "you>".cyan().bold());
        std::io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let input = line.trim();

        match input {
            "" => continue,
            "exit" | "quit" => break,
            "reset" | "clear" => {
                session.reset();
                println!("{}", "Conversation cleared.".green());
                continue;
            }
            "state" => {
                println!("{}", serde_json::to_string_pretty(session.state())?);
                continue;
            }
            _ => {}
        }

        let reply = session.handle_message_with(input, print_event).await;
        print_reply(&reply, args.json);
    }

    println!("{}", "Bye.".dimmed());
    Ok(())
}
