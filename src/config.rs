//! Runtime configuration
//!
//! Settings that shape a research turn, with optional environment overrides
//! for deployments that cannot pass flags.
//!
//! # Environment Variables
//!
//! | Variable | Purpose |
//! |----------|---------|
//! | `RESEARCH_MAX_SEARCHES` | Cap on planned searches per turn |
//! | `RESEARCH_CLARIFICATION_POLICY` | `interactive` or `best_effort` |
//! | `RESEARCH_HANDOFF_ENABLED` | `true`/`false`, toggles delivery |

use serde::{Deserialize, Serialize};
use tracing::warn;

/// How the orchestrator reacts when the planner pauses for clarification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClarificationPolicy {
    /// Surface the questions to the caller and wait for answers.
    #[default]
    Interactive,
    /// Re-plan once with a canned "proceed with best interpretation" answer.
    /// For headless runs with nobody to ask.
    BestEffort,
}

/// Default cap on planned searches per turn.
pub const DEFAULT_MAX_SEARCH_TASKS: usize = 5;

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Upper bound on search tasks accepted from the planner. Excess tasks
    /// are dropped with a warning.
    pub max_search_tasks: usize,

    /// Clarification handling policy.
    pub clarification: ClarificationPolicy,

    /// Whether completed reports are handed off for delivery.
    pub handoff_enabled: bool,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_search_tasks: DEFAULT_MAX_SEARCH_TASKS,
            clarification: ClarificationPolicy::Interactive,
            handoff_enabled: true,
        }
    }
}

impl ResearchConfig {
    /// Create a config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search task cap. A cap of zero is clamped to one.
    pub fn with_max_search_tasks(mut self, max: usize) -> Self {
        self.max_search_tasks = max.max(1);
        self
    }

    /// Set the clarification policy
    pub fn with_clarification(mut self, policy: ClarificationPolicy) -> Self {
        self.clarification = policy;
        self
    }

    /// Enable or disable the delivery handoff
    pub fn with_handoff_enabled(mut self, enabled: bool) -> Self {
        self.handoff_enabled = enabled;
        self
    }

    /// Load defaults, then apply any environment overrides.
    ///
    /// Unparsable values are ignored with a warning rather than failing
    /// startup.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("RESEARCH_MAX_SEARCHES") {
            match value.parse::<usize>() {
                Ok(n) if n >= 1 => config.max_search_tasks = n,
                _ => warn!(value = %value, "ignoring invalid RESEARCH_MAX_SEARCHES"),
            }
        }

        if let Ok(value) = std::env::var("RESEARCH_CLARIFICATION_POLICY") {
            match parse_policy(&value) {
                Some(policy) => config.clarification = policy,
                None => warn!(value = %value, "ignoring invalid RESEARCH_CLARIFICATION_POLICY"),
            }
        }

        if let Ok(value) = std::env::var("RESEARCH_HANDOFF_ENABLED") {
            match parse_bool(&value) {
                Some(enabled) => config.handoff_enabled = enabled,
                None => warn!(value = %value, "ignoring invalid RESEARCH_HANDOFF_ENABLED"),
            }
        }

        config
    }
}

fn parse_policy(value: &str) -> Option<ClarificationPolicy> {
    match value.to_ascii_lowercase().as_str() {
        "interactive" => Some(ClarificationPolicy::Interactive),
        "best_effort" | "best-effort" => Some(ClarificationPolicy::BestEffort),
        _ => None,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
