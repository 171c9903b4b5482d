//! Searcher contract
//!
//! The searcher is an external collaborator invoked once per planned task.
//! Summaries are collected in planned-task order regardless of how the
//! collaborator resolves them internally.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::plan::SearchTask;

/// A condensed summary of one search's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSummary {
    /// The planned task this summary answers.
    pub task: SearchTask,
    /// Summary text, a few short paragraphs in hosted implementations.
    pub text: String,
    /// Marks a placeholder written in place of a failed search.
    #[serde(default)]
    pub gap: bool,
}

impl SearchSummary {
    /// Create a summary for a completed search
    pub fn new(task: SearchTask, text: impl Into<String>) -> Self {
        Self {
            task,
            text: text.into(),
            gap: false,
        }
    }

    /// Placeholder recording that a search failed.
    ///
    /// Keeps the planned slot visible in the report instead of silently
    /// dropping it, so the reader can see which angle went uncovered.
    pub fn gap(task: SearchTask, error: &SearchError) -> Self {
        let text = format!(
            "No results available for \"{}\": the search could not be completed ({}).",
            task.query, error.message
        );
        Self {
            task,
            text,
            gap: true,
        }
    }
}

/// External web-search collaborator.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Run one planned search and summarize its results.
    async fn search(&self, task: &SearchTask) -> Result<SearchSummary, SearchError>;
}
