//! Report, writer and handoff contracts
//!
//! The writer composes the final report from the query and the ordered
//! search summaries; the handoff collaborator delivers it onward (email in
//! the hosted deployment). A report is read-only once produced and is handed
//! to delivery exactly once.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DeliveryError, WriteError};
use crate::search::SearchSummary;

/// The final synthesized research output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// A couple of sentences for chat display.
    pub short_summary: String,
    /// Full markdown body.
    pub body: String,
    /// Source labels, in the order the searches were planned.
    pub sources: Vec<String>,
}

impl Report {
    /// Create a new report
    pub fn new(
        short_summary: impl Into<String>,
        body: impl Into<String>,
        sources: Vec<String>,
    ) -> Self {
        Self {
            short_summary: short_summary.into(),
            body: body.into(),
            sources,
        }
    }

    /// A report is presentable only with a non-empty body.
    pub fn has_body(&self) -> bool {
        !self.body.trim().is_empty()
    }
}

/// External report-writing collaborator.
#[async_trait]
pub trait ReportWriter: Send + Sync {
    /// Compose the report from the query and the ordered search summaries.
    ///
    /// Summaries arrive in planned-task order; gap placeholders for failed
    /// searches are included so the report can note what went uncovered.
    async fn write(&self, query: &str, summaries: &[SearchSummary])
        -> Result<Report, WriteError>;
}

/// Proof of delivery from the handoff collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Unique receipt id.
    pub id: Uuid,
    /// When the collaborator accepted the report.
    pub delivered_at: DateTime<Utc>,
    /// Collaborator-specific detail, e.g. a message id.
    pub detail: Option<String>,
}

impl DeliveryReceipt {
    /// Create a receipt stamped with the current time
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            delivered_at: Utc::now(),
            detail: None,
        }
    }

    /// Attach collaborator-specific detail
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl Default for DeliveryReceipt {
    fn default() -> Self {
        Self::new()
    }
}

/// External delivery collaborator.
#[async_trait]
pub trait Handoff: Send + Sync {
    /// Deliver a completed report onward.
    async fn deliver(&self, report: &Report) -> Result<DeliveryReceipt, DeliveryError>;
}

/// What happened at the delivery step.
///
/// A failed handoff does not invalidate the report; the caller surfaces
/// both the report and the failure message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOutcome {
    /// The handoff collaborator accepted the report.
    Delivered(DeliveryReceipt),
    /// The handoff collaborator failed; message is user-visible.
    Failed(String),
    /// Delivery disabled by configuration.
    Skipped,
}

impl DeliveryOutcome {
    /// User-visible problem message, if delivery failed.
    pub fn problem(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_body_presence() {
        let report = Report::new("summary", "# Findings\n...", vec![]);
        assert!(report.has_body());

        let empty = Report::new("summary", "   \n", vec![]);
        assert!(!empty.has_body());
    }

    #[test]
    fn test_receipt_detail() {
        let receipt = DeliveryReceipt::new().with_detail("message-42");
        assert_eq!(receipt.detail.as_deref(), Some("message-42"));
    }

    #[test]
    fn test_delivery_outcome_problem() {
        assert!(DeliveryOutcome::Delivered(DeliveryReceipt::new())
            .problem()
            .is_none());
        assert!(DeliveryOutcome::Skipped.problem().is_none());
        assert_eq!(
            DeliveryOutcome::Failed("smtp refused".to_string()).problem(),
            Some("smtp refused")
        );
    }
}
