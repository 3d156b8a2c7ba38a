//! Run bookkeeping and progress events.

use std::time::Duration;

use serde::Serialize;

use super::error::{Disposition, IngestError};

/// Failure reasons shown in a summary.
pub const MAX_DISPLAYED_ERRORS: usize = 10;

/// Terminal state of one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Submitted { id: String },
    Skipped { reason: String },
    Failed { reason: String },
}

impl From<IngestError> for ItemOutcome {
    fn from(err: IngestError) -> Self {
        let reason = err.to_string();
        match err.disposition() {
            Disposition::Skipped => Self::Skipped { reason },
            Disposition::Failed => Self::Failed { reason },
        }
    }
}

/// Counters for one run. Only the run's control loop writes to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchStats {
    pub total: usize,
    pub processed: usize,
    pub errors: usize,
    pub skipped: usize,
    /// `(item identifier, reason)` for every skipped or failed item, in
    /// completion order.
    pub errors_detail: Vec<(String, String)>,
}

impl BatchStats {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, identifier: &str, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Submitted { .. } => self.processed += 1,
            ItemOutcome::Skipped { reason } => {
                self.skipped += 1;
                self.errors_detail.push((identifier.to_string(), reason.clone()));
            }
            ItemOutcome::Failed { reason } => {
                self.errors += 1;
                self.errors_detail.push((identifier.to_string(), reason.clone()));
            }
        }
    }

    /// Items with a recorded outcome.
    pub fn accounted(&self) -> usize {
        self.processed + self.errors + self.skipped
    }

    /// The first failure reasons, capped for display.
    pub fn displayed_errors(&self) -> &[(String, String)] {
        let end = self.errors_detail.len().min(MAX_DISPLAYED_ERRORS);
        &self.errors_detail[..end]
    }
}

/// Result of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub stats: BatchStats,
    pub elapsed: Duration,
    /// Network downloads performed during the run.
    pub downloads: usize,
    /// Set when the run stopped before its last batch.
    pub cancelled: bool,
}

impl RunSummary {
    /// Items never started because the run was cancelled.
    pub fn unstarted(&self) -> usize {
        self.stats.total.saturating_sub(self.stats.accounted())
    }
}

/// Progress events for a UI layer.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    RunStarted {
        total_items: usize,
        batches: usize,
    },
    BatchStarted {
        batch: usize,
        items: usize,
    },
    ItemStarted {
        identifier: String,
    },
    Downloaded {
        identifier: String,
        bytes: u64,
    },
    ItemCompleted {
        identifier: String,
        id: String,
    },
    ItemSkipped {
        identifier: String,
        reason: String,
    },
    ItemFailed {
        identifier: String,
        error: String,
    },
    BatchCompleted {
        batch: usize,
        processed: usize,
        errors: usize,
        skipped: usize,
    },
}

impl PipelineEvent {
    pub(crate) fn finished(identifier: String, outcome: &ItemOutcome) -> Self {
        match outcome {
            ItemOutcome::Submitted { id } => Self::ItemCompleted {
                identifier,
                id: id.clone(),
            },
            ItemOutcome::Skipped { reason } => Self::ItemSkipped {
                identifier,
                reason: reason.clone(),
            },
            ItemOutcome::Failed { reason } => Self::ItemFailed {
                identifier,
                error: reason.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_counter_invariant() {
        let mut stats = BatchStats::new(3);
        stats.record("a", &ItemOutcome::Submitted { id: "a".into() });
        stats.record("b", &ItemOutcome::Skipped { reason: "too short".into() });
        stats.record("c", &ItemOutcome::Failed { reason: "HTTP 404".into() });

        assert_eq!((stats.processed, stats.skipped, stats.errors), (1, 1, 1));
        assert_eq!(stats.accounted(), stats.total);
        assert_eq!(
            stats.errors_detail,
            vec![
                ("b".to_string(), "too short".to_string()),
                ("c".to_string(), "HTTP 404".to_string())
            ]
        );
    }

    #[test]
    fn test_displayed_errors_capped() {
        let mut stats = BatchStats::new(25);
        for i in 0..25 {
            stats.record(&i.to_string(), &ItemOutcome::Failed { reason: "x".into() });
        }
        assert_eq!(stats.displayed_errors().len(), MAX_DISPLAYED_ERRORS);
        assert_eq!(stats.displayed_errors()[0].0, "0");
    }

    #[test]
    fn test_outcome_from_error() {
        let outcome = ItemOutcome::from(IngestError::MissingLocation);
        assert_eq!(
            outcome,
            ItemOutcome::Skipped {
                reason: "no PDF location".into()
            }
        );
    }
}
