//! Per-item outcomes of a pipeline run.
//!
//! Stages never abort a batch because one item failed. Instead each failure
//! is captured as an [`ItemFailure`] so the caller can inspect what went
//! wrong after the run.

use crate::error::{CoreError, Stage};
use crate::error_utils::ErrorExt;
use tracing::{info, warn};

#[derive(Debug)]
pub struct ItemFailure {
    pub post_id: String,
    pub stage: Stage,
    pub error: CoreError,
}

impl ItemFailure {
    pub fn new(post_id: impl Into<String>, stage: Stage, error: impl Into<CoreError>) -> Self {
        Self {
            post_id: post_id.into(),
            stage,
            error: error.into(),
        }
    }
}

/// Items that made it through a stage plus the ones that did not.
#[derive(Debug)]
pub struct StageReport<T> {
    pub stage: Stage,
    pub items: Vec<T>,
    pub failures: Vec<ItemFailure>,
}

impl<T> StageReport<T> {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            items: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Records one item outcome. Failures are logged with the post id.
    pub fn record(&mut self, post_id: &str, outcome: Result<T, CoreError>) {
        match outcome {
            Ok(item) => self.items.push(item),
            Err(error) => {
                warn!(
                    "[{}] {} failed for post {}: {}",
                    error.error_code(),
                    self.stage,
                    post_id,
                    error
                );
                self.failures.push(ItemFailure::new(post_id, self.stage, error));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Outcome of the persistence stage, which has no item output.
#[derive(Debug, Default)]
pub struct PersistOutcome {
    pub inserted: usize,
    pub below_threshold: usize,
    pub failures: Vec<ItemFailure>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub listed: usize,
    pub candidates: usize,
    pub retrieved: usize,
    pub extracted: usize,
    pub persisted: usize,
    pub below_threshold: usize,
    pub failures: Vec<ItemFailure>,
}

impl RunReport {
    pub fn failure_count(&self, stage: Stage) -> usize {
        self.failures.iter().filter(|f| f.stage == stage).count()
    }

    pub fn log_summary(&self) {
        info!(
            listed = self.listed,
            candidates = self.candidates,
            retrieved = self.retrieved,
            extracted = self.extracted,
            persisted = self.persisted,
            below_threshold = self.below_threshold,
            failures = self.failures.len(),
            "Run complete"
        );
        for stage in [Stage::Retrieve, Stage::Extract, Stage::Persist] {
            let count = self.failure_count(stage);
            if count > 0 {
                info!("{} item(s) failed during {}", count, stage);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;

    #[test]
    fn test_stage_report_records_both_outcomes() {
        let mut report: StageReport<u32> = StageReport::new(Stage::Extract);
        report.record("a", Ok(1));
        report.record(
            "b",
            Err(CoreError::Ocr(OcrError::UnreadableImage {
                reason: "empty".to_string(),
            })),
        );

        assert_eq!(report.items, vec![1]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].post_id, "b");
        assert_eq!(report.failures[0].stage, Stage::Extract);
    }

    #[test]
    fn test_failure_count_by_stage() {
        let report = RunReport {
            failures: vec![
                ItemFailure::new("a", Stage::Retrieve, CoreError::Timeout { seconds: 10 }),
                ItemFailure::new("b", Stage::Retrieve, CoreError::Timeout { seconds: 10 }),
                ItemFailure::new(
                    "c",
                    Stage::Persist,
                    CoreError::Internal {
                        message: "boom".to_string(),
                    },
                ),
            ],
            ..Default::default()
        };

        assert_eq!(report.failure_count(Stage::Retrieve), 2);
        assert_eq!(report.failure_count(Stage::Persist), 1);
        assert_eq!(report.failure_count(Stage::Extract), 0);
    }
}
