//! # Batch Processing
//!
//! The one piece of real machinery in bulkops: walk a list of targets in
//! fixed-size chunks, apply a mutation to each one, and fold the outcomes into
//! an [`OperationResult`].
//!
//! ## Guarantees
//!
//! - Targets are processed strictly in list order, one at a time.
//! - A failing target never stops the run; its error is recorded and the next
//!   target is attempted.
//! - In dry-run mode the mutation is never called and every target counts as
//!   processed.
//! - Chunking only decides how often progress is reported. The totals are the
//!   same for any batch size.

use crate::error::{BulkError, Result};
use crate::model::{Operation, OperationResult, RecordRef};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// A chunk length that is known to be at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize(usize);

impl BatchSize {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(BulkError::InvalidInput(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(Self(size))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self(DEFAULT_BATCH_SIZE)
    }
}

impl fmt::Display for BatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Anything a batch can be run over.
///
/// The id ends up in per-target failure messages; targets without one (new
/// documents that don't exist yet) get the generic wording.
pub trait BatchTarget {
    fn target_id(&self) -> Option<&str>;
}

impl BatchTarget for RecordRef {
    fn target_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

impl BatchTarget for Map<String, Value> {
    fn target_id(&self) -> Option<&str> {
        None
    }
}

impl BatchTarget for Value {
    fn target_id(&self) -> Option<&str> {
        None
    }
}

/// Snapshot taken after each chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub operation: Operation,
    pub done: usize,
    pub processed: usize,
    pub total: usize,
    pub dry_run: bool,
}

impl Progress {
    pub fn status_text(&self) -> String {
        let verb = match (self.operation, self.dry_run) {
            (Operation::Create, true) => "Would create",
            (Operation::Create, false) => "Created",
            (Operation::Search, _) => "Searched",
            (_, true) => "Would modify",
            (_, false) => "Modified",
        };
        format!("{} {}/{} documents...", verb, self.processed, self.total)
    }
}

pub struct BatchProcessor {
    batch_size: BatchSize,
    dry_run: bool,
}

impl BatchProcessor {
    pub fn new(batch_size: BatchSize, dry_run: bool) -> Self {
        Self {
            batch_size,
            dry_run,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn run<T, M, P>(
        &self,
        targets: &[T],
        operation: Operation,
        mut mutate: M,
        mut on_progress: P,
    ) -> OperationResult
    where
        T: BatchTarget,
        M: FnMut(&T) -> Result<()>,
        P: FnMut(&Progress),
    {
        let mut result = OperationResult::empty(operation);
        if targets.is_empty() {
            return result;
        }

        let total = targets.len();
        let mut done = 0;

        for (chunk_no, chunk) in targets.chunks(self.batch_size.get()).enumerate() {
            debug!(
                operation = %operation,
                chunk = chunk_no,
                size = chunk.len(),
                dry_run = self.dry_run,
                "processing chunk"
            );

            for target in chunk {
                done += 1;
                if self.dry_run {
                    result.processed += 1;
                    continue;
                }

                match mutate(target) {
                    Ok(()) => result.processed += 1,
                    Err(e) => {
                        let reason = e.reason();
                        warn!(
                            operation = %operation,
                            id = ?target.target_id(),
                            %reason,
                            "target failed"
                        );
                        result
                            .errors
                            .push(operation.failure_message(target.target_id(), &reason));
                    }
                }
            }

            on_progress(&Progress {
                operation,
                done,
                processed: result.processed,
                total,
                dry_run: self.dry_run,
            });
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(ids: &[&str]) -> Vec<RecordRef> {
        ids.iter().map(|id| RecordRef::new(*id, "post")).collect()
    }

    fn fail_on<'a>(bad: &'a [&'a str]) -> impl FnMut(&RecordRef) -> Result<()> + 'a {
        move |rec: &RecordRef| {
            if bad.contains(&rec.id.as_str()) {
                Err(BulkError::Content(format!("rejected {}", rec.id)))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(matches!(BatchSize::new(0), Err(BulkError::InvalidInput(_))));
        assert_eq!(BatchSize::new(1).unwrap().get(), 1);
        assert_eq!(BatchSize::default().get(), DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn empty_input_returns_immediately() {
        let processor = BatchProcessor::new(BatchSize::default(), false);
        let mut progress_calls = 0;
        let result = processor.run(
            &Vec::<RecordRef>::new(),
            Operation::Modify,
            |_| panic!("mutate must not run"),
            |_| progress_calls += 1,
        );
        assert_eq!(result, OperationResult::empty(Operation::Modify));
        assert_eq!(progress_calls, 0);
    }

    #[test]
    fn one_failure_does_not_stop_the_run() {
        let processor = BatchProcessor::new(BatchSize::new(2).unwrap(), false);
        let result = processor.run(
            &records(&["a", "b", "c"]),
            Operation::Modify,
            fail_on(&["b"]),
            |_| {},
        );
        assert_eq!(result.processed, 2);
        assert_eq!(result.errors, vec!["Failed to modify b: rejected b"]);
        assert_eq!(result.operation, Operation::Modify);
    }

    #[test]
    fn errors_follow_input_order() {
        let processor = BatchProcessor::new(BatchSize::new(3).unwrap(), false);
        let result = processor.run(
            &records(&["e", "d", "c", "b", "a"]),
            Operation::Modify,
            fail_on(&["a", "d", "e"]),
            |_| {},
        );
        let ids: Vec<_> = result
            .errors
            .iter()
            .map(|e| e.split(':').next().unwrap().trim_start_matches("Failed to modify "))
            .collect();
        assert_eq!(ids, vec!["e", "d", "a"]);
    }

    #[test]
    fn dry_run_never_mutates_and_counts_everything() {
        let targets = records(&["a", "b", "c", "d"]);
        let mut calls = 0;
        let dry = BatchProcessor::new(BatchSize::new(3).unwrap(), true).run(
            &targets,
            Operation::Modify,
            |_| {
                calls += 1;
                Ok(())
            },
            |_| {},
        );
        assert_eq!(calls, 0);

        let live = BatchProcessor::new(BatchSize::new(3).unwrap(), false).run(
            &targets,
            Operation::Modify,
            |_| Ok(()),
            |_| {},
        );
        assert_eq!(dry.processed, live.processed);
        assert!(dry.is_clean());
    }

    #[test]
    fn totals_do_not_depend_on_batch_size() {
        let targets = records(&["a", "b", "c", "d", "e", "f", "g"]);
        let n = targets.len();
        let mut outcomes = Vec::new();
        for size in [1, n / 2, n, n + 5] {
            let processor = BatchProcessor::new(BatchSize::new(size).unwrap(), false);
            let result = processor.run(&targets, Operation::Modify, fail_on(&["b", "f"]), |_| {});
            assert_eq!(result.processed + result.errors.len(), n);
            outcomes.push(result);
        }
        assert!(outcomes.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn progress_reported_once_per_chunk() {
        let processor = BatchProcessor::new(BatchSize::new(2).unwrap(), false);
        let mut seen = Vec::new();
        processor.run(
            &records(&["a", "b", "c", "d", "e"]),
            Operation::Modify,
            fail_on(&["c"]),
            |p| seen.push((p.done, p.processed, p.total)),
        );
        assert_eq!(seen, vec![(2, 2, 5), (4, 3, 5), (5, 4, 5)]);
    }

    #[test]
    fn progress_text_reflects_dry_run() {
        let mut progress = Progress {
            operation: Operation::Modify,
            done: 2,
            processed: 2,
            total: 3,
            dry_run: true,
        };
        assert_eq!(progress.status_text(), "Would modify 2/3 documents...");
        progress.dry_run = false;
        assert_eq!(progress.status_text(), "Modified 2/3 documents...");
    }

    #[test]
    fn create_failures_use_generic_wording() {
        let processor = BatchProcessor::new(BatchSize::default(), false);
        let templates = vec![serde_json::json!({"title": "X"})];
        let result = processor.run(
            &templates,
            Operation::Create,
            |_| Err(BulkError::Content("quota exceeded".into())),
            |_| {},
        );
        assert_eq!(result.processed, 0);
        assert_eq!(result.errors, vec!["Failed to create document: quota exceeded"]);
    }
}
