// src/core/aggregator.rs

use crate::models::{JobDiagnostics, JobOutcome, JobState};
use log::trace;
use std::{
    cmp::Ordering,
    path::{Path, PathBuf},
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering as AtomicOrdering},
    },
};

/// Case-insensitive ordinal comparison: uppercase-folded first, exact
/// ordinal order as the tie-breaker so the sort stays total.
pub fn compare_paths(a: &Path, b: &Path) -> Ordering {
    let a = a.to_string_lossy();
    let b = b.to_string_lossy();
    a.chars()
        .flat_map(char::to_uppercase)
        .cmp(b.chars().flat_map(char::to_uppercase))
        .then_with(|| a.cmp(&b))
}

/// Concurrency-safe collection points shared by every job of a run.
///
/// Jobs only ever append; ordering happens once, in [`ResultCollector::finish`].
#[derive(Debug, Default)]
pub struct ResultCollector {
    outputs: Mutex<Vec<PathBuf>>,
    diagnostics: Mutex<Vec<JobDiagnostics>>,
    regenerated: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one finished job.
    pub fn record(&self, outcome: JobOutcome) {
        trace!("'{}' finished as {:?}", outcome.template.display(), outcome.state);

        let counter = match outcome.state {
            JobState::Written => &self.regenerated,
            JobState::Skipped => &self.skipped,
            _ => &self.failed,
        };
        counter.fetch_add(1, AtomicOrdering::Relaxed);

        if let Some(output) = outcome.written_output() {
            self.outputs
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(output.to_path_buf());
        }

        if !outcome.diagnostics.is_empty() {
            self.diagnostics
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(JobDiagnostics {
                    template: outcome.template,
                    diagnostics: outcome.diagnostics,
                });
        }
    }

    /// Consumes the collector and produces the deterministic report.
    pub fn finish(self) -> RunReport {
        let mut outputs = self
            .outputs
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        outputs.sort_by(|a, b| compare_paths(a, b));

        let mut diagnostics = self
            .diagnostics
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        diagnostics.sort_by(|a, b| compare_paths(&a.template, &b.template));

        RunReport {
            outputs,
            diagnostics,
            regenerated: self.regenerated.into_inner(),
            skipped: self.skipped.into_inner(),
            failed: self.failed.into_inner(),
        }
    }
}

/// How a run ended, as seen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// At least one output was regenerated and nothing failed.
    Success,
    /// Nothing needed regenerating and nothing failed.
    NoWork,
    /// At least one error-level diagnostic was reported.
    Failure,
}

/// The merged, sorted result of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub outputs: Vec<PathBuf>,
    pub diagnostics: Vec<JobDiagnostics>,
    pub regenerated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunReport {
    /// Whether any collection holds an error. Warnings never fail a run.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(JobDiagnostics::has_errors)
    }

    pub fn outcome(&self) -> RunOutcome {
        if self.has_errors() {
            RunOutcome::Failure
        } else if self.regenerated == 0 {
            RunOutcome::NoWork
        } else {
            RunOutcome::Success
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Diagnostic;

    fn outcome(template: &str, state: JobState, diagnostics: Vec<Diagnostic>) -> JobOutcome {
        let output = Path::new(template).with_extension("cs");
        JobOutcome {
            template: PathBuf::from(template),
            state,
            output_path: Some(output),
            diagnostics,
        }
    }

    #[test]
    fn test_compare_paths_is_case_insensitive_with_total_order() {
        let mut paths = vec![
            PathBuf::from("/p/b.cs"),
            PathBuf::from("/p/A.cs"),
            PathBuf::from("/p/a.cs"),
            PathBuf::from("/p/C.cs"),
        ];
        paths.sort_by(|a, b| compare_paths(a, b));
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/p/A.cs"),
                PathBuf::from("/p/a.cs"),
                PathBuf::from("/p/b.cs"),
                PathBuf::from("/p/C.cs"),
            ]
        );
    }

    #[test]
    fn test_outputs_sorted_regardless_of_completion_order() {
        let collector = ResultCollector::new();
        collector.record(outcome("/p/zeta.tt", JobState::Written, Vec::new()));
        collector.record(outcome("/p/Beta.tt", JobState::Written, Vec::new()));
        collector.record(outcome("/p/alpha.tt", JobState::Written, Vec::new()));
        collector.record(outcome("/p/skipped.tt", JobState::Skipped, Vec::new()));

        let report = collector.finish();
        assert_eq!(
            report.outputs,
            vec![
                PathBuf::from("/p/alpha.cs"),
                PathBuf::from("/p/Beta.cs"),
                PathBuf::from("/p/zeta.cs"),
            ]
        );
        assert_eq!((report.regenerated, report.skipped, report.failed), (3, 1, 0));
        assert_eq!(report.outcome(), RunOutcome::Success);
    }

    #[test]
    fn test_warnings_alone_do_not_fail() {
        let collector = ResultCollector::new();
        collector.record(outcome(
            "/p/a.tt",
            JobState::Written,
            vec![Diagnostic::warning("obsolete directive")],
        ));
        let report = collector.finish();
        assert!(!report.has_errors());
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.outcome(), RunOutcome::Success);
    }

    #[test]
    fn test_errors_fail_the_run_and_diagnostics_are_sorted() {
        let collector = ResultCollector::new();
        collector.record(outcome("/p/b.tt", JobState::Failed, vec![Diagnostic::error("boom")]));
        collector.record(outcome("/p/A.tt", JobState::Written, vec![Diagnostic::warning("hm")]));

        let report = collector.finish();
        assert_eq!(report.outcome(), RunOutcome::Failure);
        assert_eq!(report.outputs, vec![PathBuf::from("/p/A.cs")]);
        let order: Vec<_> = report.diagnostics.iter().map(|d| d.template.clone()).collect();
        assert_eq!(order, vec![PathBuf::from("/p/A.tt"), PathBuf::from("/p/b.tt")]);
    }

    #[test]
    fn test_all_skipped_is_no_work() {
        let collector = ResultCollector::new();
        collector.record(outcome("/p/a.tt", JobState::Skipped, Vec::new()));
        collector.record(outcome("/p/b.tt", JobState::Skipped, Vec::new()));
        let report = collector.finish();
        assert!(report.outputs.is_empty());
        assert_eq!(report.outcome(), RunOutcome::NoWork);
    }
}
