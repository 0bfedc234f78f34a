//! Sequential pipeline of reconciliation steps.

use serde::Serialize;

use crate::error::Result;
use crate::step::{Step, StepOutcome};

/// Report for one completed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub name: &'static str,
    pub outcome: StepOutcome,
}

/// Summary of a full pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub reports: Vec<StepReport>,
}

impl RunSummary {
    /// Total writes applied across all completed steps.
    pub fn total_writes(&self) -> usize {
        self.reports.iter().map(|r| r.outcome.writes()).sum()
    }

    /// Whether every step found its store already converged.
    pub fn is_unchanged(&self) -> bool {
        self.reports.iter().all(|r| !r.outcome.is_changed())
    }
}

/// Runs steps strictly in order, stopping at the first failure.
///
/// There is no rollback: each step's write is its own unit, and a re-run
/// after a mid-pipeline failure converges because every step is
/// idempotent. Steps never overlap; one runs to completion before the
/// next begins.
#[derive(Default)]
pub struct Pipeline<'a> {
    steps: Vec<Box<dyn Step + 'a>>,
}

impl<'a> Pipeline<'a> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step; steps run in insertion order.
    pub fn push(&mut self, step: impl Step + 'a) {
        self.steps.push(Box::new(step));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run all steps in order.
    pub fn run(self) -> Result<RunSummary> {
        self.run_with(|_| {})
    }

    /// Run all steps in order, invoking `observer` after each completed
    /// step. A failed step is not observed; the error propagates as-is.
    pub fn run_with(mut self, mut observer: impl FnMut(&StepReport)) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for step in &mut self.steps {
            let outcome = step.run()?;
            let report = StepReport {
                name: step.name(),
                outcome,
            };
            observer(&report);
            summary.reports.push(report);
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct FixedStep {
        name: &'static str,
        outcome: StepOutcome,
    }

    impl Step for FixedStep {
        fn name(&self) -> &'static str {
            self.name
        }

        fn run(&mut self) -> Result<StepOutcome> {
            Ok(self.outcome)
        }
    }

    struct FailingStep;

    impl Step for FailingStep {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn run(&mut self) -> Result<StepOutcome> {
            Err(Error::ExternalTool {
                command: "frobnicate".into(),
                detail: "exit status 1".into(),
            })
        }
    }

    #[test]
    fn runs_steps_in_order() {
        let mut pipeline = Pipeline::new();
        pipeline.push(FixedStep {
            name: "first",
            outcome: StepOutcome::Changed { writes: 2 },
        });
        pipeline.push(FixedStep {
            name: "second",
            outcome: StepOutcome::Unchanged,
        });

        let mut seen = Vec::new();
        let summary = pipeline.run_with(|r| seen.push(r.name)).unwrap();

        assert_eq!(seen, vec!["first", "second"]);
        assert_eq!(summary.total_writes(), 2);
        assert!(!summary.is_unchanged());
    }

    #[test]
    fn stops_at_first_failure() {
        let mut pipeline = Pipeline::new();
        pipeline.push(FixedStep {
            name: "first",
            outcome: StepOutcome::Unchanged,
        });
        pipeline.push(FailingStep);
        pipeline.push(FixedStep {
            name: "never",
            outcome: StepOutcome::Changed { writes: 1 },
        });

        let mut seen = Vec::new();
        let err = pipeline.run_with(|r| seen.push(r.name)).unwrap_err();

        assert_eq!(seen, vec!["first"]);
        assert!(err.to_string().contains("frobnicate"));
    }

    #[test]
    fn all_unchanged_summary() {
        let mut pipeline = Pipeline::new();
        pipeline.push(FixedStep {
            name: "only",
            outcome: StepOutcome::Unchanged,
        });
        let summary = pipeline.run().unwrap();
        assert!(summary.is_unchanged());
        assert_eq!(summary.total_writes(), 0);
    }
}
