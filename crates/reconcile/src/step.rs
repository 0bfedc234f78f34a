//! The unit of reconciliation: one idempotent pass over one backing store.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What a completed step did to its backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// The store already matched the declared state; nothing was written.
    Unchanged,
    /// The store was mutated; `writes` counts the applied differences.
    Changed { writes: usize },
}

impl StepOutcome {
    /// Collapse a write counter into an outcome.
    pub fn from_writes(writes: usize) -> Self {
        if writes == 0 {
            Self::Unchanged
        } else {
            Self::Changed { writes }
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }

    /// Number of applied differences (zero for [`StepOutcome::Unchanged`]).
    pub fn writes(&self) -> usize {
        match self {
            Self::Unchanged => 0,
            Self::Changed { writes } => *writes,
        }
    }
}

/// One idempotent reconciliation step.
///
/// A step reads its backing store fresh, computes the difference against
/// the declared state, and applies only that difference. Running the same
/// step twice against an unchanged source must report
/// [`StepOutcome::Unchanged`] the second time.
pub trait Step {
    /// Stable name used in reports and logs.
    fn name(&self) -> &'static str;

    /// Reconcile the backing store, reporting what was written.
    fn run(&mut self) -> Result<StepOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_writes_zero_is_unchanged() {
        assert_eq!(StepOutcome::from_writes(0), StepOutcome::Unchanged);
        assert!(!StepOutcome::from_writes(0).is_changed());
    }

    #[test]
    fn from_writes_counts() {
        let outcome = StepOutcome::from_writes(3);
        assert_eq!(outcome, StepOutcome::Changed { writes: 3 });
        assert_eq!(outcome.writes(), 3);
        assert!(outcome.is_changed());
    }
}
