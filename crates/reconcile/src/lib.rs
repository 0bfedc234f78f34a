//! # Reconcile
//!
//! A small framework for converging external stores to a declared state.
//!
//! A [`Step`] reads one backing store, computes the difference against the
//! desired state, and applies only that difference. A [`Pipeline`] runs
//! steps strictly in order and stops at the first failure; there is no
//! rollback, because every step is required to be idempotent and a re-run
//! converges on its own.
//!
//! Stores that live behind external command-line tools are reached through
//! the [`ToolRunner`] seam, so reconciliation logic stays testable without
//! spawning processes.
//!
//! ## Example
//!
//! ```ignore
//! use reconcile::{Pipeline, Step, StepOutcome};
//!
//! struct TouchFile { path: std::path::PathBuf }
//!
//! impl Step for TouchFile {
//!     fn name(&self) -> &'static str { "touch" }
//!
//!     fn run(&mut self) -> reconcile::Result<StepOutcome> {
//!         if self.path.exists() {
//!             return Ok(StepOutcome::Unchanged);
//!         }
//!         std::fs::write(&self.path, "")
//!             .map_err(|source| reconcile::Error::FileAccess {
//!                 path: self.path.clone(),
//!                 source,
//!             })?;
//!         Ok(StepOutcome::Changed { writes: 1 })
//!     }
//! }
//!
//! let mut pipeline = Pipeline::new();
//! pipeline.push(TouchFile { path: "/tmp/marker".into() });
//! let summary = pipeline.run()?;
//! assert_eq!(summary.total_writes(), 1);
//! ```

pub mod error;
pub mod pipeline;
pub mod runner;
pub mod step;

// Re-export main types at crate root
pub use error::{Error, Result};
pub use pipeline::{Pipeline, RunSummary, StepReport};
pub use runner::{CommandOutput, RecordedCall, RecordingRunner, SystemRunner, ToolRunner};
pub use step::{Step, StepOutcome};
