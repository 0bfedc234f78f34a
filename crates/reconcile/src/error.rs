//! Error types for reconciliation steps.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors a reconciliation step can fail with.
///
/// Both kinds are fatal for the step that raised them; a pipeline stops at
/// the first one and leaves earlier steps' writes in place.
#[derive(Debug, Error)]
pub enum Error {
    /// An external tool exited non-zero or could not be run at all.
    #[error("external command `{command}` failed: {detail}")]
    ExternalTool { command: String, detail: String },

    /// A required store file was missing, unreadable, or unwritable.
    #[error("cannot access {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Failure to even spawn `command` (not found, permissions, ...).
    pub fn spawn(command: impl Into<String>, source: io::Error) -> Self {
        Self::ExternalTool {
            command: command.into(),
            detail: format!("could not be spawned: {source}"),
        }
    }
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;
