//! Insecure domain join.
//!
//! The password reaches the external tool in cleartext, so this is for
//! testing and non-production use only. One shot: no retry here, and no
//! idempotence guarantee beyond whatever the tool itself provides.

use thiserror::Error;

use reconcile::ToolRunner;

const NET: &str = "net";

/// The external join operation reported failure.
#[derive(Debug, Error)]
#[error("domain join failed: {0}")]
pub struct JoinError(#[from] reconcile::Error);

/// Performs the domain join through the external tool.
pub struct Joiner<'a, R: ToolRunner> {
    runner: &'a R,
}

impl<'a, R: ToolRunner> Joiner<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Join the domain with the given cleartext credentials.
    pub fn join(&self, username: &str, password: &str) -> Result<(), JoinError> {
        log::info!("joining domain as {username}");
        let credentials = format!("{username}%{password}");
        let args = ["ads", "join", "-U", credentials.as_str()];
        self.runner
            .run(NET, &args)?
            // The password stays out of the reported command line.
            .require_success("net ads join")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::{CommandOutput, RecordingRunner};

    #[test]
    fn invokes_net_ads_join_with_credentials() {
        let runner = RecordingRunner::new();
        Joiner::new(&runner).join("Administrator", "hunter2").unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].line(), "net ads join -U Administrator%hunter2");
    }

    #[test]
    fn nonzero_exit_is_a_join_error() {
        let runner = RecordingRunner::new();
        runner.stub("net ads join", CommandOutput::failed(255, "no dc found"));

        let err = Joiner::new(&runner).join("Administrator", "bad").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("domain join failed"));
        // The cleartext password never appears in the error.
        assert!(!message.contains("bad"));
    }
}
