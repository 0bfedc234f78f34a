//! Service credential database, mutated one user at a time through the
//! standard tools.
//!
//! The store offers no bulk read, only an existence check per name, so
//! reconciliation is existence-check-then-create: entries that already
//! exist are left alone. Rotating a password in the declarative source
//! therefore requires removing the entry first.

use reconcile::{Result, ToolRunner, runner};

use crate::config::User;

const PDBEDIT: &str = "pdbedit";
const SMBPASSWD: &str = "smbpasswd";

/// Reconciler for the credential database.
pub struct Passdb<'a, R: ToolRunner> {
    runner: &'a R,
}

impl<'a, R: ToolRunner> Passdb<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Ensure an entry exists for `user`, keyed by username. Returns
    /// whether one was created.
    ///
    /// This runs for every declared user on every import, independent of
    /// whether the OS account pre-existed - credential material must stay
    /// in sync either way. Users without password material are skipped.
    pub fn ensure_user(&self, user: &User) -> Result<bool> {
        let Some(password) = user.password.as_deref() else {
            log::debug!("user {} declares no password material, skipping", user.name);
            return Ok(false);
        };
        if self.entry_exists(&user.name)? {
            log::debug!("credential entry for {} already present", user.name);
            return Ok(false);
        }
        self.create_entry(&user.name, password)?;
        Ok(true)
    }

    fn entry_exists(&self, name: &str) -> Result<bool> {
        let arg = format!("--user={name}");
        Ok(self.runner.run(PDBEDIT, &[arg.as_str()])?.success())
    }

    fn create_entry(&self, name: &str, password: &str) -> Result<()> {
        log::info!("creating credential entry for {name}");
        // smbpasswd -s reads the new password twice from stdin.
        let args = ["-s", "-a", name];
        let input = format!("{password}\n{password}\n");
        self.runner
            .run_with_stdin(SMBPASSWD, &args, &input)?
            .require_success(&runner::command_line(SMBPASSWD, &args))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::{CommandOutput, RecordingRunner};

    fn user(name: &str, password: Option<&str>) -> User {
        User {
            name: name.to_string(),
            uid: 2001,
            gid: 2001,
            gecos: None,
            dir: None,
            shell: None,
            password: password.map(str::to_string),
        }
    }

    #[test]
    fn creates_missing_entry_with_password_on_stdin() {
        let runner = RecordingRunner::new();
        runner.stub("pdbedit", CommandOutput::failed(1, "no such user"));

        let created = Passdb::new(&runner)
            .ensure_user(&user("bob", Some("letmein")))
            .unwrap();
        assert!(created);

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].line(), "pdbedit --user=bob");
        assert_eq!(calls[1].line(), "smbpasswd -s -a bob");
        assert_eq!(calls[1].stdin.as_deref(), Some("letmein\nletmein\n"));
    }

    #[test]
    fn existing_entry_is_left_alone() {
        let runner = RecordingRunner::new();
        // pdbedit succeeds: the entry is already there.
        let created = Passdb::new(&runner)
            .ensure_user(&user("bob", Some("letmein")))
            .unwrap();
        assert!(!created);
        assert_eq!(runner.call_lines(), vec!["pdbedit --user=bob"]);
    }

    #[test]
    fn user_without_password_is_skipped() {
        let runner = RecordingRunner::new();
        let created = Passdb::new(&runner).ensure_user(&user("bob", None)).unwrap();
        assert!(!created);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn create_failure_propagates() {
        let runner = RecordingRunner::new();
        runner.stub("pdbedit", CommandOutput::failed(1, "no such user"));
        runner.stub("smbpasswd", CommandOutput::failed(1, "cannot add"));

        let err = Passdb::new(&runner)
            .ensure_user(&user("bob", Some("letmein")))
            .unwrap_err();
        assert!(err.to_string().contains("smbpasswd"));
    }
}
