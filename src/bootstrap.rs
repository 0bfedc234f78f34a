//! Bootstrap orchestration: the ordered, idempotent sequence that prepares
//! every store a served daemon reads at startup, plus the terminal handoff
//! to the daemon itself.

use std::convert::Infallible;
use std::fmt;
use std::os::unix::process::CommandExt;
use std::process::Command;
use std::str::FromStr;

use anyhow::Context;
use thiserror::Error;

use reconcile::{Pipeline, RunSummary, Step, StepOutcome, ToolRunner};

use crate::config::IdentityConfig;
use crate::nsswitch::NameServiceSwitch;
use crate::passdb::Passdb;
use crate::passwd::{GroupFile, PasswdFile};
use crate::paths::StorePaths;
use crate::registry::RegistryConfig;

/// Progress of one bootstrap run.
///
/// Transitions are strictly sequential and each one is idempotent, so
/// restarting from `Uninitialized` after a mid-sequence failure is always
/// safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BootstrapPhase {
    Uninitialized,
    RegistryImported,
    IdentityImported,
    ResolutionEnsured,
    Ready,
}

/// Declared service settings into the registry store.
pub struct RegistryImport<'a, R: ToolRunner> {
    config: &'a IdentityConfig,
    runner: &'a R,
}

impl<'a, R: ToolRunner> RegistryImport<'a, R> {
    pub fn new(config: &'a IdentityConfig, runner: &'a R) -> Self {
        Self { config, runner }
    }
}

impl<R: ToolRunner> Step for RegistryImport<'_, R> {
    fn name(&self) -> &'static str {
        "registry"
    }

    fn run(&mut self) -> reconcile::Result<StepOutcome> {
        let writes = RegistryConfig::new(self.runner).import(self.config)?;
        Ok(StepOutcome::from_writes(writes))
    }
}

/// Declared users and groups into the OS files, then credentials into the
/// service database.
///
/// Both files are fully written before the first credential call, because
/// entry creation may expect the OS account to resolve already.
pub struct IdentityImport<'a, R: ToolRunner> {
    config: &'a IdentityConfig,
    paths: &'a StorePaths,
    runner: &'a R,
}

impl<'a, R: ToolRunner> IdentityImport<'a, R> {
    pub fn new(config: &'a IdentityConfig, paths: &'a StorePaths, runner: &'a R) -> Self {
        Self {
            config,
            paths,
            runner,
        }
    }
}

impl<R: ToolRunner> Step for IdentityImport<'_, R> {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn run(&mut self) -> reconcile::Result<StepOutcome> {
        let mut writes = 0;

        let mut passwd = PasswdFile::load(&self.paths.passwd)?;
        let mut group = GroupFile::load(&self.paths.group)?;
        for user in self.config.users() {
            if passwd.ensure_user(user) {
                writes += 1;
            }
        }
        for declared in self.config.groups() {
            if group.ensure_group(declared) {
                writes += 1;
            }
        }
        passwd.write_if_changed()?;
        group.write_if_changed()?;

        let passdb = Passdb::new(self.runner);
        for user in self.config.users() {
            if passdb.ensure_user(user)? {
                writes += 1;
            }
        }

        Ok(StepOutcome::from_writes(writes))
    }
}

/// Winbind into the name-service switch.
pub struct NsswitchEnsure<'a> {
    paths: &'a StorePaths,
}

impl<'a> NsswitchEnsure<'a> {
    pub fn new(paths: &'a StorePaths) -> Self {
        Self { paths }
    }
}

impl Step for NsswitchEnsure<'_> {
    fn name(&self) -> &'static str {
        "nsswitch"
    }

    fn run(&mut self) -> reconcile::Result<StepOutcome> {
        let mut nss = NameServiceSwitch::load(&self.paths.nsswitch)?;
        if nss.winbind_enabled() {
            return Ok(StepOutcome::Unchanged);
        }
        let edits = nss.ensure_winbind();
        nss.write_if_changed()?;
        Ok(StepOutcome::from_writes(edits))
    }
}

/// Runs the full reconciliation sequence for one identity.
pub struct Bootstrap<'a, R: ToolRunner> {
    config: &'a IdentityConfig,
    paths: &'a StorePaths,
    runner: &'a R,
    phase: BootstrapPhase,
}

impl<'a, R: ToolRunner> Bootstrap<'a, R> {
    pub fn new(config: &'a IdentityConfig, paths: &'a StorePaths, runner: &'a R) -> Self {
        Self {
            config,
            paths,
            runner,
            phase: BootstrapPhase::Uninitialized,
        }
    }

    pub fn phase(&self) -> BootstrapPhase {
        self.phase
    }

    /// Run registry, identity, and name-resolution reconciliation in that
    /// order. The sequence stops at the first failure; earlier steps'
    /// writes stay in place and a re-run converges because every step is
    /// idempotent.
    pub fn init(&mut self) -> reconcile::Result<RunSummary> {
        let mut pipeline = Pipeline::new();
        pipeline.push(RegistryImport::new(self.config, self.runner));
        pipeline.push(IdentityImport::new(self.config, self.paths, self.runner));
        pipeline.push(NsswitchEnsure::new(self.paths));

        let phase = &mut self.phase;
        let summary = pipeline.run_with(|report| {
            *phase = match report.name {
                "registry" => BootstrapPhase::RegistryImported,
                "identity" => BootstrapPhase::IdentityImported,
                "nsswitch" => BootstrapPhase::ResolutionEnsured,
                _ => *phase,
            };
            log::info!(
                "step {} finished with {} writes",
                report.name,
                report.outcome.writes()
            );
        })?;
        self.phase = BootstrapPhase::Ready;
        Ok(summary)
    }
}

/// Daemon executables this tool can hand control to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeTarget {
    Smbd,
    Winbindd,
}

/// Unrecognized served-process selection.
#[derive(Debug, Error)]
#[error("invalid target process `{0}` (expected smbd or winbindd)")]
pub struct InvalidTarget(String);

impl FromStr for ServeTarget {
    type Err = InvalidTarget;

    fn from_str(value: &str) -> Result<Self, InvalidTarget> {
        match value {
            "smbd" => Ok(Self::Smbd),
            "winbindd" => Ok(Self::Winbindd),
            other => Err(InvalidTarget(other.to_string())),
        }
    }
}

impl fmt::Display for ServeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Smbd => write!(f, "smbd"),
            Self::Winbindd => write!(f, "winbindd"),
        }
    }
}

impl ServeTarget {
    /// Fixed, non-configurable launch command for the daemon.
    pub fn command(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Smbd => (
                "/usr/sbin/smbd",
                &["--foreground", "--log-stdout", "--no-process-group"],
            ),
            Self::Winbindd => (
                "/usr/sbin/winbindd",
                &["--foreground", "--stdout", "--no-process-group"],
            ),
        }
    }
}

/// Replace this process with the target daemon.
///
/// Only ever returns on failure; on success the daemon owns the process
/// image and nothing after this call runs.
pub fn hand_off(target: ServeTarget) -> anyhow::Result<Infallible> {
    let (program, args) = target.command();
    log::info!("handing off to {program}");
    let err = Command::new(program).args(args).exec();
    Err(err).with_context(|| format!("failed to execute {program}"))
}
