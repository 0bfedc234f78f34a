//! Well-known locations for the stores this tool reconciles.
//!
//! There is no implicit global path state: every reconciler entry point
//! takes the paths it operates on, with the well-known defaults below as
//! the starting point. The CLI layer overrides them per flag/environment.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Default declarative configuration source.
pub const DEFAULT_CONFIG: &str = "/etc/samba/container/config.json";

/// Directories the served daemons expect to exist before startup.
const SERVER_DIRS: &[&str] = &["/var/lib/samba", "/var/lib/samba/private", "/run/samba"];

/// Store files one bootstrap run reconciles.
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub passwd: PathBuf,
    pub group: PathBuf,
    pub nsswitch: PathBuf,
}

impl Default for StorePaths {
    fn default() -> Self {
        Self {
            passwd: PathBuf::from("/etc/passwd"),
            group: PathBuf::from("/etc/group"),
            nsswitch: PathBuf::from("/etc/nsswitch.conf"),
        }
    }
}

/// Create the runtime directories the daemons expect.
pub fn ensure_server_dirs() -> Result<()> {
    for dir in SERVER_DIRS {
        fs::create_dir_all(dir).with_context(|| format!("could not create {dir}"))?;
    }
    Ok(())
}
