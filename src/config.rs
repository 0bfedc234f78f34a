//! Declarative configuration model.
//!
//! One or more JSON documents describe identities: the users, groups,
//! shares, and join policy a container instance should converge to.
//! Sources are merged in the given order and a later source's identity
//! definition replaces an earlier one wholesale - never field by field.
//! The merged set is re-read on every invocation; nothing is cached
//! across runs.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Document versions this build understands.
const SUPPORTED_VERSIONS: &[&str] = &["v0"];

/// Errors raised while loading or resolving declarative configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The requested identity is absent from every merged source.
    #[error("identity `{0}` is not defined in any configuration source")]
    IdentityNotFound(String),

    #[error("cannot read configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported configuration version `{version}` in {}", .path.display())]
    Version { version: String, path: PathBuf },

    #[error("identity `{identity}` declares user `{name}` more than once")]
    DuplicateUser { identity: String, name: String },

    #[error("identity `{identity}` declares group `{name}` more than once")]
    DuplicateGroup { identity: String, name: String },
}

/// A locally defined user account.
///
/// `uid`/`gid` use the native id width of the system stores. Password
/// material, when present, feeds the service credential database - it is
/// never written to the OS files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    #[serde(default)]
    pub gecos: Option<String>,
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default)]
    pub shell: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// A locally defined group and its members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub gid: u32,
    #[serde(default)]
    pub members: Vec<String>,
}

/// One shared resource: a named section of service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Share {
    pub name: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

/// Domain-join policy for an identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinPolicy {
    /// Allow an insecure (cleartext credential) domain join before serving.
    #[serde(default)]
    pub auto_join: bool,
}

/// Everything declared for one identity.
///
/// Immutable once loaded; `users()` and `groups()` preserve declaration
/// order from the source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub instance_name: Option<String>,
    #[serde(default)]
    pub globals: BTreeMap<String, String>,
    #[serde(default)]
    pub shares: Vec<Share>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub join: JoinPolicy,
}

impl IdentityConfig {
    /// Declared users, in declaration order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Declared groups, in declaration order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// The global section, with `netbios name` derived from the instance
    /// name unless the document sets one explicitly.
    pub fn global_options(&self) -> BTreeMap<String, String> {
        let mut options = self.globals.clone();
        if let Some(instance) = &self.instance_name {
            options
                .entry("netbios name".to_string())
                .or_insert_with(|| instance.clone());
        }
        options
    }

    /// Whether to join the domain before serving: an explicit CLI request
    /// or the declared policy, whichever asks first.
    pub fn effective_auto_join(&self, cli_flag: bool) -> bool {
        cli_flag || self.join.auto_join
    }

    fn validate(&self, identity: &str) -> Result<(), ConfigError> {
        let mut user_names = HashSet::new();
        for user in &self.users {
            if !user_names.insert(user.name.as_str()) {
                return Err(ConfigError::DuplicateUser {
                    identity: identity.to_string(),
                    name: user.name.clone(),
                });
            }
        }
        let mut group_names = HashSet::new();
        for group in &self.groups {
            if !group_names.insert(group.name.as_str()) {
                return Err(ConfigError::DuplicateGroup {
                    identity: identity.to_string(),
                    name: group.name.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ConfigDocument {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    configs: HashMap<String, IdentityConfig>,
}

fn default_version() -> String {
    "v0".to_string()
}

impl ConfigDocument {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let doc: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if !SUPPORTED_VERSIONS.contains(&doc.version.as_str()) {
            return Err(ConfigError::Version {
                version: doc.version,
                path: path.to_path_buf(),
            });
        }
        Ok(doc)
    }
}

/// Merged view over all configuration sources.
#[derive(Debug, Default)]
pub struct ConfigSet {
    configs: HashMap<String, IdentityConfig>,
}

impl ConfigSet {
    /// Read and merge sources in order. A later source's definition of an
    /// identity replaces an earlier one wholesale.
    pub fn read_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ConfigError> {
        let mut merged = HashMap::new();
        for path in paths {
            let path = path.as_ref();
            log::debug!("reading configuration source {}", path.display());
            let doc = ConfigDocument::load(path)?;
            for (identity, config) in doc.configs {
                config.validate(&identity)?;
                merged.insert(identity, config);
            }
        }
        Ok(Self { configs: merged })
    }

    /// The configuration for `identity`, if any source defines it.
    pub fn get(&self, identity: &str) -> Result<&IdentityConfig, ConfigError> {
        self.configs
            .get(identity)
            .ok_or_else(|| ConfigError::IdentityNotFound(identity.to_string()))
    }
}
