//! Thin command wrappers over the reconcilers.

use anyhow::Result;

use crate::Context;
use crate::config::{ConfigSet, IdentityConfig};

pub mod import;
pub mod import_users;
pub mod init;
pub mod join;
pub mod print_config;
pub mod run;

/// Load the merged sources and resolve the selected identity. Fails before
/// any store is touched when the identity is missing.
pub(crate) fn load_identity(ctx: &Context) -> Result<IdentityConfig> {
    let set = ConfigSet::read_files(&ctx.sources)?;
    Ok(set.get(ctx.identity()?)?.clone())
}
