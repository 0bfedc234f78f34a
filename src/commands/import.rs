use anyhow::Result;
use reconcile::SystemRunner;

use crate::registry::RegistryConfig;
use crate::{Context, paths, ui};

/// Import declared settings into the registry configuration store.
pub fn run(ctx: &Context) -> Result<()> {
    paths::ensure_server_dirs()?;
    let config = super::load_identity(ctx)?;

    let runner = SystemRunner;
    let writes = RegistryConfig::new(&runner).import(&config)?;

    if !ctx.quiet {
        if writes == 0 {
            ui::success("registry already up to date");
        } else {
            ui::success(&format!("registry updated ({writes} settings)"));
        }
    }
    Ok(())
}
