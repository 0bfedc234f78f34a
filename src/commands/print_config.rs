use anyhow::{Context as AnyhowContext, Result};
use std::io;

use crate::Context;
use crate::registry;

/// Render the effective service configuration to stdout.
pub fn run(ctx: &Context) -> Result<()> {
    let config = super::load_identity(ctx)?;
    let stdout = io::stdout();
    registry::render(&config, &mut stdout.lock()).context("could not write configuration")?;
    Ok(())
}
