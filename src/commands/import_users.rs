use anyhow::Result;
use reconcile::{Step, SystemRunner};

use crate::bootstrap::IdentityImport;
use crate::{Context, ui};

/// Import declared users and groups into the system files and the service
/// credential database. This enables the configured users to log into the
/// served instance.
pub fn run(ctx: &Context) -> Result<()> {
    let config = super::load_identity(ctx)?;

    let runner = SystemRunner;
    let outcome = IdentityImport::new(&config, &ctx.paths, &runner).run()?;

    if !ctx.quiet {
        if outcome.is_changed() {
            ui::success(&format!("imported {} identities", outcome.writes()));
        } else {
            ui::success("users and groups already up to date");
        }
    }
    Ok(())
}
