use anyhow::Result;
use reconcile::SystemRunner;

use crate::cli::JoinArgs;
use crate::join::Joiner;
use crate::{Context, ui};

/// Perform a domain join with credentials from the CLI or environment.
/// The password travels in cleartext - testing only.
pub fn run(ctx: &Context, args: &JoinArgs) -> Result<()> {
    let runner = SystemRunner;
    Joiner::new(&runner).join(&args.username, &args.password)?;

    if !ctx.quiet {
        ui::success("domain join complete");
    }
    Ok(())
}
