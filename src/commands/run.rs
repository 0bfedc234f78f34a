use anyhow::Result;
use reconcile::SystemRunner;

use crate::bootstrap::{self, Bootstrap, ServeTarget};
use crate::cli::RunArgs;
use crate::join::Joiner;
use crate::{Context, paths, ui};

/// Initialize the environment (unless told not to), optionally join the
/// domain, then replace this process with the target daemon. Does not
/// return on success.
pub fn run(ctx: &Context, args: &RunArgs) -> Result<()> {
    let runner = SystemRunner;
    paths::ensure_server_dirs()?;

    // With --no-init the declarative sources are not consulted at all, so
    // the join decision falls back to the CLI flag alone.
    let auto_join = if args.no_init {
        args.insecure_auto_join
    } else {
        let config = super::load_identity(ctx)?;
        Bootstrap::new(&config, &ctx.paths, &runner).init()?;
        config.effective_auto_join(args.insecure_auto_join)
    };

    if args.target == ServeTarget::Winbindd && auto_join {
        ui::warn("performing insecure domain join (testing only)");
        Joiner::new(&runner).join(&args.credentials.username, &args.credentials.password)?;
    }

    if !ctx.quiet {
        ui::info(&format!("starting {}", args.target));
    }
    let never = bootstrap::hand_off(args.target)?;
    match never {}
}
