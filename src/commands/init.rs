use anyhow::Result;
use reconcile::SystemRunner;

use crate::bootstrap::Bootstrap;
use crate::{Context, paths, ui};

/// Run the full bootstrap sequence for the selected identity.
pub fn run(ctx: &Context) -> Result<()> {
    paths::ensure_server_dirs()?;
    let config = super::load_identity(ctx)?;

    let runner = SystemRunner;
    let mut bootstrap = Bootstrap::new(&config, &ctx.paths, &runner);
    let summary = bootstrap.init()?;

    if !ctx.quiet {
        let total = summary.reports.len();
        for (index, report) in summary.reports.iter().enumerate() {
            let state = if report.outcome.is_changed() {
                format!("{} writes", report.outcome.writes())
            } else {
                "unchanged".to_string()
            };
            ui::step(index + 1, total, &format!("{} ({state})", report.name));
        }
        if summary.is_unchanged() {
            ui::success("environment already initialized");
        } else {
            ui::success("environment initialized");
        }
    }
    Ok(())
}
