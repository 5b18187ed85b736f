use anyhow::Result;
use orgcal_core::SyncConfig;
use owo_colors::OwoColorize;

use super::compute_changes;
use crate::render::Render;

pub async fn run(config: &SyncConfig, dry_run: bool) -> Result<()> {
    let changes = compute_changes(config).await?;
    let stats = config.remote()?.apply(&changes, dry_run).await?;

    if stats.failed > 0 {
        println!("{}", stats.render());
        anyhow::bail!("{} changes could not be applied", stats.failed);
    }

    if dry_run {
        println!("{}", changes.render());
    } else {
        println!("{}", stats.render().green());
    }

    Ok(())
}
