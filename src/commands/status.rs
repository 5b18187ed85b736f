use anyhow::Result;
use orgcal_core::SyncConfig;

use super::compute_changes;
use crate::render::Render;

pub async fn run(config: &SyncConfig) -> Result<()> {
    let changes = compute_changes(config).await?;
    println!("{}", changes.render());
    Ok(())
}
