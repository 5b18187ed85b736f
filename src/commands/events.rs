use anyhow::Result;
use orgcal_core::SyncConfig;
use owo_colors::OwoColorize;

use super::source_events;
use crate::render::Render;

pub async fn run(config: &SyncConfig) -> Result<()> {
    let events = source_events(config).await?;

    if events.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    for event in &events {
        println!("{}", event.render());
    }

    Ok(())
}
