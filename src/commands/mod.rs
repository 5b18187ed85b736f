pub mod events;
pub mod status;
pub mod sync;

use anyhow::Result;
use chrono::Utc;
use orgcal_core::date_range::DateRange;
use orgcal_core::extract::find_events;
use orgcal_core::outline::Outline;
use orgcal_core::{ChangeSet, SourceEvent, SyncConfig};

use crate::source::load_org_data;

/// Read, parse and filter the org file's events.
pub async fn source_events(config: &SyncConfig) -> Result<Vec<SourceEvent>> {
    let org_data = load_org_data(&config.org_file()?).await?;

    tracing::trace!("Parsing org data...");
    let outline = Outline::parse(&org_data, &config.keywords());

    Ok(find_events(&outline, config)?)
}

/// Fetch the calendar and work out what has to change.
pub async fn compute_changes(config: &SyncConfig) -> Result<ChangeSet> {
    let remote = config.remote()?;
    let options = config.reconcile_options()?;
    let sources = source_events(config).await?;

    let now = Utc::now();
    let range = DateRange::fetch_window(
        now,
        config.fetch_past_months,
        config.fetch_future_months,
        options.time_zone,
    );
    let destinations = remote.events(&range).await?;
    tracing::debug!("Fetched {} calendar events", destinations.len());

    tracing::trace!("Computing changes...");
    Ok(ChangeSet::compute(&sources, destinations, &options, now))
}
