//! Loading org data from a local file or a URL.

use anyhow::{Context, Result};

pub async fn load_org_data(location: &str) -> Result<String> {
    if location.starts_with("http://") || location.starts_with("https://") {
        tracing::trace!("Fetching org data from URL...");
        let body = reqwest::Client::new()
            .get(location)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
            .with_context(|| format!("Failed to read org data from {location}"))?;
        Ok(body)
    } else {
        tracing::trace!("Reading org data from file...");
        tokio::fs::read_to_string(location)
            .await
            .with_context(|| format!("Failed to read org file {location}"))
    }
}
