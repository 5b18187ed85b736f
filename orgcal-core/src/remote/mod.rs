pub mod protocol;
pub mod provider;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::date_range::DateRange;
use crate::destination::DestinationEvent;
use crate::error::OrgCalResult;
use crate::reconcile::ChangeSet;
use crate::remote::protocol::{CreateEvent, DeleteEvent, ListEvents, UpdateEvent};
use crate::remote::provider::Provider;

/// Remote calendar settings: the provider plus its free-form params.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Remote {
    pub provider: Provider,
    #[serde(flatten)]
    pub config: BTreeMap<String, toml::Value>,
}

/// Outcome of applying a change set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed: usize,
}

impl Remote {
    pub fn new(provider: Provider) -> Self {
        Remote {
            provider,
            config: BTreeMap::new(),
        }
    }

    pub fn set_param(&mut self, key: &str, value: impl Into<String>) {
        self.config
            .insert(key.to_string(), toml::Value::String(value.into()));
    }

    /// Params as sent to the provider alongside every command.
    pub fn params(&self) -> serde_json::Map<String, serde_json::Value> {
        self.config
            .iter()
            .filter_map(|(k, v)| serde_json::to_value(v).ok().map(|v| (k.clone(), v)))
            .collect()
    }

    pub async fn events(&self, range: &DateRange) -> OrgCalResult<Vec<DestinationEvent>> {
        tracing::trace!(
            "Fetching calendar events from {} to {}...",
            range.from_rfc3339(),
            range.to_rfc3339()
        );
        self.provider
            .call(ListEvents {
                remote_config: self.params(),
                from: range.from_rfc3339(),
                to: range.to_rfc3339(),
            })
            .await
    }

    pub async fn create_event(&self, event: &DestinationEvent) -> OrgCalResult<DestinationEvent> {
        self.provider
            .call(CreateEvent {
                remote_config: self.params(),
                event: event.clone(),
            })
            .await
    }

    pub async fn update_event(
        &self,
        event_id: &str,
        event: &DestinationEvent,
    ) -> OrgCalResult<DestinationEvent> {
        self.provider
            .call(UpdateEvent {
                remote_config: self.params(),
                event_id: event_id.to_string(),
                event: event.clone(),
            })
            .await
    }

    pub async fn delete_event(&self, event_id: &str) -> OrgCalResult<()> {
        self.provider
            .call(DeleteEvent {
                remote_config: self.params(),
                event_id: event_id.to_string(),
            })
            .await
    }

    /// Execute `changes`: creates, then updates, then deletes.
    ///
    /// A failed item is logged and counted; the rest still run. In dry-run
    /// mode nothing is sent and every change counts as done.
    pub async fn apply(&self, changes: &ChangeSet, dry_run: bool) -> OrgCalResult<ApplyStats> {
        if changes.is_empty() {
            tracing::info!("No changes to process!");
            return Ok(ApplyStats::default());
        }

        let (created, updated, deleted) = changes.counts();
        tracing::info!(
            "Processing {} creations, {} updates, {} deletions",
            created,
            updated,
            deleted
        );

        if dry_run {
            tracing::warn!("Dry run, not sending any changes to the calendar");
            for (kind, summary) in changes.entries() {
                tracing::info!("{} {}", kind, summary);
            }
            return Ok(ApplyStats {
                created,
                updated,
                deleted,
                failed: 0,
            });
        }

        let mut stats = ApplyStats::default();

        for event in &changes.create {
            match self.create_event(event).await {
                Ok(_) => stats.created += 1,
                Err(e) => {
                    tracing::error!("Failed to create '{}': {}", event.summary, e);
                    stats.failed += 1;
                }
            }
        }

        for (id, event) in &changes.update {
            match self.update_event(id, event).await {
                Ok(_) => stats.updated += 1,
                Err(e) => {
                    tracing::error!("Failed to update '{}': {}", event.summary, e);
                    stats.failed += 1;
                }
            }
        }

        for (id, summary) in &changes.delete {
            match self.delete_event(id).await {
                Ok(()) => stats.deleted += 1,
                Err(e) => {
                    tracing::error!("Failed to delete '{}': {}", summary, e);
                    stats.failed += 1;
                }
            }
        }

        tracing::info!(
            "Created {}, updated {}, deleted {}, failed {}",
            stats.created,
            stats.updated,
            stats.deleted,
            stats.failed
        );

        Ok(stats)
    }
}
