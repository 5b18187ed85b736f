//! Reconciliation: which creates, updates and deletes bring the calendar in
//! line with the outline.
//!
//! This is a single pure pass over owned inputs. It never fails; everything
//! that could go wrong has been normalized away by the time events get here.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::compare::compare;
use crate::destination::DestinationEvent;
use crate::event::SourceEvent;
use crate::matcher::DestinationPool;
use crate::payload::ToDestination;

/// The configuration values reconciliation reads.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub done_keywords: BTreeSet<String>,
    pub create_events_marked_as_done: bool,
    pub delete_grace_period_hours: i64,
    /// Zone for placing date-only destination values in time
    pub time_zone: Tz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Create => write!(f, "+"),
            ChangeKind::Update => write!(f, "~"),
            ChangeKind::Delete => write!(f, "-"),
        }
    }
}

/// Changes to apply to the calendar, computed in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub create: Vec<DestinationEvent>,
    /// (destination id, new payload)
    pub update: Vec<(String, DestinationEvent)>,
    /// (destination id, summary)
    pub delete: Vec<(String, String)>,
}

impl ChangeSet {
    pub fn compute(
        sources: &[SourceEvent],
        destinations: Vec<DestinationEvent>,
        options: &ReconcileOptions,
        now: DateTime<Utc>,
    ) -> Self {
        let threshold = grace_threshold(now, options.delete_grace_period_hours);

        let mut sources: Vec<&SourceEvent> = sources.iter().collect();
        sources.sort_by(|a, b| b.start.at.cmp(&a.start.at));

        let mut pool = DestinationPool::new(destinations, options.time_zone);
        let mut changes = ChangeSet::default();

        for source in sources {
            let target = source.to_destination();

            match pool.claim(source.nonce.as_deref(), &target.summary) {
                Some(existing) => {
                    let comparison = compare(&target, &existing);
                    if comparison.is_equal() {
                        tracing::debug!("'{}' is up to date", target.summary);
                        continue;
                    }

                    tracing::debug!(
                        "Event '{}' conflicts due to mismatched {}",
                        target.summary,
                        comparison
                    );

                    match existing.id {
                        Some(id) => {
                            tracing::debug!("Will update '{}'", target.summary);
                            changes.update.push((id, target));
                        }
                        None => tracing::warn!(
                            "Can't update '{}': calendar event has no id",
                            target.summary
                        ),
                    }
                }
                None if source.can_create(options) => {
                    tracing::debug!("Will create '{}'", target.summary);
                    changes.create.push(target);
                }
                None => {
                    tracing::debug!(
                        "Not creating '{}' marked as {}",
                        target.summary,
                        source.state.as_deref().unwrap_or_default()
                    );
                }
            }
        }

        for leftover in pool.remaining() {
            let Some(end) = leftover.end.instant(options.time_zone) else {
                tracing::debug!(
                    "Not deleting '{}': end can't be placed in time",
                    leftover.summary
                );
                continue;
            };

            if end <= threshold {
                tracing::debug!("Not deleting '{}' in grace period", leftover.summary);
                continue;
            }

            match &leftover.id {
                Some(id) => {
                    tracing::debug!("Will delete '{}'", leftover.summary);
                    changes.delete.push((id.clone(), leftover.summary.clone()));
                }
                None => tracing::warn!(
                    "Can't delete '{}': calendar event has no id",
                    leftover.summary
                ),
            }
        }

        changes
    }

    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }

    /// (created, updated, deleted)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.create.len(), self.update.len(), self.delete.len())
    }

    /// Every change as (kind, summary), in create/update/delete order.
    pub fn entries(&self) -> impl Iterator<Item = (ChangeKind, &str)> {
        let creates = self
            .create
            .iter()
            .map(|e| (ChangeKind::Create, e.summary.as_str()));
        let updates = self
            .update
            .iter()
            .map(|(_, e)| (ChangeKind::Update, e.summary.as_str()));
        let deletes = self
            .delete
            .iter()
            .map(|(_, summary)| (ChangeKind::Delete, summary.as_str()));

        creates.chain(updates).chain(deletes)
    }
}

/// `now` plus the grace period, saturating at the representable range.
fn grace_threshold(now: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    Duration::try_hours(hours)
        .and_then(|grace| now.checked_add_signed(grace))
        .unwrap_or(if hours < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}
