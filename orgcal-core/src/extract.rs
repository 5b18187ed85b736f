//! Building source events from the outline.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use chrono::{DateTime, Months};
use chrono_tz::Tz;
use regex::Regex;

use crate::config::SyncConfig;
use crate::error::{OrgCalError, OrgCalResult};
use crate::event::{EventDate, SourceEvent, localize};
use crate::outline::{Headline, NodeId, Outline, Position};
use crate::recurrence::{RecurrenceSpec, RepeatUnit};
use crate::timestamp::Interval;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s,]+@[^@\s,]+\.[^@\s,]+$").expect("valid regex"));

/// Headlines with this tag give the end time of the same-titled event.
const END_TAG: &str = "end";

/// Extract every included event under the configured events path.
pub fn find_events(outline: &Outline, config: &SyncConfig) -> OrgCalResult<Vec<SourceEvent>> {
    let zone = config.time_zone()?;

    tracing::trace!("Finding event headlines at '{}'...", config.org_events_path);
    let parent = outline
        .find_path(&config.org_events_path)
        .ok_or_else(|| OrgCalError::EventsPathNotFound(config.org_events_path.clone()))?;

    let candidates = if config.flatten {
        outline.descendants(parent)
    } else {
        outline.children(parent).to_vec()
    };

    let events = build_events(outline, &candidates, config, zone);
    tracing::debug!(
        "Found org events: {}",
        events
            .iter()
            .map(|e| e.title.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(events
        .into_iter()
        .filter(|event| event.should_be_included(config))
        .collect())
}

fn build_events(
    outline: &Outline,
    candidates: &[NodeId],
    config: &SyncConfig,
    zone: Tz,
) -> Vec<SourceEvent> {
    let ends: HashMap<String, EventDate> = candidates
        .iter()
        .map(|id| outline.headline(*id))
        .filter(|head| head.has_tag(END_TAG))
        .filter_map(|head| {
            let start = head.scheduled.as_ref()?.start.start_in(headline_zone(head, zone))?;
            Some((head.title.trim().to_string(), start))
        })
        .collect();

    candidates
        .iter()
        .filter_map(|id| from_headline(outline, *id, &ends, config, zone))
        .collect()
}

fn from_headline(
    outline: &Outline,
    id: NodeId,
    ends: &HashMap<String, EventDate>,
    config: &SyncConfig,
    default_zone: Tz,
) -> Option<SourceEvent> {
    let head = outline.headline(id);
    if head.has_tag(END_TAG) {
        return None;
    }
    let scheduled = head.scheduled.as_ref()?;

    let title = head.title.trim().to_string();
    let zone = headline_zone(head, default_zone);
    let start = scheduled.start.start_in(zone)?;
    let end = scheduled
        .start
        .end_in(zone)
        .or_else(|| scheduled.end.as_ref()?.start_in(zone))
        .or_else(|| ends.get(&title).cloned());

    let own_tags: BTreeSet<String> = head.tags.iter().cloned().collect();

    Some(SourceEvent {
        description: head.content.trim().to_string(),
        reminder_offset_minutes: scheduled
            .start
            .delay
            .and_then(|delay| reminder_minutes(delay, start.at)),
        state: head.state.clone(),
        tags: outline.inherited_tags(Position::Node(id)),
        color: config.color_for(&own_tags),
        own_tags,
        location: non_blank(head.property("LOCATION")),
        repeat: scheduled
            .start
            .repeater
            .map(|repeater| repeat_spec(head, repeater)),
        attendees: attendees(head, &title, config),
        nonce: non_blank(head.property("NONCE")),
        end,
        start,
        title,
    })
}

fn headline_zone(head: &Headline, default_zone: Tz) -> Tz {
    head.property("TIME_ZONE")
        .and_then(|name| name.trim().parse().ok())
        .unwrap_or(default_zone)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Minutes before `start` for a warning delay. Years aren't supported.
fn reminder_minutes(delay: Interval, start: DateTime<Tz>) -> Option<i64> {
    let value = i64::from(delay.value);
    match delay.unit {
        RepeatUnit::Hour => Some(value * 60),
        RepeatUnit::Day => Some(value * 60 * 24),
        RepeatUnit::Week => Some(value * 60 * 24 * 7),
        RepeatUnit::Month => {
            let earlier = start
                .naive_local()
                .checked_sub_months(Months::new(delay.value))?;
            let earlier = localize(start.timezone(), earlier)?;
            Some((start - earlier).num_minutes())
        }
        RepeatUnit::Year => None,
    }
}

fn repeat_spec(head: &Headline, repeater: Interval) -> RecurrenceSpec {
    RecurrenceSpec {
        unit: repeater.unit,
        interval: repeater.value,
        count: non_blank(head.property("COUNT")),
        until: non_blank(head.property("UNTIL")),
        exclusions: head
            .property("EX_DATES")
            .map(|raw| {
                raw.split('|')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default(),
        original_start: non_blank(head.property("OG_START")),
        original_end: non_blank(head.property("OG_END")),
    }
}

/// Comma-separated `ATTENDEES`, nicknames resolved, invalid addresses dropped.
fn attendees(head: &Headline, title: &str, config: &SyncConfig) -> Vec<String> {
    let Some(raw) = head.property("ATTENDEES") else {
        return Vec::new();
    };

    raw.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|a| config.resolve_nickname(a).to_string())
        .filter(|a| {
            let valid = EMAIL.is_match(a);
            if !valid {
                tracing::warn!("Ignoring invalid attendee '{}' of '{}'", a, title);
            }
            valid
        })
        .collect()
}
