//! Source events: the outline's view of what the calendar should contain.
//!
//! A `SourceEvent` is built once per run from a scheduled headline. Nothing
//! here talks to the calendar; the reconciliation engine compares these
//! against `DestinationEvent`s fetched from the provider.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;

use crate::config::SyncConfig;
use crate::recurrence::{RecurrenceDescriptor, RecurrenceSpec};
use crate::reconcile::ReconcileOptions;

/// A point in time from the outline, plus whether it carried a time of day.
///
/// Date-only values are anchored at local midnight in their zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDate {
    pub at: DateTime<Tz>,
    pub has_time: bool,
}

impl EventDate {
    pub fn timed(at: DateTime<Tz>) -> Self {
        EventDate { at, has_time: true }
    }

    /// Midnight of `date` in `zone`, or the first instant after it when a
    /// transition skips midnight.
    pub fn all_day(date: NaiveDate, zone: Tz) -> Option<Self> {
        let at = localize(zone, date.and_hms_opt(0, 0, 0)?)?;
        Some(EventDate {
            at,
            has_time: false,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.at.date_naive()
    }

    pub fn zone(&self) -> Tz {
        self.at.timezone()
    }
}

impl fmt::Display for EventDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_time {
            write!(f, "{}", self.at.format("%Y-%m-%d %H:%M"))
        } else {
            write!(f, "{}", self.at.format("%Y-%m-%d"))
        }
    }
}

/// Resolve a wall-clock time in `zone`.
///
/// Overlaps take the earlier instant. Times skipped by a forward transition
/// are shifted later by the length of the gap, so 02:30 on a spring-forward
/// night becomes 03:30. `None` only on overflow.
pub(crate) fn localize(zone: Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(at) => Some(at),
        LocalResult::Ambiguous(earlier, _) => Some(earlier),
        LocalResult::None => {
            // Read the wall-clock time with the offset in force before the gap
            let before = zone
                .offset_from_utc_datetime(&naive.checked_sub_signed(Duration::days(1))?)
                .fix();
            let utc = naive.checked_sub_signed(Duration::seconds(before.local_minus_utc().into()))?;
            Some(zone.from_utc_datetime(&utc))
        }
    }
}

/// One event derived from the outline (the desired state).
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEvent {
    pub title: String,
    pub description: String,
    pub start: EventDate,
    pub end: Option<EventDate>,
    /// Minutes before `start` at which to remind
    pub reminder_offset_minutes: Option<i64>,
    /// Workflow keyword (e.g. "TODO", "DONE")
    pub state: Option<String>,
    /// Own tags plus everything inherited from ancestors
    pub tags: BTreeSet<String>,
    pub own_tags: BTreeSet<String>,
    pub location: Option<String>,
    /// Raw repeat metadata, resolved lazily by `recurrence()`
    pub repeat: Option<RecurrenceSpec>,
    pub attendees: Vec<String>,
    /// Caller-supplied identity token, matched before titles
    pub nonce: Option<String>,
    pub color: Option<String>,
}

impl SourceEvent {
    /// Minimal event with only a title and a start; everything else empty.
    pub fn new(title: impl Into<String>, start: EventDate) -> Self {
        SourceEvent {
            title: title.into(),
            description: String::new(),
            start,
            end: None,
            reminder_offset_minutes: None,
            state: None,
            tags: BTreeSet::new(),
            own_tags: BTreeSet::new(),
            location: None,
            repeat: None,
            attendees: Vec::new(),
            nonce: None,
            color: None,
        }
    }

    /// The summary this event is published (and matched) under.
    pub fn summary(&self) -> &str {
        self.title.trim()
    }

    /// Normalized recurrence rule, if the headline repeats.
    pub fn recurrence(&self) -> Option<RecurrenceDescriptor> {
        self.repeat.as_ref().map(|repeat| {
            RecurrenceDescriptor::resolve(repeat, &self.start, self.end.as_ref(), self.start.zone())
        })
    }

    /// Whether an unmatched event may be created on the calendar.
    ///
    /// Matched events are always eligible for update; this gate only applies
    /// to creation.
    pub fn can_create(&self, options: &ReconcileOptions) -> bool {
        if options.create_events_marked_as_done {
            return true;
        }

        match &self.state {
            Some(state) => !options.done_keywords.contains(state),
            None => true,
        }
    }

    /// Whether this event passes the configured tag/state filters.
    pub fn should_be_included(&self, config: &SyncConfig) -> bool {
        let state_in = |keywords: &[String]| {
            self.state
                .as_ref()
                .is_some_and(|s| keywords.iter().any(|k| k == s))
        };

        if config.ignore_todos && state_in(&config.todo_keywords) {
            tracing::debug!(
                "Ignoring '{}' because of {} (TODO-like) status",
                self.title,
                self.state.as_deref().unwrap_or_default()
            );
            return false;
        }

        if config.ignore_done && state_in(&config.done_keywords) {
            tracing::debug!(
                "Ignoring '{}' because of {} (DONE-like) status",
                self.title,
                self.state.as_deref().unwrap_or_default()
            );
            return false;
        }

        let ignored = joined(config.ignore_tags.intersection(&self.tags));
        if !ignored.is_empty() {
            tracing::debug!("Ignoring '{}' because tags include {}", self.title, ignored);
            return false;
        }

        let ignored = joined(config.ignore_own_tags.intersection(&self.own_tags));
        if !ignored.is_empty() {
            tracing::debug!(
                "Ignoring '{}' because own tags include {}",
                self.title,
                ignored
            );
            return false;
        }

        if !config.include_tags.is_empty() && config.include_tags.is_disjoint(&self.tags) {
            tracing::debug!(
                "Ignoring '{}' because tags don't include {}",
                self.title,
                describe_any(&config.include_tags)
            );
            return false;
        }

        if !config.include_own_tags.is_empty() && config.include_own_tags.is_disjoint(&self.own_tags)
        {
            tracing::debug!(
                "Ignoring '{}' because own tags don't include {}",
                self.title,
                describe_any(&config.include_own_tags)
            );
            return false;
        }

        true
    }
}

impl fmt::Display for SourceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

fn joined<'a>(tags: impl Iterator<Item = &'a String>) -> String {
    tags.map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn describe_any(tags: &BTreeSet<String>) -> String {
    let prefix = if tags.len() > 1 { "any of " } else { "" };
    format!("{}{}", prefix, joined(tags.iter()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Sao_Paulo;
    use chrono_tz::Europe::{Berlin, London};

    fn start() -> EventDate {
        EventDate::timed(London.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap())
    }

    fn tags(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn options(create_done: bool) -> ReconcileOptions {
        ReconcileOptions {
            done_keywords: tags(&["DONE", "KILL"]),
            create_events_marked_as_done: create_done,
            delete_grace_period_hours: 24,
            time_zone: London,
        }
    }

    #[test]
    fn test_done_event_cannot_be_created_by_default() {
        let mut event = SourceEvent::new("Standup", start());
        event.state = Some("DONE".to_string());

        assert!(!event.can_create(&options(false)));
        assert!(event.can_create(&options(true)));
    }

    #[test]
    fn test_todo_and_stateless_events_can_be_created() {
        let mut event = SourceEvent::new("Standup", start());
        assert!(event.can_create(&options(false)));

        event.state = Some("TODO".to_string());
        assert!(event.can_create(&options(false)));
    }

    #[test]
    fn test_all_day_is_local_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let all_day = EventDate::all_day(date, London).unwrap();

        assert!(!all_day.has_time);
        assert_eq!(all_day.date(), date);
        assert_eq!(all_day.at.to_rfc3339(), "2024-07-01T00:00:00+01:00");
        assert_eq!(all_day.to_string(), "2024-07-01");
    }

    #[test]
    fn test_all_day_skipped_midnight_moves_forward() {
        // Sao Paulo sprang forward at midnight on 2018-11-04
        let date = NaiveDate::from_ymd_opt(2018, 11, 4).unwrap();
        let all_day = EventDate::all_day(date, Sao_Paulo).unwrap();

        assert_eq!(all_day.date(), date);
        assert_eq!(all_day.at.to_rfc3339(), "2018-11-04T01:00:00-02:00");
    }

    #[test]
    fn test_localize_shifts_times_in_gap() {
        let naive = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let at = localize(Berlin, naive).unwrap();

        assert_eq!(at, Berlin.with_ymd_and_hms(2024, 3, 31, 3, 30, 0).unwrap());
    }

    #[test]
    fn test_localize_takes_earlier_instant_on_overlap() {
        let naive = NaiveDate::from_ymd_opt(2024, 10, 27)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let at = localize(Berlin, naive).unwrap();

        assert_eq!(at.to_rfc3339(), "2024-10-27T02:30:00+02:00");
    }

    #[test]
    fn test_summary_is_trimmed_title() {
        let event = SourceEvent::new("  Standup \t", start());
        assert_eq!(event.summary(), "Standup");
    }

    #[test]
    fn test_include_filter_ignore_tags() {
        let mut config = SyncConfig::default();
        config.ignore_tags = tags(&["private"]);

        let mut event = SourceEvent::new("Dentist", start());
        event.tags = tags(&["private", "health"]);
        assert!(!event.should_be_included(&config));

        event.tags = tags(&["health"]);
        assert!(event.should_be_included(&config));
    }

    #[test]
    fn test_include_filter_own_tags_only_checks_own() {
        let mut config = SyncConfig::default();
        config.include_own_tags = tags(&["cal"]);

        let mut event = SourceEvent::new("Dentist", start());
        event.tags = tags(&["cal"]);
        assert!(
            !event.should_be_included(&config),
            "Inherited tags don't satisfy include_own_tags"
        );

        event.own_tags = tags(&["cal"]);
        assert!(event.should_be_included(&config));
    }

    #[test]
    fn test_include_filter_ignore_todos() {
        let mut config = SyncConfig::default();
        config.ignore_todos = true;

        let mut event = SourceEvent::new("Write report", start());
        event.state = Some("TODO".to_string());
        assert!(!event.should_be_included(&config));

        event.state = Some("DONE".to_string());
        assert!(event.should_be_included(&config));

        config.ignore_done = true;
        assert!(!event.should_be_included(&config));
    }
}
