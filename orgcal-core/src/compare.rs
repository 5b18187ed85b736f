//! Field-by-field equality between a target payload and a fetched event.

use std::fmt;

use crate::destination::{DestinationEvent, Reminder};

/// A field that can differ between target and existing events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    Summary,
    Description,
    Start,
    End,
    Reminders,
    Location,
    Nonce,
    Recurrence,
    ColorId,
}

impl fmt::Display for EventField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventField::Summary => "summary",
            EventField::Description => "description",
            EventField::Start => "start time",
            EventField::End => "end time",
            EventField::Reminders => "reminder list",
            EventField::Location => "location",
            EventField::Nonce => "nonce",
            EventField::Recurrence => "recurrence",
            EventField::ColorId => "color id",
        };
        write!(f, "{}", name)
    }
}

/// Result of comparing two events; empty `differing` means equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldComparison {
    pub differing: Vec<EventField>,
}

impl FieldComparison {
    pub fn is_equal(&self) -> bool {
        self.differing.is_empty()
    }
}

impl fmt::Display for FieldComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.differing.iter().map(|d| d.to_string()).collect();
        write!(f, "{}", names.join(", "))
    }
}

/// Compare the fields the outline controls. Attendees and ids are ignored.
pub fn compare(target: &DestinationEvent, existing: &DestinationEvent) -> FieldComparison {
    let checks = [
        (
            EventField::Summary,
            target.summary.trim() == existing.summary.trim(),
        ),
        (
            EventField::Description,
            trimmed(&target.description) == trimmed(&existing.description),
        ),
        (
            EventField::Start,
            target.start.to_string() == existing.start.to_string(),
        ),
        (
            EventField::End,
            target.end.to_string() == existing.end.to_string(),
        ),
        (
            EventField::Reminders,
            same_reminders(&target.reminders.overrides, &existing.reminders.overrides),
        ),
        (EventField::Location, target.location == existing.location),
        (EventField::Nonce, target.nonce() == existing.nonce()),
        (EventField::Recurrence, target.recurrence == existing.recurrence),
        (EventField::ColorId, target.color_id == existing.color_id),
    ];

    FieldComparison {
        differing: checks
            .into_iter()
            .filter(|(_, equal)| !equal)
            .map(|(field, _)| field)
            .collect(),
    }
}

fn trimmed(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or_default()
}

fn same_reminders(a: &[Reminder], b: &[Reminder]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut a: Vec<&Reminder> = a.iter().collect();
    let mut b: Vec<&Reminder> = b.iter().collect();
    a.sort_by_key(|r| r.minutes);
    b.sort_by_key(|r| r.minutes);

    a.iter()
        .zip(&b)
        .all(|(x, y)| x.minutes == y.minutes && x.method == y.method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::{EventDateTime, Reminders};
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::{America::New_York, Europe::London};

    fn event() -> DestinationEvent {
        let start = New_York.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
        let end = New_York.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
        DestinationEvent::new(
            "Standup",
            EventDateTime::date_time(start),
            EventDateTime::date_time(end),
        )
    }

    fn reminder(method: &str, minutes: i64) -> Reminder {
        Reminder {
            method: method.to_string(),
            minutes,
        }
    }

    #[test]
    fn test_identical_events_are_equal() {
        let comparison = compare(&event(), &event());
        assert!(comparison.is_equal());
        assert_eq!(comparison.to_string(), "");
    }

    #[test]
    fn test_absent_and_blank_description_are_equal() {
        let target = event();
        let mut existing = event();
        existing.description = Some("   ".to_string());
        existing.summary = "Standup ".to_string();

        assert!(compare(&target, &existing).is_equal());
    }

    #[test]
    fn test_ids_and_attendees_are_ignored() {
        let target = event();
        let mut existing = event();
        existing.id = Some("abc".to_string());
        existing.attendees = vec![crate::destination::Attendee {
            email: "x@example.com".to_string(),
        }];

        assert!(compare(&target, &existing).is_equal());
    }

    #[test]
    fn test_same_instant_in_other_zone_is_equal() {
        let target = event();
        let mut existing = event();
        existing.start =
            EventDateTime::date_time(London.with_ymd_and_hms(2024, 1, 10, 14, 0, 0).unwrap());

        assert!(compare(&target, &existing).is_equal());
    }

    #[test]
    fn test_date_only_differs_from_midnight_date_time() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let mut target = event();
        target.start = EventDateTime::date(date);
        let mut existing = event();
        existing.start = EventDateTime::date_time(
            chrono_tz::UTC.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap(),
        );

        assert_eq!(compare(&target, &existing).differing, vec![EventField::Start]);
    }

    #[test]
    fn test_reminder_order_does_not_matter() {
        let mut target = event();
        target.reminders = Reminders {
            use_default: false,
            overrides: vec![reminder("popup", 10), reminder("email", 60)],
        };
        let mut existing = event();
        existing.reminders = Reminders {
            use_default: false,
            overrides: vec![reminder("email", 60), reminder("popup", 10)],
        };

        assert!(compare(&target, &existing).is_equal());

        existing.reminders.overrides[1].method = "email".to_string();
        assert_eq!(
            compare(&target, &existing).differing,
            vec![EventField::Reminders]
        );
    }

    #[test]
    fn test_reminder_count_mismatch() {
        let mut target = event();
        target.reminders.overrides = vec![reminder("popup", 10)];

        assert_eq!(
            compare(&target, &event()).differing,
            vec![EventField::Reminders]
        );
    }

    #[test]
    fn test_lists_every_differing_field() {
        let target = event();
        let mut existing = event();
        existing.summary = "Sync".to_string();
        existing.location = Some("Room 1".to_string());
        existing.set_nonce("n");
        existing.recurrence = vec!["RRULE:FREQ=DAILY".to_string()];
        existing.color_id = Some("3".to_string());

        let comparison = compare(&target, &existing);

        assert_eq!(
            comparison.differing,
            vec![
                EventField::Summary,
                EventField::Location,
                EventField::Nonce,
                EventField::Recurrence,
                EventField::ColorId,
            ]
        );
        assert_eq!(
            comparison.to_string(),
            "summary, location, nonce, recurrence, color id"
        );
    }

    #[test]
    fn test_recurrence_order_matters() {
        let mut target = event();
        target.recurrence = vec!["RRULE:FREQ=DAILY".into(), "EXDATE:20240112T090000".into()];
        let mut existing = event();
        existing.recurrence = vec!["EXDATE:20240112T090000".into(), "RRULE:FREQ=DAILY".into()];

        assert_eq!(
            compare(&target, &existing).differing,
            vec![EventField::Recurrence]
        );
    }
}
