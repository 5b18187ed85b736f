//! Translating source events into destination payloads.

use chrono::{Days, Duration};

use crate::destination::{Attendee, DestinationEvent, EventDateTime, Reminder, Reminders};
use crate::event::{EventDate, SourceEvent};

pub trait ToDestination {
    fn to_destination(&self) -> DestinationEvent;
}

impl ToDestination for SourceEvent {
    fn to_destination(&self) -> DestinationEvent {
        let recurrence = self.recurrence();

        let (start, end) = match &recurrence {
            Some(descriptor) => (
                &descriptor.original_start,
                descriptor.original_end.as_ref(),
            ),
            None => (&self.start, self.end.as_ref()),
        };

        let mut payload = DestinationEvent::new(
            self.summary(),
            EventDateTime::from(start),
            end_time(start, end),
        );

        let description = self.description.trim();
        if !description.is_empty() {
            payload.description = Some(description.to_string());
        }

        payload.reminders = Reminders {
            use_default: false,
            overrides: self
                .reminder_offset_minutes
                .map(|minutes| Reminder {
                    method: "popup".to_string(),
                    minutes,
                })
                .into_iter()
                .collect(),
        };

        payload.location = self.location.clone();
        payload.color_id = self.color.clone();

        if let Some(nonce) = &self.nonce {
            payload.set_nonce(nonce.clone());
        }

        if let Some(descriptor) = &recurrence {
            payload.recurrence = descriptor.to_lines();
        }

        payload.attendees = self
            .attendees
            .iter()
            .map(|email| Attendee {
                email: email.clone(),
            })
            .collect();

        payload
    }
}

/// Timed events default to one hour; whole-day ends are exclusive, so the
/// day after the given (or start) date.
fn end_time(start: &EventDate, end: Option<&EventDate>) -> EventDateTime {
    if start.has_time {
        match end {
            Some(end) => EventDateTime::from(end),
            None => EventDateTime::date_time(start.at + Duration::hours(1)),
        }
    } else {
        let last_day = end.unwrap_or(start).date();
        let exclusive = last_day.checked_add_days(Days::new(1)).unwrap_or(last_day);
        EventDateTime::date(exclusive)
    }
}
