//! Destination events in the calendar API's JSON shape.
//!
//! Fetched events and computed target payloads share this type, so a payload
//! can be sent to the provider verbatim and compared field by field against
//! what was fetched.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::event::EventDate;

pub const NONCE_PROPERTY: &str = "nonce";

/// A start or end value: a whole day, or an instant with an optional zone name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventDateTime {
    DateTime {
        #[serde(rename = "dateTime")]
        date_time: DateTime<FixedOffset>,
        #[serde(rename = "timeZone", default, skip_serializing_if = "Option::is_none")]
        time_zone: Option<String>,
    },
    Date {
        date: NaiveDate,
    },
}

impl EventDateTime {
    pub fn date(date: NaiveDate) -> Self {
        EventDateTime::Date { date }
    }

    pub fn date_time(at: DateTime<Tz>) -> Self {
        EventDateTime::DateTime {
            date_time: at.fixed_offset(),
            time_zone: Some(at.timezone().name().to_string()),
        }
    }

    #[cfg(test)]
    fn is_all_day(&self) -> bool {
        matches!(self, EventDateTime::Date { .. })
    }

    /// The instant this value denotes. Dates are midnight in `zone`.
    pub fn instant(&self, zone: Tz) -> Option<DateTime<Tz>> {
        match self {
            EventDateTime::DateTime { date_time, .. } => Some(date_time.with_timezone(&zone)),
            EventDateTime::Date { date } => EventDate::all_day(*date, zone).map(|d| d.at),
        }
    }
}

/// Normalized display form.
///
/// Instants are shown in UTC so equal instants with different offsets or zone
/// names look the same; dates keep their date-only form.
impl fmt::Display for EventDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventDateTime::DateTime { date_time, .. } => write!(
                f,
                "{}",
                date_time.with_timezone(&Utc).format("%Y-%m-%dT%H:%M:%SZ")
            ),
            EventDateTime::Date { date } => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl From<&EventDate> for EventDateTime {
    fn from(date: &EventDate) -> Self {
        if date.has_time {
            EventDateTime::date_time(date.at)
        } else {
            EventDateTime::date(date.date())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub method: String,
    pub minutes: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    #[serde(default)]
    pub use_default: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<Reminder>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedProperties {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub private: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
}

/// One calendar event as the provider sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationEvent {
    /// Absent until the provider has created the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    #[serde(default)]
    pub reminders: Reminders,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_properties: Option<ExtendedProperties>,
    /// RRULE/EXDATE lines, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recurrence: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<Attendee>,
}

impl DestinationEvent {
    pub fn new(summary: impl Into<String>, start: EventDateTime, end: EventDateTime) -> Self {
        DestinationEvent {
            id: None,
            summary: summary.into(),
            description: None,
            start,
            end,
            reminders: Reminders::default(),
            location: None,
            extended_properties: None,
            recurrence: Vec::new(),
            color_id: None,
            attendees: Vec::new(),
        }
    }

    pub fn nonce(&self) -> Option<&str> {
        self.extended_properties
            .as_ref()?
            .private
            .get(NONCE_PROPERTY)
            .map(String::as_str)
    }

    pub fn set_nonce(&mut self, nonce: impl Into<String>) {
        self.extended_properties
            .get_or_insert_with(ExtendedProperties::default)
            .private
            .insert(NONCE_PROPERTY.to_string(), nonce.into());
    }
}

impl fmt::Display for DestinationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.summary, self.start)
    }
}
