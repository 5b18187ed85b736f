//! Date range for fetching calendar events.

use chrono::{DateTime, Days, Months, Utc};
use chrono_tz::Tz;

use crate::event::EventDate;

/// Date range for fetching events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    /// The window around today, in local days of `zone`:
    /// from `past_months` ago (plus a day) to `future_months` ahead.
    pub fn fetch_window(now: DateTime<Utc>, past_months: u32, future_months: u32, zone: Tz) -> Self {
        let today = now.with_timezone(&zone).date_naive();

        let from = today
            .checked_sub_months(Months::new(past_months))
            .and_then(|d| d.checked_add_days(Days::new(1)))
            .unwrap_or(today);
        let to = today
            .checked_add_months(Months::new(future_months))
            .unwrap_or(today);

        let midnight = |date| {
            EventDate::all_day(date, zone)
                .map(|d| d.at.with_timezone(&Utc))
                .unwrap_or(now)
        };

        DateRange {
            from: midnight(from),
            to: midnight(to),
        }
    }

    pub fn from_rfc3339(&self) -> String {
        self.from.to_rfc3339()
    }

    pub fn to_rfc3339(&self) -> String {
        self.to.to_rfc3339()
    }
}
