//! Org timestamp parsing.
//!
//! Handles the subset of org timestamps that matter for scheduling:
//!
//! - `<2024-01-10 Wed>` / `[2024-01-10 Wed]`
//! - `<2024-01-10 Wed 09:00>` and same-day ranges `<2024-01-10 Wed 09:00-10:30>`
//! - repeaters `+1w`, `++2d`, `.+1m`
//! - warning delays `-2d`, `--1h`
//! - multi-day ranges `<2024-01-10 Wed>--<2024-01-12 Fri>`
//!
//! Anything else yields `None` and is treated as absent by callers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;

use crate::event::{EventDate, localize};
use crate::recurrence::RepeatUnit;

/// A count of calendar units, as used by repeaters and warning delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub value: u32,
    pub unit: RepeatUnit,
}

impl Interval {
    /// Parse `1w`, `12h`, etc. Leading marker characters must already be stripped.
    fn parse(s: &str) -> Option<Self> {
        let unit_char = s.chars().last()?;
        let digits = &s[..s.len() - unit_char.len_utf8()];
        let value = digits.parse().ok()?;
        let unit = RepeatUnit::from_org_char(unit_char)?;
        Some(Interval { value, unit })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgTimestamp {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    /// End time of a same-day range (`09:00-10:30`)
    pub end_time: Option<NaiveTime>,
    pub repeater: Option<Interval>,
    /// Warning period before the timestamp
    pub delay: Option<Interval>,
}

impl OrgTimestamp {
    /// Parse a single bracketed timestamp (`<...>` or `[...]`).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let inner = s
            .strip_prefix('<')
            .and_then(|r| r.strip_suffix('>'))
            .or_else(|| s.strip_prefix('[').and_then(|r| r.strip_suffix(']')))?;

        let mut tokens = inner.split_whitespace();
        let date = NaiveDate::parse_from_str(tokens.next()?, "%Y-%m-%d").ok()?;

        let mut timestamp = OrgTimestamp {
            date,
            time: None,
            end_time: None,
            repeater: None,
            delay: None,
        };

        for token in tokens {
            if let Some(rest) = token
                .strip_prefix("++")
                .or_else(|| token.strip_prefix(".+"))
                .or_else(|| token.strip_prefix('+'))
            {
                timestamp.repeater = Some(Interval::parse(rest)?);
            } else if let Some(rest) = token
                .strip_prefix("--")
                .or_else(|| token.strip_prefix('-'))
            {
                timestamp.delay = Some(Interval::parse(rest)?);
            } else if token.starts_with(|c: char| c.is_ascii_digit()) {
                let (start, end) = match token.split_once('-') {
                    Some((start, end)) => (start, Some(end)),
                    None => (token, None),
                };
                timestamp.time = Some(parse_time(start)?);
                timestamp.end_time = match end {
                    Some(end) => Some(parse_time(end)?),
                    None => None,
                };
            } else if !token.chars().all(char::is_alphabetic) {
                return None;
            }
            // Day names are informational only
        }

        Some(timestamp)
    }

    /// The start of this timestamp as an instant in `zone`.
    pub fn start_in(&self, zone: Tz) -> Option<EventDate> {
        match self.time {
            Some(time) => localize(zone, self.date.and_time(time)).map(EventDate::timed),
            None => EventDate::all_day(self.date, zone),
        }
    }

    /// The end of a same-day time range (`09:00-10:30`), if any.
    pub fn end_in(&self, zone: Tz) -> Option<EventDate> {
        let end_time = self.end_time?;
        localize(zone, self.date.and_time(end_time)).map(EventDate::timed)
    }
}

/// The value of a `SCHEDULED:` planning entry: a timestamp or a range of two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduled {
    pub start: OrgTimestamp,
    pub end: Option<OrgTimestamp>,
}

impl Scheduled {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        match s.split_once("--") {
            // A range is `<..>--<..>`; a bare `--` inside brackets is a delay
            Some((start, end)) if start.ends_with(['>', ']']) => Some(Scheduled {
                start: OrgTimestamp::parse(start)?,
                end: Some(OrgTimestamp::parse(end)?),
            }),
            _ => Some(Scheduled {
                start: OrgTimestamp::parse(s)?,
                end: None,
            }),
        }
    }
}

/// Parse a free-form timestamp value such as a property (`UNTIL`, `EX_DATES`).
///
/// Accepts org timestamps, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]`,
/// `YYYY-MM-DDTHH:MM[:SS]` (all read as wall-clock time in `zone`), and
/// RFC 3339 (converted into `zone`).
pub fn parse_event_date(s: &str, zone: Tz) -> Option<EventDate> {
    let s = s.trim();

    if s.starts_with(['<', '[']) {
        return OrgTimestamp::parse(s)?.start_in(zone);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(EventDate::timed(dt.with_timezone(&zone)));
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for format in FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return localize(zone, naive).map(EventDate::timed);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| EventDate::all_day(date, zone))
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use chrono_tz::America::New_York;

    #[test]
    fn test_parse_timed_with_repeater_and_delay() {
        let ts = OrgTimestamp::parse("<2024-01-10 Wed 09:00 +1w -2d>").unwrap();

        assert_eq!(ts.date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(ts.time, NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(ts.end_time, None);
        assert_eq!(
            ts.repeater,
            Some(Interval {
                value: 1,
                unit: RepeatUnit::Week
            })
        );
        assert_eq!(
            ts.delay,
            Some(Interval {
                value: 2,
                unit: RepeatUnit::Day
            })
        );
    }

    #[test]
    fn test_parse_same_day_range() {
        let ts = OrgTimestamp::parse("<2024-01-10 Wed 9:00-10:30>").unwrap();

        assert_eq!(ts.time, NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(ts.end_time, NaiveTime::from_hms_opt(10, 30, 0));

        let end = ts.end_in(New_York).unwrap();
        assert!(end.has_time);
        assert_eq!(end.at.hour(), 10);
        assert_eq!(end.at.minute(), 30);
    }

    #[test]
    fn test_parse_date_only_and_inactive() {
        let ts = OrgTimestamp::parse("[2024-02-29 Thu]").unwrap();
        assert_eq!(ts.time, None);

        let start = ts.start_in(New_York).unwrap();
        assert!(!start.has_time);
        assert_eq!(start.at.to_rfc3339(), "2024-02-29T00:00:00-05:00");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(OrgTimestamp::parse("2024-01-10"), None);
        assert_eq!(OrgTimestamp::parse("<not a date>"), None);
        assert_eq!(OrgTimestamp::parse("<2024-01-10 Wed 25:99>"), None);
        assert_eq!(OrgTimestamp::parse("<2024-01-10 Wed +1q>"), None);
    }

    #[test]
    fn test_scheduled_range() {
        let scheduled = Scheduled::parse("<2024-01-10 Wed>--<2024-01-12 Fri>").unwrap();

        assert_eq!(scheduled.start.date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(
            scheduled.end.map(|e| e.date),
            NaiveDate::from_ymd_opt(2024, 1, 12)
        );
    }

    #[test]
    fn test_scheduled_with_double_dash_delay_is_not_a_range() {
        let scheduled = Scheduled::parse("<2024-01-10 Wed 09:00 --1h>").unwrap();

        assert_eq!(scheduled.end, None);
        assert_eq!(
            scheduled.start.delay,
            Some(Interval {
                value: 1,
                unit: RepeatUnit::Hour
            })
        );
    }

    #[test]
    fn test_parse_event_date_formats() {
        let date_only = parse_event_date("2024-03-01", New_York).unwrap();
        assert!(!date_only.has_time);

        let spaced = parse_event_date("2024-03-01 14:30", New_York).unwrap();
        assert!(spaced.has_time);
        assert_eq!(spaced.at.hour(), 14);

        let iso = parse_event_date("2024-03-01T14:30:15", New_York).unwrap();
        assert_eq!(iso.at.second(), 15);

        let rfc = parse_event_date("2024-03-01T19:30:00Z", New_York).unwrap();
        assert_eq!(rfc.at.hour(), 14, "UTC instant is converted into the zone");

        let org = parse_event_date("<2024-03-01 Fri 08:00>", New_York).unwrap();
        assert_eq!(org.at.hour(), 8);

        assert_eq!(parse_event_date("next tuesday", New_York), None);
    }
}
