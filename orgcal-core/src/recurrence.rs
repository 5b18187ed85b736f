//! Recurrence rules for repeating headlines.
//!
//! Turns raw repeat metadata (the org repeater plus `COUNT`, `UNTIL`,
//! `EX_DATES`, `OG_START`, `OG_END` properties) into a normalized
//! descriptor, and renders it as RRULE/EXDATE lines.
//!
//! Unparsable optional values are dropped, never reported as errors.

use std::fmt;

use chrono::{DateTime, Duration, Months, NaiveDateTime};
use chrono_tz::Tz;

use crate::event::{EventDate, localize};
use crate::timestamp::parse_event_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatUnit {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl RepeatUnit {
    /// Parse an org unit character (`h`, `d`, `w`, `m`, `y`).
    pub fn from_org_char(c: char) -> Option<Self> {
        match c {
            'h' => Some(RepeatUnit::Hour),
            'd' => Some(RepeatUnit::Day),
            'w' => Some(RepeatUnit::Week),
            'm' => Some(RepeatUnit::Month),
            'y' => Some(RepeatUnit::Year),
            _ => None,
        }
    }

    /// RRULE `FREQ` token.
    pub fn frequency(self) -> &'static str {
        match self {
            RepeatUnit::Hour => "HOURLY",
            RepeatUnit::Day => "DAILY",
            RepeatUnit::Week => "WEEKLY",
            RepeatUnit::Month => "MONTHLY",
            RepeatUnit::Year => "YEARLY",
        }
    }

    /// Step `at` forward by `n` units.
    ///
    /// Hours are exact durations; days and longer keep the wall-clock time,
    /// and months clamp to the end of shorter months.
    pub fn advance(self, at: DateTime<Tz>, n: u32) -> Option<DateTime<Tz>> {
        match self {
            RepeatUnit::Hour => at.checked_add_signed(Duration::hours(n.into())),
            _ => localize(at.timezone(), self.step_wall_clock(at.naive_local(), n)?),
        }
    }

    fn step_wall_clock(self, local: NaiveDateTime, n: u32) -> Option<NaiveDateTime> {
        match self {
            RepeatUnit::Hour => local.checked_add_signed(Duration::hours(n.into())),
            RepeatUnit::Day => local.checked_add_days(chrono::Days::new(n.into())),
            RepeatUnit::Week => local.checked_add_days(chrono::Days::new(u64::from(n) * 7)),
            RepeatUnit::Month => local.checked_add_months(Months::new(n)),
            RepeatUnit::Year => local.checked_add_months(Months::new(n.checked_mul(12)?)),
        }
    }
}

impl fmt::Display for RepeatUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.frequency())
    }
}

/// Raw repeat metadata as found on the headline, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceSpec {
    pub unit: RepeatUnit,
    pub interval: u32,
    /// Explicit number of occurrences
    pub count: Option<String>,
    /// Last allowed occurrence (inclusive)
    pub until: Option<String>,
    pub exclusions: Vec<String>,
    pub original_start: Option<String>,
    pub original_end: Option<String>,
}

impl RecurrenceSpec {
    pub fn new(unit: RepeatUnit, interval: u32) -> Self {
        RecurrenceSpec {
            unit,
            interval,
            count: None,
            until: None,
            exclusions: Vec::new(),
            original_start: None,
            original_end: None,
        }
    }
}

/// A normalized recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceDescriptor {
    /// Anchor occurrence, used as the rule's DTSTART
    pub original_start: EventDate,
    pub original_end: Option<EventDate>,
    pub unit: RepeatUnit,
    pub interval: u32,
    /// `None` repeats forever
    pub count: Option<u32>,
    pub excluded: Vec<DateTime<Tz>>,
}

impl RecurrenceDescriptor {
    /// Resolve raw metadata against the event's own start/end.
    ///
    /// Timestamps in the metadata are read as wall-clock time in `zone`.
    pub fn resolve(
        repeat: &RecurrenceSpec,
        start: &EventDate,
        end: Option<&EventDate>,
        zone: Tz,
    ) -> Self {
        let original_start = repeat
            .original_start
            .as_deref()
            .and_then(|s| parse_event_date(s, zone))
            .unwrap_or_else(|| start.clone());
        let original_end = repeat
            .original_end
            .as_deref()
            .and_then(|s| parse_event_date(s, zone))
            .or_else(|| end.cloned());

        let interval = repeat.interval.max(1);

        let count = repeat
            .count
            .as_deref()
            .and_then(|c| c.trim().parse().ok())
            .or_else(|| {
                let until = parse_event_date(repeat.until.as_deref()?, zone)?;
                Some(count_until(&original_start.at, &until.at, repeat.unit, interval))
            });

        let excluded = repeat
            .exclusions
            .iter()
            .filter_map(|raw| {
                let date = parse_event_date(raw, zone)?;
                if date.has_time {
                    Some(date.at)
                } else {
                    let time = original_start.at.time();
                    localize(date.zone(), date.date().and_time(time))
                }
            })
            .collect();

        RecurrenceDescriptor {
            original_start,
            original_end,
            unit: repeat.unit,
            interval,
            count,
            excluded,
        }
    }

    /// The RRULE value, e.g. `FREQ=WEEKLY;INTERVAL=2;COUNT=5`.
    pub fn rule(&self) -> String {
        let mut rule = format!("FREQ={}", self.unit.frequency());
        if self.interval != 1 {
            rule.push_str(&format!(";INTERVAL={}", self.interval));
        }
        if let Some(count) = self.count {
            rule.push_str(&format!(";COUNT={}", count));
        }
        rule
    }

    /// Excluded occurrences as one comma-joined list, in the anchor's zone.
    pub fn exclusion_list(&self) -> Option<String> {
        if self.excluded.is_empty() {
            return None;
        }

        let zone = self.original_start.zone();
        let dates: Vec<String> = self
            .excluded
            .iter()
            .map(|d| d.with_timezone(&zone).format("%Y%m%dT%H%M%S").to_string())
            .collect();
        Some(dates.join(","))
    }

    /// Recurrence lines in calendar API form: the rule line, then exclusions.
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("RRULE:{}", self.rule())];
        if let Some(exdates) = self.exclusion_list() {
            lines.push(format!("EXDATE:{}", exdates));
        }
        lines
    }
}

/// Number of occurrences from `start` up to and including `until`.
///
/// Calendar steps advance a wall-clock cursor, so an occurrence pushed
/// forward by a DST gap doesn't drag the following ones with it.
fn count_until(start: &DateTime<Tz>, until: &DateTime<Tz>, unit: RepeatUnit, interval: u32) -> u32 {
    let zone = start.timezone();
    let mut wall = start.naive_local();
    let mut current = *start;
    let mut count = 0;
    while current <= *until {
        count += 1;
        let next = match unit {
            RepeatUnit::Hour => unit.advance(current, interval),
            _ => unit.step_wall_clock(wall, interval).and_then(|stepped| {
                wall = stepped;
                localize(zone, stepped)
            }),
        };
        match next {
            Some(next) => current = next,
            None => break,
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Berlin;

    fn nine_am(day: u32) -> EventDate {
        EventDate::timed(Berlin.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap())
    }

    #[test]
    fn test_rule_omits_default_interval_and_missing_count() {
        let repeat = RecurrenceSpec::new(RepeatUnit::Week, 1);
        let descriptor = RecurrenceDescriptor::resolve(&repeat, &nine_am(10), None, Berlin);

        assert_eq!(descriptor.count, None);
        assert_eq!(descriptor.to_lines(), vec!["RRULE:FREQ=WEEKLY".to_string()]);
    }

    #[test]
    fn test_explicit_count_wins_over_until() {
        let mut repeat = RecurrenceSpec::new(RepeatUnit::Day, 2);
        repeat.count = Some("4".to_string());
        repeat.until = Some("2024-12-31".to_string());

        let descriptor = RecurrenceDescriptor::resolve(&repeat, &nine_am(10), None, Berlin);

        assert_eq!(descriptor.rule(), "FREQ=DAILY;INTERVAL=2;COUNT=4");
    }

    #[test]
    fn test_until_is_inclusive() {
        let mut repeat = RecurrenceSpec::new(RepeatUnit::Week, 1);
        repeat.until = Some("2024-01-31 09:00".to_string());

        // 10th, 17th, 24th, 31st
        let descriptor = RecurrenceDescriptor::resolve(&repeat, &nine_am(10), None, Berlin);
        assert_eq!(descriptor.count, Some(4));

        repeat.until = Some("2024-01-31 08:59".to_string());
        let descriptor = RecurrenceDescriptor::resolve(&repeat, &nine_am(10), None, Berlin);
        assert_eq!(descriptor.count, Some(3));
    }

    #[test]
    fn test_month_steps_are_cumulative() {
        let start = EventDate::timed(Berlin.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap());
        let mut repeat = RecurrenceSpec::new(RepeatUnit::Month, 1);
        // Jan 31 -> Feb 29 -> Mar 29 -> Apr 29
        repeat.until = Some("2024-03-30".to_string());

        let descriptor = RecurrenceDescriptor::resolve(&repeat, &start, None, Berlin);
        assert_eq!(descriptor.count, Some(3));
    }

    #[test]
    fn test_unparsable_values_are_dropped() {
        let mut repeat = RecurrenceSpec::new(RepeatUnit::Day, 1);
        repeat.count = Some("many".to_string());
        repeat.until = Some("someday".to_string());
        repeat.exclusions = vec!["nope".to_string(), "2024-01-12".to_string()];
        repeat.original_start = Some("garbage".to_string());

        let descriptor = RecurrenceDescriptor::resolve(&repeat, &nine_am(10), None, Berlin);

        assert_eq!(descriptor.count, None);
        assert_eq!(descriptor.original_start, nine_am(10));
        assert_eq!(descriptor.excluded.len(), 1);
    }

    #[test]
    fn test_date_only_exclusions_take_anchor_time() {
        let mut repeat = RecurrenceSpec::new(RepeatUnit::Day, 1);
        repeat.exclusions = vec!["2024-01-12".to_string(), "2024-01-14 18:30".to_string()];

        let descriptor = RecurrenceDescriptor::resolve(&repeat, &nine_am(10), None, Berlin);

        assert_eq!(
            descriptor.to_lines(),
            vec![
                "RRULE:FREQ=DAILY".to_string(),
                "EXDATE:20240112T090000,20240114T183000".to_string(),
            ]
        );
    }

    #[test]
    fn test_original_start_override() {
        let mut repeat = RecurrenceSpec::new(RepeatUnit::Week, 1);
        repeat.original_start = Some("<2024-01-03 Wed 09:00>".to_string());
        repeat.original_end = Some("<2024-01-03 Wed 10:00>".to_string());

        let descriptor =
            RecurrenceDescriptor::resolve(&repeat, &nine_am(10), Some(&nine_am(10)), Berlin);

        assert_eq!(descriptor.original_start, nine_am(3));
        assert_eq!(
            descriptor.original_end.map(|e| e.at),
            Some(Berlin.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_day_steps_keep_wall_clock_across_dst() {
        // Berlin switches to summer time on 2024-03-31
        let before = Berlin.with_ymd_and_hms(2024, 3, 30, 9, 0, 0).unwrap();
        let after = RepeatUnit::Day.advance(before, 1).unwrap();

        assert_eq!(after, Berlin.with_ymd_and_hms(2024, 3, 31, 9, 0, 0).unwrap());
        assert_eq!(
            RepeatUnit::Hour.advance(before, 24).unwrap(),
            Berlin.with_ymd_and_hms(2024, 3, 31, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_until_count_crosses_spring_forward() {
        let start = EventDate::timed(Berlin.with_ymd_and_hms(2024, 3, 29, 2, 30, 0).unwrap());
        let mut repeat = RecurrenceSpec::new(RepeatUnit::Day, 1);
        repeat.until = Some("2024-04-05 02:30".to_string());

        // 29th through 5th; the 31st lands at 03:30 and the 1st is back at 02:30
        let descriptor = RecurrenceDescriptor::resolve(&repeat, &start, None, Berlin);
        assert_eq!(descriptor.count, Some(8));
    }

    #[test]
    fn test_day_step_into_gap_moves_forward() {
        let before = Berlin.with_ymd_and_hms(2024, 3, 30, 2, 30, 0).unwrap();

        assert_eq!(
            RepeatUnit::Day.advance(before, 1).unwrap(),
            Berlin.with_ymd_and_hms(2024, 3, 31, 3, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_date_only_exclusion_in_gap_is_kept() {
        let start = EventDate::timed(Berlin.with_ymd_and_hms(2024, 3, 29, 2, 30, 0).unwrap());
        let mut repeat = RecurrenceSpec::new(RepeatUnit::Day, 1);
        repeat.exclusions = vec!["2024-03-31".to_string()];

        let descriptor = RecurrenceDescriptor::resolve(&repeat, &start, None, Berlin);

        assert_eq!(
            descriptor.to_lines(),
            vec![
                "RRULE:FREQ=DAILY".to_string(),
                "EXDATE:20240331T033000".to_string(),
            ]
        );
    }
}
