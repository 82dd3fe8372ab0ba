//! Date/time literals used by `#<date>` tags and `:when` comparisons.
//!
//! Layouts are tried in order and the first one that parses wins. Everything
//! is computed in a fixed-offset zone built from the caller's hour offset.

use jiff::{
    Timestamp, Zoned,
    civil::{Date, DateTime, Time, Weekday},
    fmt::strtime,
    tz::{Offset, TimeZone},
};

/// Format used for `trigger_at_field` values.
pub const TRIGGER_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How far ahead a bare weekday name may land.
const WEEKDAY_LOOKAHEAD_DAYS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateTimeError {
    #[error("empty date literal")]
    Empty,
    #[error("timezone offset {hours}h is out of range")]
    InvalidOffset { hours: i8 },
    #[error("unrecognized date literal {0:?}")]
    Unrecognized(String),
}

#[derive(Clone, Copy)]
enum LayoutKind {
    DateTime,
    Date,
    Time,
}

struct Layout {
    format: &'static str,
    kind: LayoutKind,
    /// The literal carries no year: pick this year or the next one.
    infer_year: bool,
    /// Time of day takes part in the year inference comparison.
    has_time: bool,
}

const fn layout(format: &'static str, kind: LayoutKind, infer_year: bool) -> Layout {
    Layout {
        format,
        kind,
        infer_year,
        has_time: matches!(kind, LayoutKind::DateTime | LayoutKind::Time),
    }
}

const LAYOUTS: &[Layout] = &[
    layout("%Y-%m-%d,%H:%M:%S", LayoutKind::DateTime, false),
    layout("%Y-%m-%d,%H:%M", LayoutKind::DateTime, false),
    layout("%Y-%m-%d %H:%M:%S", LayoutKind::DateTime, false),
    layout("%Y-%m-%d %H:%M", LayoutKind::DateTime, false),
    layout("%Y/%m/%d,%H:%M", LayoutKind::DateTime, false),
    layout("%d/%m/%Y,%H:%M", LayoutKind::DateTime, false),
    layout("%m-%d,%H:%M:%S", LayoutKind::DateTime, true),
    layout("%m-%d,%H:%M", LayoutKind::DateTime, true),
    layout("%d/%m,%H:%M", LayoutKind::DateTime, true),
    layout("%Y-%m-%d", LayoutKind::Date, false),
    layout("%Y/%m/%d", LayoutKind::Date, false),
    layout("%d/%m/%Y", LayoutKind::Date, false),
    layout("%m-%d", LayoutKind::Date, true),
    layout("%d/%m", LayoutKind::Date, true),
    layout("%H:%M:%S", LayoutKind::Time, false),
    layout("%H:%M", LayoutKind::Time, false),
];

const WEEKDAYS: &[(&str, Weekday)] = &[
    ("mon", Weekday::Monday),
    ("monday", Weekday::Monday),
    ("tue", Weekday::Tuesday),
    ("tuesday", Weekday::Tuesday),
    ("wed", Weekday::Wednesday),
    ("wednesday", Weekday::Wednesday),
    ("thu", Weekday::Thursday),
    ("thursday", Weekday::Thursday),
    ("fri", Weekday::Friday),
    ("friday", Weekday::Friday),
    ("sat", Weekday::Saturday),
    ("saturday", Weekday::Saturday),
    ("sun", Weekday::Sunday),
    ("sunday", Weekday::Sunday),
];

/// Builds the fixed-offset zone for an hour offset.
pub fn fixed_zone(hours: i8) -> Result<TimeZone, DateTimeError> {
    let offset = Offset::from_hours(hours).map_err(|_| DateTimeError::InvalidOffset { hours })?;
    Ok(TimeZone::fixed(offset))
}

/// Renders an instant the way `trigger_at_field` stores it.
pub fn format_trigger_at(timestamp: Timestamp, tz: &TimeZone) -> String {
    timestamp.to_zoned(tz.clone()).strftime(TRIGGER_AT_FORMAT).to_string()
}

/// Interprets date literals relative to a captured "now".
#[derive(Debug, Clone)]
pub struct DateTimeParser {
    tz: TimeZone,
    now: Zoned,
}

impl DateTimeParser {
    pub fn new(offset_hours: i8) -> Result<Self, DateTimeError> {
        Self::with_now(offset_hours, Timestamp::now())
    }

    /// Same as [`DateTimeParser::new`] with an explicit clock, for
    /// deterministic results.
    pub fn with_now(offset_hours: i8, now: Timestamp) -> Result<Self, DateTimeError> {
        let tz = fixed_zone(offset_hours)?;
        let now = now.to_zoned(tz.clone());
        Ok(Self { tz, now })
    }

    pub fn timezone(&self) -> &TimeZone {
        &self.tz
    }

    pub fn now(&self) -> &Zoned {
        &self.now
    }

    pub fn parse(&self, input: &str) -> Result<Zoned, DateTimeError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(DateTimeError::Empty);
        }
        LAYOUTS
            .iter()
            .find_map(|layout| self.try_layout(layout, input))
            .or_else(|| self.try_weekday(input))
            .ok_or_else(|| DateTimeError::Unrecognized(input.to_string()))
    }

    fn try_layout(&self, layout: &Layout, input: &str) -> Option<Zoned> {
        let tm = strtime::parse(layout.format, input).ok()?;
        let time = match layout.kind {
            LayoutKind::Date => Time::midnight(),
            LayoutKind::DateTime | LayoutKind::Time => Time::new(
                tm.hour()?,
                tm.minute()?,
                tm.second().unwrap_or(0),
                0,
            )
            .ok()?,
        };
        let datetime = match layout.kind {
            LayoutKind::Time => self.next_occurrence(time)?,
            LayoutKind::Date | LayoutKind::DateTime => {
                let (month, day) = (tm.month()?, tm.day()?);
                if layout.infer_year {
                    self.infer_year(month, day, time, layout.has_time)?
                } else {
                    Date::new(tm.year()?, month, day).ok()?.to_datetime(time)
                }
            }
        };
        datetime.to_zoned(self.tz.clone()).ok()
    }

    /// This year if the month/day has not passed yet, next year otherwise.
    fn infer_year(&self, month: i8, day: i8, time: Time, has_time: bool) -> Option<DateTime> {
        let year = self.now.year();
        let candidate = Date::new(year, month, day).ok()?.to_datetime(time);
        let passed = if has_time {
            candidate < self.now.datetime()
        } else {
            candidate.date() < self.now.date()
        };
        if !passed {
            return Some(candidate);
        }
        Some(Date::new(year.checked_add(1)?, month, day).ok()?.to_datetime(time))
    }

    /// Today at `time`, or tomorrow when that clock time already went by.
    fn next_occurrence(&self, time: Time) -> Option<DateTime> {
        let today = self.now.date();
        if self.now.time() > time {
            Some(today.tomorrow().ok()?.to_datetime(time))
        } else {
            Some(today.to_datetime(time))
        }
    }

    /// `mon`, `Tuesday`, `fri,18:30` ...
    fn try_weekday(&self, input: &str) -> Option<Zoned> {
        let (name, clock) = match input.split_once(',') {
            Some((name, clock)) => (name, Some(clock.trim())),
            None => (input, None),
        };
        let lower = name.trim().to_lowercase();
        let weekday = WEEKDAYS
            .iter()
            .find(|(candidate, _)| *candidate == lower)
            .map(|(_, weekday)| *weekday)?;
        let time = match clock {
            None => Time::midnight(),
            Some(clock) => parse_clock(clock)?,
        };

        let mut date = self.now.date();
        for _ in 0..WEEKDAY_LOOKAHEAD_DAYS {
            if date.weekday() == weekday {
                return date.to_datetime(time).to_zoned(self.tz.clone()).ok();
            }
            date = date.tomorrow().ok()?;
        }
        None
    }
}

fn parse_clock(clock: &str) -> Option<Time> {
    ["%H:%M:%S", "%H:%M"].iter().find_map(|format| {
        let tm = strtime::parse(format, clock).ok()?;
        Time::new(tm.hour()?, tm.minute()?, tm.second().unwrap_or(0), 0).ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Wednesday 2026-10-14 15:30:00 at UTC+2.
    fn parser() -> DateTimeParser {
        let now: Timestamp = "2026-10-14T13:30:00Z".parse().unwrap();
        DateTimeParser::with_now(2, now).unwrap()
    }

    fn local(input: &str) -> String {
        parser()
            .parse(input)
            .unwrap()
            .strftime("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    #[test]
    fn full_date_and_time_layouts() {
        assert_eq!(local("2026-12-01,09:15"), "2026-12-01 09:15:00");
        assert_eq!(local("2026-12-01,09:15:42"), "2026-12-01 09:15:42");
        assert_eq!(local("2026-12-01 09:15"), "2026-12-01 09:15:00");
        assert_eq!(local("2027/01/02"), "2027-01-02 00:00:00");
        assert_eq!(local("03/02/2027"), "2027-02-03 00:00:00");
    }

    #[test]
    fn yearless_dates_roll_forward_once_passed() {
        assert_eq!(local("12-25"), "2026-12-25 00:00:00");
        assert_eq!(local("10-14"), "2026-10-14 00:00:00");
        assert_eq!(local("10-13"), "2027-10-13 00:00:00");
        assert_eq!(local("01/11"), "2026-11-01 00:00:00");
    }

    #[test]
    fn yearless_date_with_time_compares_the_clock_too() {
        assert_eq!(local("10-14,16:00"), "2026-10-14 16:00:00");
        assert_eq!(local("10-14,15:00"), "2027-10-14 15:00:00");
    }

    #[test]
    fn bare_time_is_today_or_tomorrow() {
        assert_eq!(local("18:00"), "2026-10-14 18:00:00");
        assert_eq!(local("15:30"), "2026-10-14 15:30:00");
        assert_eq!(local("09:00"), "2026-10-15 09:00:00");
    }

    #[test]
    fn weekday_names_search_forward() {
        assert_eq!(local("wed"), "2026-10-14 00:00:00");
        assert_eq!(local("Fri"), "2026-10-16 00:00:00");
        assert_eq!(local("tuesday,08:45"), "2026-10-20 08:45:00");
        assert_eq!(local("mon, 07:00:30"), "2026-10-19 07:00:30");
    }

    #[test]
    fn input_is_trimmed() {
        assert_eq!(local("  2026-11-11  "), "2026-11-11 00:00:00");
    }

    #[test]
    fn empty_and_garbage_are_errors() {
        assert!(matches!(parser().parse("   "), Err(DateTimeError::Empty)));
        assert!(matches!(
            parser().parse("someday"),
            Err(DateTimeError::Unrecognized(text)) if text == "someday"
        ));
        assert!(parser().parse("2026-02-30").is_err());
        assert!(parser().parse("blursday,10:00").is_err());
    }

    #[test]
    fn offsets_out_of_range_are_rejected() {
        assert!(matches!(
            DateTimeParser::new(30),
            Err(DateTimeError::InvalidOffset { hours: 30 })
        ));
    }

    #[test]
    fn trigger_format_round_trips() {
        let parser = parser();
        for literal in ["2026-12-01,09:15", "12-25", "18:00", "fri,10:00", "2027/01/02"] {
            let first = parser.parse(literal).unwrap();
            let formatted = format_trigger_at(first.timestamp(), parser.timezone());
            let second = parser.parse(&formatted).unwrap();
            assert_eq!(first.timestamp(), second.timestamp(), "{literal}");
        }
    }
}
