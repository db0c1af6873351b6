//! Free-text date expressions ("2024-01-08", "3 weeks ago", "yesterday").
//!
//! Relative forms are resolved against the caller-supplied `now`, so the
//! parser itself never reads a clock. Failures come back as [`ParseFailure`]
//! carrying the rejected input.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

use crate::error::ParseFailure;
use crate::time::granularity::{shift, Granularity};

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Clone, Copy)]
enum Unit {
    Minutes,
    Hours,
    Calendar(Granularity),
}

fn parse_unit(s: &str) -> Option<Unit> {
    let u = match s {
        "minute" | "minutes" | "min" | "mins" => Unit::Minutes,
        "hour" | "hours" | "hr" | "hrs" => Unit::Hours,
        "day" | "days" => Unit::Calendar(Granularity::Day),
        "week" | "weeks" => Unit::Calendar(Granularity::Week),
        "month" | "months" => Unit::Calendar(Granularity::Month),
        "year" | "years" => Unit::Calendar(Granularity::Year),
        _ => return None,
    };
    Some(u)
}

fn parse_count(s: &str) -> Option<i64> {
    match s {
        "a" | "an" | "one" => Some(1),
        _ => s.parse::<u32>().ok().map(i64::from),
    }
}

fn start_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive().and_time(chrono::NaiveTime::MIN).and_utc()
}

fn offset(now: DateTime<Utc>, unit: Unit, delta: i64) -> Option<DateTime<Utc>> {
    match unit {
        Unit::Minutes => now.checked_add_signed(TimeDelta::try_minutes(delta)?),
        Unit::Hours => now.checked_add_signed(TimeDelta::try_hours(delta)?),
        Unit::Calendar(g) => shift(now, g, delta).ok(),
    }
}

fn parse_relative(s: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let words: Vec<&str> = s.split_whitespace().collect();
    match words.as_slice() {
        [n, unit, "ago"] => offset(now, parse_unit(unit)?, -parse_count(n)?),
        ["in", n, unit] => offset(now, parse_unit(unit)?, parse_count(n)?),
        [n, unit, "from", "now"] => offset(now, parse_unit(unit)?, parse_count(n)?),
        ["last", unit] => offset(now, parse_unit(unit)?, -1),
        ["next", unit] => offset(now, parse_unit(unit)?, 1),
        _ => None,
    }
}

fn parse_absolute(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(t.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// Parse `text` into an instant, resolving relative forms against `now`.
pub fn parse_date_expression(text: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ParseFailure> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseFailure::new(text, "empty expression"));
    }

    if let Some(t) = parse_absolute(trimmed) {
        return Ok(t);
    }

    let lower = trimmed.to_ascii_lowercase();
    let today = start_of_day(now);
    let keyword = match lower.as_str() {
        "now" => Some(now),
        "today" => Some(today),
        "yesterday" => offset(today, Unit::Calendar(Granularity::Day), -1),
        "tomorrow" => offset(today, Unit::Calendar(Granularity::Day), 1),
        _ => None,
    };
    if let Some(t) = keyword {
        return Ok(t);
    }

    parse_relative(&lower, now).ok_or_else(|| {
        tracing::trace!(input = %text, "unrecognized date expression");
        ParseFailure::new(text, "unrecognized date expression")
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap()
    }

    #[test]
    fn keywords_resolve_against_now() {
        let today = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(parse_date_expression("now", now()).unwrap(), now());
        assert_eq!(parse_date_expression("Today", now()).unwrap(), today);
        assert_eq!(
            parse_date_expression(" yesterday ", now()).unwrap(),
            today - TimeDelta::days(1)
        );
    }

    #[test]
    fn last_and_next_step_one_unit() {
        assert_eq!(
            parse_date_expression("last month", now()).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 15, 10, 30, 0).unwrap()
        );
        assert_eq!(
            parse_date_expression("next hour", now()).unwrap(),
            now() + TimeDelta::hours(1)
        );
    }

    #[test]
    fn failure_keeps_the_input() {
        let err = parse_date_expression("the day after never", now()).unwrap_err();
        assert_eq!(err.input, "the day after never");
    }
}
