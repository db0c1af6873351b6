//! Human-readable duration expressions ("5 hours", "1d", "250ms", "1.5 h").
//!
//! Parsing rules:
//! - A bare number is milliseconds.
//! - Otherwise `<number>[ ]<unit>`, case-insensitive, fractional numbers allowed.
//! - Negative values and unknown units are rejected; nothing panics.

use crate::error::{MetricaError, Result};

pub const SECOND_MS: u64 = 1_000;
pub const MINUTE_MS: u64 = 60 * SECOND_MS;
pub const HOUR_MS: u64 = 60 * MINUTE_MS;
pub const DAY_MS: u64 = 24 * HOUR_MS;
pub const WEEK_MS: u64 = 7 * DAY_MS;
/// 365.25 days.
pub const YEAR_MS: u64 = 365 * DAY_MS + DAY_MS / 4;

const MAX_INPUT_LEN: usize = 100;

fn unit_ms(unit: &str) -> Option<u64> {
    let ms = match unit {
        "" | "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1,
        "s" | "sec" | "secs" | "second" | "seconds" => SECOND_MS,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE_MS,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR_MS,
        "d" | "day" | "days" => DAY_MS,
        "w" | "week" | "weeks" => WEEK_MS,
        "y" | "yr" | "yrs" | "year" | "years" => YEAR_MS,
        _ => return None,
    };
    Some(ms)
}

/// Parse a duration expression into milliseconds.
pub fn parse_duration_ms(text: &str) -> Result<u64> {
    let bad = |why: &str| MetricaError::InvalidArgument(format!("invalid duration {text:?}: {why}"));

    let s = text.trim().to_ascii_lowercase();
    if s.is_empty() {
        return Err(bad("empty"));
    }
    if s.len() > MAX_INPUT_LEN {
        return Err(bad("too long"));
    }

    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (num, unit) = s.split_at(split);

    if num.is_empty() {
        return Err(bad("missing number"));
    }
    if num.matches('.').count() > 1 || num == "." {
        return Err(bad("malformed number"));
    }

    let n: f64 = num.parse().map_err(|_| bad("malformed number"))?;
    let mult = unit_ms(unit.trim()).ok_or_else(|| bad("unknown unit"))?;

    let ms = (n * mult as f64).round();
    if !ms.is_finite() || ms > u64::MAX as f64 {
        return Err(bad("out of range"));
    }
    Ok(ms as u64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn window_defaults_parse_to_expected_millis() {
        assert_eq!(parse_duration_ms("5 hours").unwrap(), 5 * HOUR_MS);
        assert_eq!(parse_duration_ms("1 day").unwrap(), DAY_MS);
        assert_eq!(parse_duration_ms("3 days").unwrap(), 3 * DAY_MS);
        assert_eq!(parse_duration_ms("5 days").unwrap(), 5 * DAY_MS);
    }

    #[test]
    fn short_units_and_bare_numbers() {
        assert_eq!(parse_duration_ms("100").unwrap(), 100);
        assert_eq!(parse_duration_ms("250ms").unwrap(), 250);
        assert_eq!(parse_duration_ms("2s").unwrap(), 2_000);
        assert_eq!(parse_duration_ms("1.5h").unwrap(), 90 * MINUTE_MS);
        assert_eq!(parse_duration_ms(" 1W ").unwrap(), WEEK_MS);
        assert_eq!(parse_duration_ms("1y").unwrap(), YEAR_MS);
        assert_eq!(parse_duration_ms(".5s").unwrap(), 500);
    }

    #[test]
    fn rejects_garbage() {
        for s in ["", "abc", "-5s", "5 fortnights", "1..2s", "."] {
            let err = parse_duration_ms(s).unwrap_err();
            assert_eq!(err.code().as_str(), "INVALID_ARGUMENT", "input={s:?}");
        }
    }
}
