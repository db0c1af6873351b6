//! Calendar granularities and date shifting.
//!
//! Day and week steps are fixed 24h / 168h offsets. Month and year steps use
//! calendar month arithmetic and clamp to the last valid day of the target
//! month (Jan 31 + 1 month = Feb 28/29).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Months, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MetricaError, Result};

/// Calendar unit used to step "N units ago".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Year,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
        }
    }

    /// Name of the window-table slot for this unit (`daily`, `weekly`, ...).
    pub fn window_label(self) -> &'static str {
        match self {
            Granularity::Day => "daily",
            Granularity::Week => "weekly",
            Granularity::Month => "monthly",
            Granularity::Year => "yearly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = MetricaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "days" | "daily" => Ok(Granularity::Day),
            "week" | "weeks" | "weekly" => Ok(Granularity::Week),
            "month" | "months" | "monthly" => Ok(Granularity::Month),
            "year" | "years" | "yearly" => Ok(Granularity::Year),
            other => Err(MetricaError::InvalidArgument(format!(
                "unknown granularity: {other}"
            ))),
        }
    }
}

/// Shift `date` by `delta` units of `granularity` (negative = backward).
pub fn shift(date: DateTime<Utc>, granularity: Granularity, delta: i64) -> Result<DateTime<Utc>> {
    let overflow = || {
        MetricaError::InvalidArgument(format!(
            "shifting {date} by {delta} {granularity}(s) is out of range"
        ))
    };

    match granularity {
        Granularity::Day | Granularity::Week => {
            let days = if granularity == Granularity::Week {
                delta.checked_mul(7).ok_or_else(overflow)?
            } else {
                delta
            };
            let step = TimeDelta::try_days(days).ok_or_else(overflow)?;
            date.checked_add_signed(step).ok_or_else(overflow)
        }
        Granularity::Month | Granularity::Year => {
            let months = if granularity == Granularity::Year {
                delta.checked_mul(12).ok_or_else(overflow)?
            } else {
                delta
            };
            let n = u32::try_from(months.unsigned_abs()).map_err(|_| overflow())?;
            let shifted = if months >= 0 {
                date.checked_add_months(Months::new(n))
            } else {
                date.checked_sub_months(Months::new(n))
            };
            shifted.ok_or_else(overflow)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn day_and_week_are_fixed_steps() {
        assert_eq!(shift(at(2024, 1, 8), Granularity::Day, -7).unwrap(), at(2024, 1, 1));
        assert_eq!(shift(at(2024, 1, 8), Granularity::Week, -1).unwrap(), at(2024, 1, 1));
        assert_eq!(shift(at(2024, 1, 1), Granularity::Week, 2).unwrap(), at(2024, 1, 15));
    }

    #[test]
    fn month_clamps_to_end_of_month() {
        assert_eq!(shift(at(2024, 1, 31), Granularity::Month, 1).unwrap(), at(2024, 2, 29));
        assert_eq!(shift(at(2024, 3, 31), Granularity::Month, -1).unwrap(), at(2024, 2, 29));
        assert_eq!(shift(at(2023, 3, 15), Granularity::Month, -3).unwrap(), at(2022, 12, 15));
    }

    #[test]
    fn year_steps_handle_leap_day() {
        assert_eq!(shift(at(2024, 2, 29), Granularity::Year, -1).unwrap(), at(2023, 2, 28));
        assert_eq!(shift(at(2020, 6, 1), Granularity::Year, 4).unwrap(), at(2024, 6, 1));
    }

    #[test]
    fn zero_delta_is_identity() {
        for g in [Granularity::Day, Granularity::Week, Granularity::Month, Granularity::Year] {
            assert_eq!(shift(at(2024, 5, 5), g, 0).unwrap(), at(2024, 5, 5));
        }
    }

    #[test]
    fn overflow_is_an_error() {
        let err = shift(at(2024, 1, 1), Granularity::Year, i64::MAX).unwrap_err();
        assert_eq!(err.code().as_str(), "INVALID_ARGUMENT");
    }

    #[test]
    fn parses_names_and_window_labels() {
        assert_eq!("Weeks".parse::<Granularity>().unwrap(), Granularity::Week);
        assert_eq!("monthly".parse::<Granularity>().unwrap(), Granularity::Month);
        assert!("fortnight".parse::<Granularity>().is_err());
        assert_eq!(Granularity::Year.window_label(), "yearly");
    }
}
