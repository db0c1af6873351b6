use std::time::Duration;

use metrica_core::error::{MetricaError, Result};
use metrica_core::time::parse_duration_ms;

/// Refresh interval accepted by `every`: a millisecond count, a `Duration`,
/// or a duration expression such as `"30s"` or `"5 minutes"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interval {
    Millis(u64),
    Expr(String),
}

impl Interval {
    /// Resolve to a non-zero period.
    pub fn resolve(&self) -> Result<Duration> {
        let ms = match self {
            Interval::Millis(ms) => *ms,
            Interval::Expr(s) => parse_duration_ms(s)?,
        };
        if ms == 0 {
            return Err(MetricaError::InvalidArgument(
                "interval must be greater than zero".into(),
            ));
        }
        Ok(Duration::from_millis(ms))
    }
}

impl From<u64> for Interval {
    fn from(ms: u64) -> Self {
        Interval::Millis(ms)
    }
}

impl From<Duration> for Interval {
    fn from(d: Duration) -> Self {
        Interval::Millis(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

impl From<&str> for Interval {
    fn from(s: &str) -> Self {
        Interval::Expr(s.to_string())
    }
}

impl From<String> for Interval {
    fn from(s: String) -> Self {
        Interval::Expr(s)
    }
}
