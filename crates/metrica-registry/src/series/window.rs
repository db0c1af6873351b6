//! Per-granularity tolerance windows.

use serde::{Deserialize, Serialize};

use metrica_core::time::{Granularity, DAY_MS, HOUR_MS, MINUTE_MS, WEEK_MS, YEAR_MS};

/// 30 days: the "one month" age threshold used to pick a window for free-text lookups.
const MONTH_MS: u64 = 30 * DAY_MS;

/// Symmetric match tolerance (milliseconds) per granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowTable {
    pub daily: u64,
    pub weekly: u64,
    pub monthly: u64,
    pub yearly: u64,
}

impl Default for WindowTable {
    fn default() -> Self {
        Self {
            daily: 5 * HOUR_MS,
            weekly: DAY_MS,
            monthly: 3 * DAY_MS,
            yearly: 5 * DAY_MS,
        }
    }
}

impl WindowTable {
    pub fn get(&self, granularity: Granularity) -> u64 {
        match granularity {
            Granularity::Day => self.daily,
            Granularity::Week => self.weekly,
            Granularity::Month => self.monthly,
            Granularity::Year => self.yearly,
        }
    }

    /// Replace only the slots present in `overrides`.
    pub fn with_overrides(mut self, overrides: WindowOverrides) -> Self {
        if let Some(v) = overrides.daily {
            self.daily = v;
        }
        if let Some(v) = overrides.weekly {
            self.weekly = v;
        }
        if let Some(v) = overrides.monthly {
            self.monthly = v;
        }
        if let Some(v) = overrides.yearly {
            self.yearly = v;
        }
        self
    }
}

/// Partial window table; `None` keeps the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowOverrides {
    pub daily: Option<u64>,
    pub weekly: Option<u64>,
    pub monthly: Option<u64>,
    pub yearly: Option<u64>,
}

/// Window for a free-text lookup, chosen by how far the instant is from now.
pub fn window_for_age(distance_ms: u64) -> u64 {
    if distance_ms >= YEAR_MS {
        WEEK_MS
    } else if distance_ms >= MONTH_MS {
        3 * DAY_MS
    } else if distance_ms >= WEEK_MS {
        DAY_MS
    } else if distance_ms >= DAY_MS {
        5 * HOUR_MS
    } else {
        60 * MINUTE_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_table() {
        let t = WindowTable::default();
        assert_eq!(t.get(Granularity::Day), 5 * HOUR_MS);
        assert_eq!(t.get(Granularity::Week), DAY_MS);
        assert_eq!(t.get(Granularity::Month), 3 * DAY_MS);
        assert_eq!(t.get(Granularity::Year), 5 * DAY_MS);
    }

    #[test]
    fn overrides_touch_only_given_slots() {
        let t = WindowTable::default().with_overrides(WindowOverrides {
            weekly: Some(2 * DAY_MS),
            ..Default::default()
        });
        assert_eq!(t.weekly, 2 * DAY_MS);
        assert_eq!(t.daily, 5 * HOUR_MS);
        assert_eq!(t.yearly, 5 * DAY_MS);
    }

    #[test]
    fn age_buckets() {
        assert_eq!(window_for_age(0), HOUR_MS);
        assert_eq!(window_for_age(DAY_MS), 5 * HOUR_MS);
        assert_eq!(window_for_age(WEEK_MS), DAY_MS);
        assert_eq!(window_for_age(MONTH_MS), 3 * DAY_MS);
        assert_eq!(window_for_age(YEAR_MS), WEEK_MS);
        assert_eq!(window_for_age(YEAR_MS - 1), 3 * DAY_MS);
    }
}
