use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde_json::Value;

use metrica_core::clock::{self, Clock};
use metrica_core::error::{MetricaError, ParseFailure, Result};
use metrica_core::time::{parse_date_expression, shift, Granularity};

use crate::event::{Publisher, SubscriptionId};
use crate::series::window::{window_for_age, WindowTable};

/// Listener-facing annotations attached to a write. Never affects storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Who produced the value (sampler name, job, host...).
    pub source: Option<String>,
    /// Free-form labels forwarded to listeners.
    pub labels: BTreeMap<String, String>,
}

impl SetOptions {
    pub fn source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Default::default()
        }
    }
}

/// The single event a series emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesEvent {
    Updated,
}

/// Payload of [`SeriesEvent::Updated`].
#[derive(Debug, Clone)]
pub struct SeriesUpdate {
    pub value: Value,
    pub timestamp: DateTime<Utc>,
    pub options: SetOptions,
}

/// Result of a ranged lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeResolution {
    /// `start == end`: the bare slot.
    Single(Option<Value>),
    /// One slot per step, `start..=end`.
    Series(Vec<Option<Value>>),
}

impl RangeResolution {
    /// Flatten to one slot per step; a `Single` becomes a one-element vector.
    pub fn into_vec(self) -> Vec<Option<Value>> {
        match self {
            RangeResolution::Single(v) => vec![v],
            RangeResolution::Series(v) => v,
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn to_instant(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

/// Time-indexed values for one metric key (epoch millis -> value).
pub struct MetricSeries {
    values: Mutex<BTreeMap<i64, Value>>,
    windows: Mutex<WindowTable>,
    events: Publisher<SeriesEvent, SeriesUpdate>,
    clock: Arc<dyn Clock>,
}

impl Default for MetricSeries {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetricSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricSeries")
            .field("points", &self.len())
            .field("windows", &self.windows())
            .finish()
    }
}

impl MetricSeries {
    pub fn new() -> Self {
        Self::with_parts(clock::system(), WindowTable::default())
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::with_parts(clock, WindowTable::default())
    }

    pub fn with_parts(clock: Arc<dyn Clock>, windows: WindowTable) -> Self {
        Self {
            values: Mutex::new(BTreeMap::new()),
            windows: Mutex::new(windows),
            events: Publisher::new(),
            clock,
        }
    }

    pub fn windows(&self) -> WindowTable {
        *lock(&self.windows)
    }

    pub fn set_windows(&self, windows: WindowTable) {
        *lock(&self.windows) = windows;
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&SeriesUpdate) + Send + Sync + 'static,
    {
        self.events.subscribe(SeriesEvent::Updated, listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Record `value` at `timestamp` (clock reading when `None`).
    ///
    /// A write at an already-recorded millisecond replaces the old value.
    /// Returns the effective timestamp, truncated to milliseconds.
    pub fn set(
        &self,
        value: impl Into<Value>,
        timestamp: Option<DateTime<Utc>>,
        options: SetOptions,
    ) -> Result<DateTime<Utc>> {
        let value = value.into();
        if value.is_null() {
            return Err(MetricaError::InvalidValue("value must not be null".into()));
        }

        let requested = timestamp.unwrap_or_else(|| self.clock.now());
        let ms = requested.timestamp_millis();
        let timestamp = to_instant(ms).unwrap_or(requested);

        lock(&self.values).insert(ms, value.clone());
        tracing::debug!(%value, %timestamp, "series set");

        self.events.publish(
            &SeriesEvent::Updated,
            &SeriesUpdate {
                value,
                timestamp,
                options,
            },
        );
        Ok(timestamp)
    }

    /// Value at the greatest recorded timestamp.
    pub fn latest(&self) -> Option<Value> {
        lock(&self.values).values().next_back().cloned()
    }

    /// Recorded instants. Callers must not depend on the order.
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        lock(&self.values)
            .keys()
            .filter_map(|ms| to_instant(*ms))
            .collect()
    }

    /// Independent copy of every recorded point.
    pub fn values(&self) -> BTreeMap<i64, Value> {
        lock(&self.values).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.values).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.values).is_empty()
    }

    /// Value closest to `target` within `[target - window, target + window]`
    /// (both ends inclusive). Equidistant candidates resolve to the earlier one.
    pub fn resolve_nearest(&self, target: DateTime<Utc>, window_ms: u64) -> Option<Value> {
        let t = target.timestamp_millis();
        let w = i64::try_from(window_ms).unwrap_or(i64::MAX);
        let (low, high) = (t.saturating_sub(w), t.saturating_add(w));

        let values = lock(&self.values);
        let mut best: Option<(u64, &Value)> = None;
        for (ts, v) in values.range(low..=high) {
            let d = ts.abs_diff(t);
            match best {
                // ascending scan: once past the target, distances only grow
                Some((bd, _)) if d >= bd => {
                    if *ts > t {
                        break;
                    }
                }
                _ => best = Some((d, v)),
            }
        }
        best.map(|(_, v)| v.clone())
    }

    /// Value `ago` units of `granularity` before `relative`.
    pub fn resolve_ago(
        &self,
        relative: DateTime<Utc>,
        granularity: Granularity,
        ago: i64,
        window_ms: u64,
    ) -> Result<Option<Value>> {
        if ago < 0 {
            return Err(MetricaError::InvalidArgument(format!(
                "ago must be non-negative, got {ago}"
            )));
        }
        let target = shift(relative, granularity, -ago)?;
        Ok(self.resolve_nearest(target, window_ms))
    }

    /// One independent lookup per step `start..=end` from `relative`.
    pub fn resolve_range(
        &self,
        relative: DateTime<Utc>,
        granularity: Granularity,
        window_ms: u64,
        start: i64,
        end: i64,
    ) -> Result<RangeResolution> {
        if end < 0 {
            return Err(MetricaError::InvalidArgument(format!(
                "range end must be non-negative, got {end}"
            )));
        }
        if start > end {
            return Err(MetricaError::InvalidArgument(format!(
                "range start {start} is after end {end}"
            )));
        }

        let targets = (start..=end)
            .map(|delta| shift(relative, granularity, delta))
            .collect::<Result<Vec<_>>>()?;
        let mut slots: Vec<Option<Value>> = targets
            .into_iter()
            .map(|t| self.resolve_nearest(t, window_ms))
            .collect();

        if start == end {
            return Ok(RangeResolution::Single(slots.pop().flatten()));
        }
        Ok(RangeResolution::Series(slots))
    }

    /// Lookup by free-text date. A parse failure is handed back as the `Err`
    /// value; a miss is `Ok(None)`. Without `window_ms`, the tolerance grows
    /// with the distance between the parsed instant and now.
    pub fn resolve_from_expression(
        &self,
        expr: &str,
        window_ms: Option<u64>,
    ) -> std::result::Result<Option<Value>, ParseFailure> {
        let now = self.clock.now();
        let target = parse_date_expression(expr, now)?;
        let window = window_ms.unwrap_or_else(|| {
            let distance = (now - target).num_milliseconds().unsigned_abs();
            window_for_age(distance)
        });
        Ok(self.resolve_nearest(target, window))
    }

    pub fn days_ago(&self, days: i64) -> Result<Option<Value>> {
        self.ago_now(Granularity::Day, days)
    }

    pub fn weeks_ago(&self, weeks: i64) -> Result<Option<Value>> {
        self.ago_now(Granularity::Week, weeks)
    }

    pub fn months_ago(&self, months: i64) -> Result<Option<Value>> {
        self.ago_now(Granularity::Month, months)
    }

    pub fn years_ago(&self, years: i64) -> Result<Option<Value>> {
        self.ago_now(Granularity::Year, years)
    }

    fn ago_now(&self, granularity: Granularity, ago: i64) -> Result<Option<Value>> {
        let window = self.windows().get(granularity);
        self.resolve_ago(self.clock.now(), granularity, ago, window)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn null_is_rejected_without_notification() {
        let s = MetricSeries::new();
        let hits = Arc::new(Mutex::new(0));
        let h = Arc::clone(&hits);
        s.subscribe(move |_| *h.lock().unwrap() += 1);

        let err = s.set(Value::Null, None, SetOptions::default()).unwrap_err();
        assert_eq!(err.code().as_str(), "INVALID_VALUE");
        assert!(s.is_empty());
        assert_eq!(*hits.lock().unwrap(), 0);
    }

    #[test]
    fn update_carries_value_timestamp_and_options() {
        let s = MetricSeries::new();
        let seen = Arc::new(Mutex::new(None));
        let c = Arc::clone(&seen);
        s.subscribe(move |u| *c.lock().unwrap() = Some(u.clone()));

        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        s.set(json!({"ok": true}), Some(at), SetOptions::source("probe")).unwrap();

        let u = seen.lock().unwrap().clone().unwrap();
        assert_eq!(u.value, json!({"ok": true}));
        assert_eq!(u.timestamp, at);
        assert_eq!(u.options.source.as_deref(), Some("probe"));
    }

    #[test]
    fn single_point_range_is_bare() {
        let s = MetricSeries::new();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        s.set(7, Some(at), SetOptions::default()).unwrap();

        let r = s.resolve_range(at, Granularity::Day, 0, 0, 0).unwrap();
        assert_eq!(r, RangeResolution::Single(Some(json!(7))));
    }

    #[test]
    fn narrowed_window_drops_far_points() {
        let now = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        let s = MetricSeries::with_clock(clock::ManualClock::shared(now));
        s.set(1, Some(now - chrono::TimeDelta::days(1) + chrono::TimeDelta::hours(3)), SetOptions::default())
            .unwrap();
        assert_eq!(s.days_ago(1).unwrap(), Some(json!(1)));

        s.set_windows(WindowTable {
            daily: 60 * 60 * 1000,
            ..s.windows()
        });
        assert_eq!(s.days_ago(1).unwrap(), None);
    }
}
