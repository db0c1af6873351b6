use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use metrica_core::clock::{self, Clock};
use metrica_core::error::{ErrorCode, MetricaError, Result};

use crate::event::{Publisher, SubscriptionId};
use crate::obs::RegistryStats;
use crate::registry::composite::{Debouncer, COMPOSITE_DEBOUNCE};
use crate::registry::periodic::Interval;
use crate::series::{MetricSeries, SetOptions, WindowTable};

/// Payload of the per-key registry notification.
#[derive(Debug, Clone)]
pub struct MetricUpdate {
    pub series: Arc<MetricSeries>,
    pub value: Value,
    pub timestamp: DateTime<Utc>,
    pub options: SetOptions,
}

/// Composable setup step applied with [`MetricsRegistry::use_middleware`].
pub trait Middleware {
    fn install(&self, registry: &MetricsRegistry);
}

impl<F> Middleware for F
where
    F: Fn(&MetricsRegistry),
{
    fn install(&self, registry: &MetricsRegistry) {
        self(registry)
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn runtime(op: &str) -> Result<Handle> {
    Handle::try_current()
        .map_err(|_| MetricaError::Runtime(format!("{op} requires a running tokio runtime")))
}

struct RegistryInner {
    series: DashMap<String, Arc<MetricSeries>>,
    events: Publisher<String, MetricUpdate>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    clock: Arc<dyn Clock>,
    windows: WindowTable,
    stats: Arc<RegistryStats>,
}

impl Drop for RegistryInner {
    fn drop(&mut self) {
        for t in lock(&self.tasks).drain(..) {
            t.abort();
        }
    }
}

/// Key -> series store with per-key notifications, composite subscriptions
/// and periodic refresh tasks. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct MetricsRegistry {
    inner: Arc<RegistryInner>,
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("series", &self.inner.series.len())
            .field("periodic_tasks", &lock(&self.inner.tasks).len())
            .field("windows", &self.inner.windows)
            .finish()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::with_parts(clock::system(), WindowTable::default())
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::with_parts(clock, WindowTable::default())
    }

    /// `windows` seeds every series this registry creates.
    pub fn with_parts(clock: Arc<dyn Clock>, windows: WindowTable) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                series: DashMap::new(),
                events: Publisher::new(),
                tasks: Mutex::new(Vec::new()),
                clock,
                windows,
                stats: Arc::new(RegistryStats::default()),
            }),
        }
    }

    /// Run `middleware` against this registry once, synchronously.
    pub fn use_middleware<M: Middleware>(&self, middleware: M) -> &Self {
        middleware.install(self);
        self
    }

    /// Record `value` under `key`, creating the series on first write, then
    /// notify `key` listeners.
    pub fn set(
        &self,
        key: &str,
        value: impl Into<Value>,
        timestamp: Option<DateTime<Utc>>,
        options: SetOptions,
    ) -> Result<&Self> {
        let value = value.into();
        if value.is_null() {
            self.inner
                .stats
                .rejected_writes
                .inc(&[("key", key), ("code", ErrorCode::InvalidValue.as_str())]);
            tracing::warn!(key, "rejected null metric value");
            return Err(MetricaError::InvalidValue(format!(
                "value for {key} must not be null"
            )));
        }

        let timestamp = timestamp.unwrap_or_else(|| self.inner.clock.now());
        let series = self.series_for(key);
        let timestamp = series.set(value.clone(), Some(timestamp), options.clone())?;

        self.inner.stats.writes.inc(&[("key", key)]);
        tracing::debug!(key, %value, %timestamp, "metric set");

        self.inner.events.publish(
            &key.to_string(),
            &MetricUpdate {
                series,
                value,
                timestamp,
                options,
            },
        );
        Ok(self)
    }

    fn series_for(&self, key: &str) -> Arc<MetricSeries> {
        if let Some(s) = self.inner.series.get(key) {
            return Arc::clone(s.value());
        }

        let series = {
            let entry = self.inner.series.entry(key.to_string()).or_insert_with(|| {
                tracing::debug!(key, "series created");
                Arc::new(MetricSeries::with_parts(
                    Arc::clone(&self.inner.clock),
                    self.inner.windows,
                ))
            });
            Arc::clone(entry.value())
        };
        self.inner
            .stats
            .series
            .set(&[], i64::try_from(self.inner.series.len()).unwrap_or(i64::MAX));
        series
    }

    pub fn get(&self, key: &str) -> Option<Arc<MetricSeries>> {
        self.inner.series.get(key).map(|s| Arc::clone(s.value()))
    }

    /// Every key written so far, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.series.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Raw per-key notification, delivered synchronously inside `set`.
    pub fn subscribe<F>(&self, key: &str, listener: F) -> SubscriptionId
    where
        F: Fn(&MetricUpdate) + Send + Sync + 'static,
    {
        self.inner.events.subscribe(key.to_string(), listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.events.unsubscribe(id)
    }

    /// Call `callback` with the series of every key in `keys` (listing order)
    /// once all of them exist. Bursts of writes within 25 ms collapse into one
    /// call carrying the state seen at the last write.
    ///
    /// Subscriptions live as long as the registry; there is no way to remove one.
    pub fn on<K, F>(&self, keys: &[K], callback: F) -> Result<()>
    where
        K: AsRef<str>,
        F: Fn(&[Arc<MetricSeries>]) + Send + Sync + 'static,
    {
        if keys.is_empty() {
            return Err(MetricaError::InvalidArgument(
                "on() needs at least one key".into(),
            ));
        }
        let rt = runtime("on()")?;

        let keys: Arc<[String]> = keys.iter().map(|k| k.as_ref().to_string()).collect();
        let label = keys.join(",");

        let stats = Arc::clone(&self.inner.stats);
        let fire: Arc<dyn Fn(Vec<Arc<MetricSeries>>) + Send + Sync> =
            Arc::new(move |series: Vec<Arc<MetricSeries>>| {
                stats.composite_fires.inc(&[("keys", label.as_str())]);
                callback(&series);
            });
        let debouncer = Arc::new(Debouncer::new(COMPOSITE_DEBOUNCE, rt, fire));

        for key in keys.iter() {
            let weak = Arc::downgrade(&self.inner);
            let keys = Arc::clone(&keys);
            let debouncer = Arc::clone(&debouncer);
            self.inner.events.subscribe(key.clone(), move |_: &MetricUpdate| {
                let Some(inner) = weak.upgrade() else { return; };
                let current: Option<Vec<Arc<MetricSeries>>> = keys
                    .iter()
                    .map(|k| inner.series.get(k.as_str()).map(|s| Arc::clone(s.value())))
                    .collect();
                if let Some(series) = current {
                    debouncer.trigger(series);
                }
            });
        }

        tracing::debug!(keys = %keys.join(","), "composite subscription registered");
        Ok(())
    }

    /// Run `f` now, then every `interval` until [`stop`](Self::stop).
    ///
    /// Tasks accumulate: each call adds one more.
    pub fn every<F>(&self, interval: impl Into<Interval>, f: F) -> Result<&Self>
    where
        F: Fn(&MetricsRegistry) + Send + Sync + 'static,
    {
        let period = interval.into().resolve()?;
        let rt = runtime("every()")?;

        let f = Arc::new(f);
        let task_f = Arc::clone(&f);
        let weak = Arc::downgrade(&self.inner);
        let period_label = period.as_millis().to_string();
        let start = Instant::now() + period;

        let task = rt.spawn(async move {
            let mut tick = tokio::time::interval_at(start, period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                let Some(inner) = weak.upgrade() else { break; };
                inner
                    .stats
                    .periodic_runs
                    .inc(&[("interval_ms", period_label.as_str())]);
                task_f(&MetricsRegistry { inner });
            }
        });

        // Store the handle before the first call so a stop() issued from
        // inside `f` also cancels this task.
        let active = {
            let mut tasks = lock(&self.inner.tasks);
            tasks.push(task);
            tasks.len()
        };
        self.inner
            .stats
            .periodic_tasks
            .set(&[], i64::try_from(active).unwrap_or(i64::MAX));
        tracing::debug!(interval_ms = %period.as_millis(), active, "periodic task scheduled");

        let first_label = period.as_millis().to_string();
        self.inner
            .stats
            .periodic_runs
            .inc(&[("interval_ms", first_label.as_str())]);
        f(self);
        Ok(self)
    }

    /// Cancel every periodic task. Subscriptions are untouched.
    pub fn stop(&self) {
        let tasks: Vec<JoinHandle<()>> = lock(&self.inner.tasks).drain(..).collect();
        for t in &tasks {
            t.abort();
        }
        self.inner.stats.periodic_tasks.set(&[], 0);
        if !tasks.is_empty() {
            tracing::debug!(stopped = tasks.len(), "periodic tasks stopped");
        }
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.inner.clock)
    }

    pub fn stats(&self) -> &RegistryStats {
        &self.inner.stats
    }

    /// Prometheus text rendering of [`stats`](Self::stats).
    pub fn render_stats(&self) -> String {
        let points: usize = self.inner.series.iter().map(|e| e.value().len()).sum();
        self.inner
            .stats
            .render(&[("metrica_points", u64::try_from(points).unwrap_or(u64::MAX))])
    }
}
