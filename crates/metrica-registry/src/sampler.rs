//! Built-in process sampler used by the `metrica` binary.
//!
//! Records `uptime_ms` (time since install) and `series_count` (keys in the
//! registry) on every refresh tick.

use std::time::Instant;

use crate::registry::{Interval, MetricsRegistry, Middleware};
use crate::series::SetOptions;

pub const UPTIME_KEY: &str = "uptime_ms";
pub const SERIES_COUNT_KEY: &str = "series_count";

const SOURCE: &str = "sampler";

pub struct UptimeSampler {
    interval: Interval,
}

impl UptimeSampler {
    pub fn new(interval: impl Into<Interval>) -> Self {
        Self {
            interval: interval.into(),
        }
    }
}

fn sample(registry: &MetricsRegistry, started: Instant) {
    let uptime = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    if let Err(e) = registry.set(UPTIME_KEY, uptime, None, SetOptions::source(SOURCE)) {
        tracing::warn!(error = %e, key = UPTIME_KEY, "sample failed");
    }

    // count includes the series this tick may have just created
    let count = registry.keys().len() + usize::from(registry.get(SERIES_COUNT_KEY).is_none());
    if let Err(e) = registry.set(SERIES_COUNT_KEY, count, None, SetOptions::source(SOURCE)) {
        tracing::warn!(error = %e, key = SERIES_COUNT_KEY, "sample failed");
    }
}

impl Middleware for UptimeSampler {
    fn install(&self, registry: &MetricsRegistry) {
        let started = Instant::now();
        if let Err(e) = registry.every(self.interval.clone(), move |r| sample(r, started)) {
            tracing::error!(error = %e, "uptime sampler not scheduled");
        }
    }
}
