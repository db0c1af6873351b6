//! In-process operational counters for the registry itself.
//!
//! These count registry activity (writes, rejections, composite firings,
//! periodic runs). They never summarize recorded metric values. Output is
//! Prometheus text format so it can be logged or scraped as-is.

pub mod stats;

pub use stats::{CounterVec, GaugeVec, RegistryStats};
