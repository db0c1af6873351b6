//! metrica registry library entry.
//!
//! This crate wires the notification channel, the per-key temporal store, the
//! registry (composite subscriptions + periodic tasks), strict config loading
//! and operational counters into one stack. It is consumed by the `metrica`
//! binary (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod event;
pub mod obs;
pub mod registry;
pub mod sampler;
pub mod series;

pub use registry::{Interval, MetricUpdate, MetricsRegistry, Middleware};
pub use series::{MetricSeries, RangeResolution, SetOptions, WindowOverrides, WindowTable};
