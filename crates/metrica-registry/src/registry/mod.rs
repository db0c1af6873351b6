//! Metrics registry: lazily-created series per key, per-key notifications,
//! debounced composite subscriptions, and periodic refresh tasks.

mod composite;
mod metrics_registry;
mod periodic;

pub use composite::COMPOSITE_DEBOUNCE;
pub use metrics_registry::{MetricUpdate, MetricsRegistry, Middleware};
pub use periodic::Interval;
