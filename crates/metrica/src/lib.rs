//! Top-level facade crate for metrica.
//!
//! Re-exports the core primitives and the registry library so users can depend on a single crate.

pub mod core {
    pub use metrica_core::*;
}

pub mod registry {
    pub use metrica_registry::*;
}

pub use metrica_core::{Granularity, MetricaError, Result};
pub use metrica_registry::{MetricSeries, MetricsRegistry, SetOptions};
