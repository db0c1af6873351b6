//! Single-key temporal store.
//!
//! A `MetricSeries` keeps one value per millisecond and answers "latest",
//! "closest to T within a window", and "one slot per calendar step" lookups.

mod metric;
mod window;

pub use metric::{MetricSeries, RangeResolution, SeriesEvent, SeriesUpdate, SetOptions};
pub use window::{window_for_age, WindowOverrides, WindowTable};
