//! Time primitives shared by the store and the registry.
//!
//! - `granularity`: calendar units and `shift(date, unit, delta)`.
//! - `duration`: "5 hours" style expressions to milliseconds.
//! - `expression`: free-text dates ("3 weeks ago", "2024-01-08").
//!
//! Everything here is a pure function of its inputs; "now" is always passed in.

pub mod duration;
pub mod expression;
pub mod granularity;

pub use duration::{parse_duration_ms, DAY_MS, HOUR_MS, MINUTE_MS, SECOND_MS, WEEK_MS, YEAR_MS};
pub use expression::parse_date_expression;
pub use granularity::{shift, Granularity};
