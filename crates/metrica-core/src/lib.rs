//! metrica core: runtime-free time primitives, the clock capability, and the
//! shared error surface.
//!
//! This crate carries no async runtime so the calendar math and parsers can be
//! reused (and tested) without tokio.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! All fallible paths surface as `MetricaError`/`Result` (or `ParseFailure`
//! for free-text dates).

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod clock;
pub mod error;
pub mod time;

pub use clock::{Clock, ManualClock, SystemClock};
/// Shared result type.
pub use error::{ErrorCode, MetricaError, ParseFailure, Result};
pub use time::Granularity;
