//! Money and reporting calculations over estimates.
//!
//! Everything here is pure: no I/O, no clock reads. Callers pass in the
//! estimates and, for reports, the day and timezone they are interested in.

pub mod metrics;
pub mod totals;

pub use metrics::{DailyMetrics, ServiceCount, daily_metrics};
pub use totals::{Totals, checked_totals, compute_totals, round_half_up};
