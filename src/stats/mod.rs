//! Stats module - Descriptive statistics and comparisons

mod calculator;

pub use calculator::{DensityPoint, GroupStats, StatsCalculator, SIGNIFICANCE_THRESHOLD};
