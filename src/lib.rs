//! House Insights - King County house-sales analysis
//!
//! Loads the sales CSV, derives the canonical table, and produces a buy/sell
//! recommendation plus twelve business hypotheses. The `gui` module hosts the
//! desktop dashboard built on top of it.

pub mod charts;
pub mod config;
pub mod data;
pub mod export;
pub mod gui;
pub mod pipeline;
pub mod report;
pub mod stats;

pub use config::{AnalysisSettings, ConfigError, CurrencyFormat, InsightsConfig};
pub use pipeline::{run, run_with_progress, PipelineError, Stage};
pub use report::InsightsReport;
