//! Report module - Recommendation and hypothesis passes

pub mod format;
mod hypotheses;
mod recommendation;
mod table;

pub use hypotheses::{report_hypotheses, Finding, Hypothesis, Insight};
pub use recommendation::{
    annotate, location_map, recommend, RecommendationReport, BUY_COLUMNS, DEFAULT_MARKUP,
    LOW_PRICE_MARKUP, SELL_COLUMNS,
};
pub use table::TableView;

use crate::config::AnalysisSettings;
use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Everything the dashboard shows, computed from one canonical table.
#[derive(Debug, Clone)]
pub struct InsightsReport {
    pub row_count: usize,
    pub recommendation: RecommendationReport,
    pub insights: Vec<Insight>,
}

impl InsightsReport {
    /// Run the recommendation pass, then the hypothesis pass. The two passes
    /// only share the read-only canonical table.
    pub fn build(canonical: &DataFrame, settings: &AnalysisSettings) -> Result<Self, ReportError> {
        let recommendation = recommend(canonical)?;
        let insights = report_hypotheses(canonical, settings)?;
        Ok(Self {
            row_count: canonical.height(),
            recommendation,
            insights,
        })
    }
}
