//! Load -> transform -> report, end to end.

use crate::config::AnalysisSettings;
use crate::data::{DataLoader, HouseTransformer, LoaderError, TransformError};
use crate::report::{InsightsReport, ReportError};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Pipeline stage, reported to progress listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Loading,
    Transforming,
    Reporting,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Loading => "Reading CSV file...",
            Stage::Transforming => "Deriving columns...",
            Stage::Reporting => "Computing recommendations and hypotheses...",
        }
    }

    /// Progress percentage at the start of the stage.
    pub fn progress(&self) -> f32 {
        match self {
            Stage::Loading => 5.0,
            Stage::Transforming => 35.0,
            Stage::Reporting => 60.0,
        }
    }
}

/// Run the whole pipeline, calling `on_stage` before each stage.
pub fn run_with_progress(
    path: &Path,
    settings: &AnalysisSettings,
    mut on_stage: impl FnMut(Stage),
) -> Result<InsightsReport, PipelineError> {
    on_stage(Stage::Loading);
    let raw = DataLoader::load_csv(path)?;

    on_stage(Stage::Transforming);
    let canonical = HouseTransformer::transform(&raw)?;

    on_stage(Stage::Reporting);
    Ok(InsightsReport::build(&canonical, settings)?)
}

pub fn run(path: &Path, settings: &AnalysisSettings) -> Result<InsightsReport, PipelineError> {
    run_with_progress(path, settings, |_| {})
}
