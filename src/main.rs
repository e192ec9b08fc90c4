//! House Insights - interactive dashboard for King County house sales.

use anyhow::Result;
use eframe::egui;
use house_insights::config::InsightsConfig;
use house_insights::gui::InsightsApp;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let cwd = std::env::current_dir()?;
    let config = InsightsConfig::discover(&cwd).unwrap_or_else(|e| {
        warn!("Invalid configuration ({}); using defaults", e);
        InsightsConfig::default()
    });
    info!(
        "Dataset {}, locale {}, trim {}",
        config.dataset_path.display(),
        config.locale,
        config.trim_proportion
    );

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("House Insights"),
        ..Default::default()
    };

    eframe::run_native(
        "House Insights",
        options,
        Box::new(|cc| Ok(Box::new(InsightsApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("Dashboard failed: {}", e))
}
