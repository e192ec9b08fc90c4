//! House Insights Main Application
//! Main window with control panel and report viewer.

use crate::config::{CurrencyFormat, InsightsConfig};
use crate::export::ReportExporter;
use crate::gui::{ControlPanel, ControlPanelAction, ReportViewer, UserSettings};
use crate::pipeline::{self, Stage};
use crate::report::InsightsReport;
use egui::SidePanel;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;
use tracing::{error, info, warn};

const EXPORT_WIDTH: u32 = 1200;
const EXPORT_HEIGHT: u32 = 800;

/// Analysis result from background thread
enum RunResult {
    Progress(Stage),
    Complete(Box<InsightsReport>),
    Error(String),
}

/// Export result from background thread
enum ExportResult {
    Progress(f32, String),
    Complete { path: PathBuf, charts: usize },
    Error(String),
}

/// Drain pending messages. The flag is set once the worker has hung up,
/// including when it panicked before sending a final result.
fn drain<T>(rx: &Receiver<T>) -> (Vec<T>, bool) {
    let mut messages = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(message) => messages.push(message),
            Err(TryRecvError::Empty) => return (messages, false),
            Err(TryRecvError::Disconnected) => return (messages, true),
        }
    }
}

/// Main application window.
pub struct InsightsApp {
    config: InsightsConfig,
    currency: CurrencyFormat,
    control_panel: ControlPanel,
    report_viewer: ReportViewer,

    // Async analysis
    run_rx: Option<Receiver<RunResult>>,
    is_running: bool,

    // Async export
    export_rx: Option<Receiver<ExportResult>>,
    is_exporting: bool,
}

impl InsightsApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: InsightsConfig) -> Self {
        let currency = config.currency().unwrap_or_else(|e| {
            warn!("{}; falling back to default currency format", e);
            CurrencyFormat::default()
        });

        let mut app = Self {
            control_panel: ControlPanel::new(UserSettings::from(&config)),
            config,
            currency,
            report_viewer: ReportViewer::new(),
            run_rx: None,
            is_running: false,
            export_rx: None,
            is_exporting: false,
        };
        app.start_run();
        app
    }

    /// Handle dataset selection
    fn handle_browse_dataset(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.control_panel.settings.dataset_path = path;
            self.start_run();
        }
    }

    /// Switch the currency format; the report itself is unchanged.
    fn handle_locale_changed(&mut self) {
        let locale = self.control_panel.settings.locale.clone();
        match CurrencyFormat::for_locale(&locale) {
            Ok(currency) => {
                info!("Currency locale set to {}", locale);
                self.currency = currency;
                self.config.locale = locale;
            }
            Err(e) => {
                self.control_panel
                    .set_progress(0.0, &format!("Error: {}", e));
            }
        }
    }

    /// Start load + analysis in background thread
    fn start_run(&mut self) {
        if self.is_running {
            return;
        }

        self.report_viewer.clear();
        self.control_panel.export_enabled = false;
        self.config.dataset_path = self.control_panel.settings.dataset_path.clone();

        let path = self.config.dataset_path.clone();
        let settings = self.config.analysis_settings();

        let (tx, rx) = channel();
        self.run_rx = Some(rx);
        self.is_running = true;
        self.control_panel.busy = true;
        self.control_panel.set_progress(0.0, "Starting analysis...");

        info!("Running analysis on {}", path.display());

        thread::spawn(move || {
            let result = pipeline::run_with_progress(&path, &settings, |stage| {
                let _ = tx.send(RunResult::Progress(stage));
            });

            let message = match result {
                Ok(report) => RunResult::Complete(Box::new(report)),
                Err(e) => RunResult::Error(e.to_string()),
            };
            let _ = tx.send(message);
        });
    }

    /// Check for analysis results
    fn check_run_results(&mut self) {
        let rx = self.run_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;
            let (messages, disconnected) = drain(&rx);

            for result in messages {
                match result {
                    RunResult::Progress(stage) => {
                        self.control_panel
                            .set_progress(stage.progress(), stage.label());
                    }
                    RunResult::Complete(report) => {
                        let rows = report.row_count;
                        self.report_viewer.set_report(*report);
                        self.control_panel.set_progress(
                            100.0,
                            &format!("Complete! {} houses analyzed", rows),
                        );
                        self.control_panel.export_enabled = true;
                        self.finish_run();
                        should_keep_receiver = false;
                    }
                    RunResult::Error(message) => {
                        error!("Analysis failed: {}", message);
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {}", message));
                        self.finish_run();
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver && disconnected {
                error!("Analysis worker stopped without a result");
                self.control_panel
                    .set_progress(0.0, "Error: analysis stopped unexpectedly");
                self.finish_run();
                should_keep_receiver = false;
            }

            if should_keep_receiver {
                self.run_rx = Some(rx);
            }
        }
    }

    fn finish_run(&mut self) {
        self.is_running = false;
        self.control_panel.busy = self.is_exporting;
    }

    /// Handle export - render charts and write the archive off the UI thread
    fn handle_export(&mut self) {
        if self.is_exporting {
            return;
        }
        let Some(report) = self.report_viewer.report().cloned() else {
            self.control_panel.set_progress(0.0, "No report to export");
            return;
        };

        let output_path = match rfd::FileDialog::new()
            .add_filter("Zip archive", &["zip"])
            .set_file_name("house_insights_report.zip")
            .save_file()
        {
            Some(path) => path,
            None => return, // User cancelled
        };

        let currency = self.currency.clone();
        let (tx, rx) = channel();
        self.export_rx = Some(rx);
        self.is_exporting = true;
        self.control_panel.busy = true;
        self.control_panel.set_progress(10.0, "Rendering charts...");

        thread::spawn(move || {
            let charts = ReportExporter::render_charts(&report, EXPORT_WIDTH, EXPORT_HEIGHT);
            let _ = tx.send(ExportResult::Progress(
                60.0,
                "Writing archive...".to_string(),
            ));

            let message =
                match ReportExporter::export_archive(&report, &currency, &charts, &output_path) {
                    Ok(()) => ExportResult::Complete {
                        path: output_path,
                        charts: charts.len(),
                    },
                    Err(e) => ExportResult::Error(e.to_string()),
                };
            let _ = tx.send(message);
        });
    }

    /// Check for export results
    fn check_export_results(&mut self) {
        let rx = self.export_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;
            let (messages, disconnected) = drain(&rx);

            for result in messages {
                match result {
                    ExportResult::Progress(progress, status) => {
                        self.control_panel.set_progress(progress, &status);
                    }
                    ExportResult::Complete { path, charts } => {
                        self.control_panel.set_progress(
                            100.0,
                            &format!("Report exported with {} charts", charts),
                        );
                        if let Some(dir) = path.parent() {
                            if let Err(e) = open::that(dir) {
                                warn!("Could not open {}: {}", dir.display(), e);
                            }
                        }
                        self.finish_export();
                        should_keep_receiver = false;
                    }
                    ExportResult::Error(message) => {
                        error!("Export failed: {}", message);
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {}", message));
                        self.finish_export();
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver && disconnected {
                error!("Export worker stopped without a result");
                self.control_panel
                    .set_progress(0.0, "Error: export stopped unexpectedly");
                self.finish_export();
                should_keep_receiver = false;
            }

            if should_keep_receiver {
                self.export_rx = Some(rx);
            }
        }
    }

    fn finish_export(&mut self) {
        self.is_exporting = false;
        self.control_panel.busy = self.is_running;
    }
}

impl eframe::App for InsightsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_run_results();
        self.check_export_results();

        // Request repaint while work is in flight
        if self.is_running || self.is_exporting {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(330.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::BrowseDataset => self.handle_browse_dataset(),
                        ControlPanelAction::LocaleChanged => self.handle_locale_changed(),
                        ControlPanelAction::Reload => self.start_run(),
                        ControlPanelAction::Export => self.handle_export(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Report Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.report_viewer.show(ui, &self.currency);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_drain_keeps_live_channel() {
        let (tx, rx) = channel();
        tx.send(1).unwrap();
        tx.send(2).unwrap();

        assert_eq!(drain(&rx), (vec![1, 2], false));
        assert_eq!(drain(&rx), (Vec::new(), false));
    }

    #[test]
    fn test_drain_reports_panicked_worker() {
        let (tx, rx) = channel::<RunResult>();
        let worker = thread::spawn(move || {
            let _ = tx.send(RunResult::Progress(Stage::Loading));
            panic!("worker failed");
        });
        assert!(worker.join().is_err());

        let (messages, disconnected) = drain(&rx);
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], RunResult::Progress(Stage::Loading)));
        assert!(disconnected);
    }

    #[test]
    fn test_drain_delivers_result_before_hang_up() {
        let (tx, rx) = channel();
        tx.send(ExportResult::Error("disk full".to_string())).unwrap();
        drop(tx);

        let (messages, disconnected) = drain(&rx);
        assert!(matches!(messages.as_slice(), [ExportResult::Error(m)] if m == "disk full"));
        assert!(disconnected);
    }
}
