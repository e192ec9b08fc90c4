//! Report Viewer Widget
//! Central scrollable panel: recommendation headline, tables, map and one
//! card per hypothesis.

use crate::charts::ChartPlotter;
use crate::config::CurrencyFormat;
use crate::report::{format, Finding, Insight, InsightsReport, TableView};
use crate::stats::StatsCalculator;
use egui::{Color32, RichText, ScrollArea};

const CARD_SPACING: f32 = 15.0;
const TABLE_ROW_HEIGHT: f32 = 18.0;
const TABLE_HEIGHT: f32 = 240.0;
const TABLE_COL_WIDTH: f32 = 110.0;

const SUPPORTED_COLOR: Color32 = Color32::from_rgb(40, 167, 69);
const NEUTRAL_COLOR: Color32 = Color32::from_rgb(100, 149, 237);

/// Scrollable report display.
#[derive(Default)]
pub struct ReportViewer {
    report: Option<InsightsReport>,
    buy_view: TableView,
    sell_view: TableView,
}

impl ReportViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn report(&self) -> Option<&InsightsReport> {
        self.report.as_ref()
    }

    /// Replace the displayed report. Table cells are stringified once here.
    pub fn set_report(&mut self, report: InsightsReport) {
        self.buy_view = TableView::from_frame(&report.recommendation.buy_candidates);
        self.sell_view = TableView::from_frame(&report.recommendation.sell_prices);
        self.report = Some(report);
    }

    pub fn show(&self, ui: &mut egui::Ui, currency: &CurrencyFormat) {
        let Some(report) = &self.report else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ScrollArea::vertical()
            .id_salt("report_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                Self::draw_headline(ui, report, currency);
                ui.add_space(CARD_SPACING);

                ui.label(RichText::new("Buy recommendations").size(16.0).strong());
                Self::draw_table(ui, "buy_table", &self.buy_view);
                ui.add_space(CARD_SPACING);

                ui.label(RichText::new("Sell prices").size(16.0).strong());
                Self::draw_table(ui, "sell_table", &self.sell_view);
                ui.add_space(CARD_SPACING);

                ui.label(RichText::new("Location of houses").size(16.0).strong());
                ChartPlotter::draw(ui, "location_map", &report.recommendation.map);
                ui.add_space(CARD_SPACING);

                for insight in &report.insights {
                    Self::draw_insight_card(ui, insight);
                    ui.add_space(CARD_SPACING);
                }
            });
    }

    fn draw_headline(ui: &mut egui::Ui, report: &InsightsReport, currency: &CurrencyFormat) {
        let recommendation = &report.recommendation;
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(2.0, SUPPORTED_COLOR))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.label(
                    RichText::new(format::profit_headline(
                        recommendation.total_profit,
                        currency,
                    ))
                    .size(22.0)
                    .strong()
                    .color(SUPPORTED_COLOR),
                );
                ui.label(format!(
                    "{} buy candidates out of {} houses",
                    recommendation.buy_count(),
                    report.row_count
                ));
            });
    }

    /// Fixed-height table; only visible rows are laid out.
    fn draw_table(ui: &mut egui::Ui, id: &str, view: &TableView) {
        if view.is_empty() {
            ui.label(RichText::new("No rows").color(Color32::GRAY));
            return;
        }

        ui.horizontal(|ui| {
            for column in &view.columns {
                ui.add_sized(
                    [TABLE_COL_WIDTH, TABLE_ROW_HEIGHT],
                    egui::Label::new(RichText::new(column).strong()),
                );
            }
        });

        ScrollArea::vertical()
            .id_salt(id)
            .max_height(TABLE_HEIGHT)
            .auto_shrink([false, true])
            .show_rows(ui, TABLE_ROW_HEIGHT, view.len(), |ui, row_range| {
                for row in &view.rows[row_range] {
                    ui.horizontal(|ui| {
                        for cell in row {
                            ui.add_sized(
                                [TABLE_COL_WIDTH, TABLE_ROW_HEIGHT],
                                egui::Label::new(cell),
                            );
                        }
                    });
                }
            });
    }

    /// Card border is green when the comparison is statistically significant.
    fn draw_insight_card(ui: &mut egui::Ui, insight: &Insight) {
        let significant = matches!(
            insight.finding,
            Finding::Comparison { p_value: Some(p), .. }
                if StatsCalculator::is_significant(p)
        );
        let border_color = if significant {
            SUPPORTED_COLOR
        } else {
            NEUTRAL_COLOR
        };
        let id = insight.hypothesis.slug();

        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(2.0, border_color))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.label(
                        RichText::new(format::title(insight.hypothesis))
                            .size(18.0)
                            .strong()
                            .color(border_color),
                    );
                    ui.add_space(6.0);
                    ui.label(RichText::new(format::statement(insight)).size(14.0));
                    if let Some(note) = format::significance_note(insight) {
                        ui.label(RichText::new(note).size(11.0).italics());
                    }

                    ui.add_space(8.0);
                    ChartPlotter::draw(ui, id, &insight.chart);

                    if !insight.groups.is_empty() {
                        ui.add_space(8.0);
                        ChartPlotter::draw_stats_table(ui, id, &insight.groups);
                    }
                });
            });
    }
}
