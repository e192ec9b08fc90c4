//! Chart Plotter Module
//! Draws report charts interactively using egui_plot.

use crate::charts::model::{
    padded_range, palette_color, pastel_color, pie_angles, Category, Chart, CrossTab, Orientation,
    Series,
};
use crate::charts::renderer::category_label;
use crate::report::format::stat_cell;
use crate::stats::{GroupStats, StatsCalculator};
use egui::{Color32, RichText, Stroke};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Line, Plot, PlotPoints, Points, Polygon,
};

const PLOT_HEIGHT: f32 = 280.0;
const VIOLIN_BINS: usize = 40;
const VIOLIN_HALF_WIDTH: f64 = 0.4;

fn color32(rgb: (u8, u8, u8)) -> Color32 {
    Color32::from_rgb(rgb.0, rgb.1, rgb.2)
}

/// Draws a [`Chart`] inside an egui layout.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Draw any chart. `id` must be unique per chart on screen.
    pub fn draw(ui: &mut egui::Ui, id: &str, chart: &Chart) {
        match chart {
            Chart::Violin {
                x_label,
                y_label,
                series,
            } => Self::draw_violin(ui, id, x_label, y_label, series),
            Chart::Bars {
                x_label,
                y_label,
                orientation,
                bars,
            } => Self::draw_bars(ui, id, x_label, y_label, *orientation, bars),
            Chart::Line {
                x_label,
                y_label,
                points,
                x_window,
                tick_labels,
            } => Self::draw_line(ui, id, x_label, y_label, points, *x_window, tick_labels),
            Chart::Pie { slices } => Self::draw_pie(ui, slices),
            Chart::CrossTab(table) => Self::draw_crosstab(ui, id, table),
            Chart::Map { points } => Self::draw_map(ui, id, points),
        }
    }

    /// Category axis formatter: integer positions map to labels.
    fn category_formatter(
        labels: Vec<String>,
    ) -> impl Fn(egui_plot::GridMark, &std::ops::RangeInclusive<f64>) -> String {
        move |mark, _range| category_label(&labels, mark.value)
    }

    /// Violin outline plus a quartile box per series.
    fn draw_violin(ui: &mut egui::Ui, id: &str, x_label: &str, y_label: &str, series: &[Series]) {
        let labels: Vec<String> = series.iter().map(|s| s.label.clone()).collect();

        Plot::new(format!("violin_{}", id))
            .height(PLOT_HEIGHT)
            .allow_scroll(false)
            .x_axis_label(x_label)
            .y_axis_label(y_label)
            .x_axis_formatter(Self::category_formatter(labels))
            .show(ui, |plot_ui| {
                for (i, s) in series.iter().enumerate() {
                    if s.values.is_empty() {
                        continue;
                    }
                    let color = color32(palette_color(i));
                    let center = i as f64;

                    let profile = StatsCalculator::density_profile(&s.values, VIOLIN_BINS);
                    let mut outline: Vec<[f64; 2]> = profile
                        .iter()
                        .map(|p| [center + p.density * VIOLIN_HALF_WIDTH, p.value])
                        .collect();
                    outline.extend(
                        profile
                            .iter()
                            .rev()
                            .map(|p| [center - p.density * VIOLIN_HALF_WIDTH, p.value]),
                    );

                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(outline))
                            .fill_color(color.gamma_multiply(0.3))
                            .stroke(Stroke::new(1.5, color))
                            .name(&s.label),
                    );

                    let mut sorted = s.values.clone();
                    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                    let q1 = StatsCalculator::percentile(&sorted, 25.0);
                    let median = StatsCalculator::percentile(&sorted, 50.0);
                    let q3 = StatsCalculator::percentile(&sorted, 75.0);

                    let quartiles = BoxElem::new(center, BoxSpread::new(q1, q1, median, q3, q3))
                        .box_width(0.08)
                        .fill(color.gamma_multiply(0.7))
                        .stroke(Stroke::new(1.0, Color32::BLACK));
                    plot_ui.box_plot(BoxPlot::new(vec![quartiles]));
                }
            });
    }

    fn draw_bars(
        ui: &mut egui::Ui,
        id: &str,
        x_label: &str,
        y_label: &str,
        orientation: Orientation,
        bars: &[Category],
    ) {
        let labels: Vec<String> = bars.iter().map(|b| b.label.clone()).collect();

        let elements: Vec<Bar> = bars
            .iter()
            .enumerate()
            .map(|(i, b)| {
                Bar::new(i as f64, b.value)
                    .name(&b.label)
                    .width(0.6)
                    .fill(color32(palette_color(i)))
            })
            .collect();

        let mut chart = BarChart::new(elements);
        if orientation == Orientation::Horizontal {
            chart = chart.horizontal();
        }

        let plot = Plot::new(format!("bars_{}", id))
            .height(PLOT_HEIGHT)
            .allow_scroll(false)
            .x_axis_label(x_label)
            .y_axis_label(y_label);

        let plot = match orientation {
            Orientation::Vertical => plot
                .x_axis_formatter(Self::category_formatter(labels))
                .include_y(0.0),
            Orientation::Horizontal => plot
                .y_axis_formatter(Self::category_formatter(labels))
                .include_x(0.0),
        };

        plot.show(ui, |plot_ui| {
            plot_ui.bar_chart(chart);
        });
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_line(
        ui: &mut egui::Ui,
        id: &str,
        x_label: &str,
        y_label: &str,
        points: &[(f64, f64)],
        x_window: Option<(f64, f64)>,
        tick_labels: &[(f64, String)],
    ) {
        let visible = Chart::visible_points(points, x_window);
        let series: Vec<[f64; 2]> = visible.iter().map(|&(x, y)| [x, y]).collect();
        let ticks = tick_labels.to_vec();

        let mut plot = Plot::new(format!("line_{}", id))
            .height(PLOT_HEIGHT)
            .allow_scroll(false)
            .x_axis_label(x_label)
            .y_axis_label(y_label)
            .x_axis_formatter(move |mark, _range| {
                let rounded = mark.value.round();
                if (mark.value - rounded).abs() > 1e-6 {
                    return String::new();
                }
                ticks
                    .iter()
                    .find(|(x, _)| *x == rounded)
                    .map(|(_, label)| label.clone())
                    .unwrap_or_else(|| format!("{}", rounded as i64))
            });

        if let Some((lo, hi)) = x_window {
            plot = plot.include_x(lo).include_x(hi);
        }

        plot.show(ui, |plot_ui| {
            let color = color32(palette_color(0));
            plot_ui.line(
                Line::new(PlotPoints::from(series.clone()))
                    .color(color)
                    .width(2.0)
                    .name(y_label),
            );
            plot_ui.points(Points::new(PlotPoints::from(series)).radius(3.0).color(color));
        });
    }

    /// Pie drawn with the painter as wedges of at most 45 degrees each so
    /// every polygon stays convex.
    fn draw_pie(ui: &mut egui::Ui, slices: &[Category]) {
        let values: Vec<f64> = slices.iter().map(|s| s.value).collect();
        let angles = pie_angles(&values);
        if angles.is_empty() {
            ui.label(RichText::new("No data").color(Color32::GRAY));
            return;
        }
        let total: f64 = values.iter().filter(|v| **v > 0.0).sum();

        let size = egui::vec2(ui.available_width().min(520.0), PLOT_HEIGHT);
        let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
        let painter = ui.painter_at(rect);

        let radius = (rect.height() / 2.0 - 10.0).max(10.0);
        let center = egui::pos2(rect.left() + radius + 10.0, rect.center().y);

        let max_step = std::f64::consts::FRAC_PI_4;
        for (i, (start, end)) in angles.iter().enumerate() {
            let fill = color32(pastel_color(i));
            let steps = ((end - start) / max_step).ceil().max(1.0) as usize;
            for step in 0..steps {
                let a0 = start + (end - start) * step as f64 / steps as f64;
                let a1 = start + (end - start) * (step + 1) as f64 / steps as f64;
                let arc: Vec<egui::Pos2> = (0..=8)
                    .map(|k| {
                        let a = a0 + (a1 - a0) * k as f64 / 8.0;
                        center + radius * egui::vec2(a.cos() as f32, a.sin() as f32)
                    })
                    .collect();
                let mut wedge = vec![center];
                wedge.extend(arc);
                painter.add(egui::Shape::convex_polygon(wedge, fill, Stroke::NONE));
            }
        }

        // Legend on the right
        let text_color = ui.visuals().text_color();
        let mut y = rect.top() + 20.0;
        let legend_x = center.x + radius + 30.0;
        for (i, slice) in slices.iter().enumerate() {
            let swatch = egui::Rect::from_min_size(egui::pos2(legend_x, y), egui::vec2(14.0, 14.0));
            painter.rect_filled(swatch, 3.0, color32(pastel_color(i)));
            let pct = if total > 0.0 {
                slice.value.max(0.0) / total * 100.0
            } else {
                0.0
            };
            painter.text(
                egui::pos2(legend_x + 22.0, y + 7.0),
                egui::Align2::LEFT_CENTER,
                format!("{} - {} ({:.1}%)", slice.label, slice.value, pct),
                egui::FontId::proportional(13.0),
                text_color,
            );
            y += 24.0;
        }
    }

    fn draw_crosstab(ui: &mut egui::Ui, id: &str, table: &CrossTab) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new(ui.make_persistent_id(format!("crosstab_{}", id)))
                    .striped(true)
                    .min_col_width(110.0)
                    .spacing([12.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("");
                        for header in &table.column_labels {
                            ui.label(RichText::new(header).strong());
                        }
                        ui.end_row();

                        for (label, row) in table.row_labels.iter().zip(&table.counts) {
                            ui.label(RichText::new(label).strong());
                            for count in row {
                                ui.label(count.to_string());
                            }
                            ui.end_row();
                        }
                    });
            });
    }

    fn draw_map(ui: &mut egui::Ui, id: &str, points: &[[f64; 2]]) {
        let (x_min, x_max) = padded_range(points.iter().map(|p| p[0]));
        let (y_min, y_max) = padded_range(points.iter().map(|p| p[1]));
        let pts: Vec<[f64; 2]> = points.to_vec();

        Plot::new(format!("map_{}", id))
            .height(PLOT_HEIGHT * 1.5)
            .data_aspect(1.0)
            .allow_scroll(false)
            .x_axis_label("longitude")
            .y_axis_label("latitude")
            .include_x(x_min)
            .include_x(x_max)
            .include_y(y_min)
            .include_y(y_max)
            .show(ui, |plot_ui| {
                plot_ui.points(
                    Points::new(PlotPoints::from(pts))
                        .radius(1.5)
                        .color(color32(palette_color(1)).gamma_multiply(0.6))
                        .name("houses"),
                );
            });
    }

    /// Descriptive statistics grid for the partitions of one insight.
    pub fn draw_stats_table(ui: &mut egui::Ui, id: &str, groups: &[GroupStats]) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new(ui.make_persistent_id(format!("stats_table_{}", id)))
                    .striped(true)
                    .min_col_width(55.0)
                    .spacing([8.0, 4.0])
                    .show(ui, |ui| {
                        for header in [
                            "Group", "N", "Mean", "Trimmed", "Median", "Std", "P95", "P05",
                        ] {
                            ui.label(RichText::new(header).strong().size(11.0));
                        }
                        ui.end_row();

                        for (i, gs) in groups.iter().enumerate() {
                            ui.label(
                                RichText::new(&gs.group_name)
                                    .size(11.0)
                                    .color(color32(palette_color(i))),
                            );
                            ui.label(RichText::new(gs.count.to_string()).size(11.0));
                            for value in [gs.mean, gs.trimmed_mean, gs.median, gs.std, gs.p95, gs.p05]
                            {
                                ui.label(RichText::new(stat_cell(value)).size(11.0));
                            }
                            ui.end_row();
                        }
                    });
            });
    }
}
