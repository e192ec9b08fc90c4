//! Static Chart Renderer
//! Renders a [`Chart`] into PNG bytes with plotters, for the report archive.

use crate::charts::model::{
    padded_range, palette_color, pastel_color, pie_angles, Category, Chart, CrossTab, Orientation,
    Series,
};
use crate::stats::StatsCalculator;
use image::{DynamicImage, ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::io::Cursor;
use thiserror::Error;

const FONT: &str = "sans-serif";
const VIOLIN_BINS: usize = 40;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Drawing(String),

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Invalid image size {0}x{1}")]
    InvalidSize(u32, u32),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Drawing(err.to_string())
    }
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn rgb(color: (u8, u8, u8)) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

/// Label of the category sitting at integer position `x`, empty between.
pub fn category_label(labels: &[String], x: f64) -> String {
    let rounded = x.round();
    if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

/// Value axis range for bars: always includes zero, 10% headroom.
pub fn bar_value_range(values: &[f64]) -> (f64, f64) {
    let max = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0f64, f64::max);
    let min = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0f64, f64::min);
    if max == min {
        return (0.0, 1.0);
    }
    (min * 1.1, max * 1.1)
}

/// Encode a packed RGB buffer as PNG.
pub fn encode_png(buffer: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
    let image =
        RgbImage::from_raw(width, height, buffer).ok_or(RenderError::InvalidSize(width, height))?;
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image).write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

pub struct ChartRenderer;

impl ChartRenderer {
    /// Render a chart with a title into PNG bytes.
    pub fn render_png(
        chart: &Chart,
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSize(width, height));
        }

        let mut buffer = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE)?;

            match chart {
                Chart::Violin {
                    x_label,
                    y_label,
                    series,
                } => Self::draw_violin(&root, title, x_label, y_label, series)?,
                Chart::Bars {
                    x_label,
                    y_label,
                    orientation,
                    bars,
                } => Self::draw_bars(&root, title, x_label, y_label, *orientation, bars)?,
                Chart::Line {
                    x_label,
                    y_label,
                    points,
                    x_window,
                    tick_labels,
                } => Self::draw_line(
                    &root,
                    title,
                    x_label,
                    y_label,
                    &Chart::visible_points(points, *x_window),
                    tick_labels,
                )?,
                Chart::Pie { slices } => Self::draw_pie(&root, title, slices)?,
                Chart::CrossTab(table) => Self::draw_crosstab(&root, title, table)?,
                Chart::Map { points } => Self::draw_map(&root, title, points)?,
            }

            root.present()?;
        }

        encode_png(buffer, width, height)
    }

    fn draw_violin(
        root: &Area,
        title: &str,
        x_label: &str,
        y_label: &str,
        series: &[Series],
    ) -> Result<(), RenderError> {
        let labels: Vec<String> = series.iter().map(|s| s.label.clone()).collect();
        let (y_min, y_max) = padded_range(series.iter().flat_map(|s| s.values.iter().copied()));
        let x_max = series.len().max(1) as f64 - 0.5;

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 22))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(-0.5f64..x_max, y_min..y_max)?;

        let x_fmt = |x: &f64| category_label(&labels, *x);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(series.len() * 2 + 1)
            .x_label_formatter(&x_fmt)
            .x_desc(x_label)
            .y_desc(y_label)
            .draw()?;

        for (i, s) in series.iter().enumerate() {
            if s.values.is_empty() {
                continue;
            }
            let color = rgb(palette_color(i));
            let center = i as f64;

            let profile = StatsCalculator::density_profile(&s.values, VIOLIN_BINS);
            let mut outline: Vec<(f64, f64)> = profile
                .iter()
                .map(|p| (center + p.density * 0.4, p.value))
                .collect();
            outline.extend(
                profile
                    .iter()
                    .rev()
                    .map(|p| (center - p.density * 0.4, p.value)),
            );

            chart.draw_series(std::iter::once(Polygon::new(
                outline.clone(),
                color.mix(0.3).filled(),
            )))?;
            if let Some(first) = outline.first().copied() {
                outline.push(first);
            }
            chart.draw_series(std::iter::once(PathElement::new(outline, color.stroke_width(2))))?;

            let mut sorted = s.values.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let q1 = StatsCalculator::percentile(&sorted, 25.0);
            let median = StatsCalculator::percentile(&sorted, 50.0);
            let q3 = StatsCalculator::percentile(&sorted, 75.0);

            chart.draw_series(std::iter::once(Rectangle::new(
                [(center - 0.04, q1), (center + 0.04, q3)],
                BLACK.mix(0.7).filled(),
            )))?;
            chart.draw_series(std::iter::once(Circle::new(
                (center, median),
                4,
                WHITE.filled(),
            )))?;
        }

        Ok(())
    }

    fn draw_bars(
        root: &Area,
        title: &str,
        x_label: &str,
        y_label: &str,
        orientation: Orientation,
        bars: &[Category],
    ) -> Result<(), RenderError> {
        let labels: Vec<String> = bars.iter().map(|b| b.label.clone()).collect();
        let values: Vec<f64> = bars.iter().map(|b| b.value).collect();
        let (v_min, v_max) = bar_value_range(&values);
        let c_max = bars.len().max(1) as f64 - 0.5;
        let cat_fmt = |x: &f64| category_label(&labels, *x);
        let ticks = bars.len() * 2 + 1;

        match orientation {
            Orientation::Vertical => {
                let mut chart = ChartBuilder::on(root)
                    .caption(title, (FONT, 22))
                    .margin(15)
                    .x_label_area_size(40)
                    .y_label_area_size(80)
                    .build_cartesian_2d(-0.5f64..c_max, v_min..v_max)?;

                chart
                    .configure_mesh()
                    .disable_x_mesh()
                    .x_labels(ticks)
                    .x_label_formatter(&cat_fmt)
                    .x_desc(x_label)
                    .y_desc(y_label)
                    .draw()?;

                chart.draw_series(bars.iter().enumerate().map(|(i, b)| {
                    let x = i as f64;
                    Rectangle::new(
                        [(x - 0.3, 0.0), (x + 0.3, b.value)],
                        rgb(palette_color(i)).filled(),
                    )
                }))?;
            }
            Orientation::Horizontal => {
                let mut chart = ChartBuilder::on(root)
                    .caption(title, (FONT, 22))
                    .margin(15)
                    .x_label_area_size(40)
                    .y_label_area_size(90)
                    .build_cartesian_2d(v_min..v_max, -0.5f64..c_max)?;

                chart
                    .configure_mesh()
                    .disable_y_mesh()
                    .y_labels(ticks)
                    .y_label_formatter(&cat_fmt)
                    .x_desc(x_label)
                    .y_desc(y_label)
                    .draw()?;

                chart.draw_series(bars.iter().enumerate().map(|(i, b)| {
                    let y = i as f64;
                    Rectangle::new(
                        [(0.0, y - 0.3), (b.value, y + 0.3)],
                        rgb(palette_color(i)).filled(),
                    )
                }))?;
            }
        }

        Ok(())
    }

    fn draw_line(
        root: &Area,
        title: &str,
        x_label: &str,
        y_label: &str,
        points: &[(f64, f64)],
        tick_labels: &[(f64, String)],
    ) -> Result<(), RenderError> {
        let (x_min, x_max) = padded_range(points.iter().map(|p| p.0));
        let (y_min, y_max) = padded_range(points.iter().map(|p| p.1));

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 22))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        let x_fmt = |x: &f64| {
            let rounded = x.round();
            if (x - rounded).abs() > 1e-6 {
                return String::new();
            }
            tick_labels
                .iter()
                .find(|(tick, _)| *tick == rounded)
                .map(|(_, label)| label.clone())
                .unwrap_or_else(|| format!("{}", rounded as i64))
        };

        chart
            .configure_mesh()
            .x_label_formatter(&x_fmt)
            .x_desc(x_label)
            .y_desc(y_label)
            .draw()?;

        let color = rgb(palette_color(0));
        chart.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?;
        chart.draw_series(
            points
                .iter()
                .map(|&point| Circle::new(point, 3, color.filled())),
        )?;

        Ok(())
    }

    fn draw_pie(root: &Area, title: &str, slices: &[Category]) -> Result<(), RenderError> {
        let area = root.titled(title, (FONT, 22))?;
        let values: Vec<f64> = slices.iter().map(|s| s.value).collect();
        let angles = pie_angles(&values);
        let total: f64 = values.iter().filter(|v| **v > 0.0).sum();

        let (w, h) = area.dim_in_pixel();
        let radius = (h.min(w) as f64 / 2.0 - 20.0).max(10.0);
        let center = (radius + 30.0, h as f64 / 2.0);

        for (i, (start, end)) in angles.iter().enumerate() {
            let steps = (((end - start) / std::f64::consts::TAU) * 180.0).ceil().max(2.0) as usize;
            let mut wedge = vec![(center.0 as i32, center.1 as i32)];
            wedge.extend((0..=steps).map(|k| {
                let a = start + (end - start) * k as f64 / steps as f64;
                (
                    (center.0 + radius * a.cos()) as i32,
                    (center.1 + radius * a.sin()) as i32,
                )
            }));
            area.draw(&Polygon::new(wedge, rgb(pastel_color(i)).filled()))?;
        }

        let legend_x = (center.0 + radius + 40.0) as i32;
        for (i, slice) in slices.iter().enumerate() {
            let y = 40 + i as i32 * 30;
            area.draw(&Rectangle::new(
                [(legend_x, y), (legend_x + 18, y + 18)],
                rgb(pastel_color(i)).filled(),
            ))?;
            let pct = if total > 0.0 {
                slice.value.max(0.0) / total * 100.0
            } else {
                0.0
            };
            area.draw(&Text::new(
                format!("{} - {} ({:.1}%)", slice.label, slice.value, pct),
                (legend_x + 28, y + 2),
                (FONT, 18).into_font(),
            ))?;
        }

        Ok(())
    }

    fn draw_crosstab(root: &Area, title: &str, table: &CrossTab) -> Result<(), RenderError> {
        let area = root.titled(title, (FONT, 22))?;
        let font = (FONT, 18).into_font();
        let col_w = 180;
        let row_h = 36;
        let left = 40;
        let top = 40;

        let header_cells = std::iter::once(String::new()).chain(table.column_labels.iter().cloned());
        for (c, header) in header_cells.enumerate() {
            area.draw(&Text::new(
                header,
                (left + c as i32 * col_w, top),
                font.clone().style(FontStyle::Bold),
            ))?;
        }

        for (r, (label, row)) in table.row_labels.iter().zip(&table.counts).enumerate() {
            let y = top + (r as i32 + 1) * row_h;
            if r % 2 == 0 {
                area.draw(&Rectangle::new(
                    [
                        (left - 10, y - 8),
                        (left + (row.len() as i32 + 1) * col_w, y + row_h - 8),
                    ],
                    RGBColor(240, 240, 240).filled(),
                ))?;
            }
            area.draw(&Text::new(
                label.clone(),
                (left, y),
                font.clone().style(FontStyle::Bold),
            ))?;
            for (c, count) in row.iter().enumerate() {
                area.draw(&Text::new(
                    count.to_string(),
                    (left + (c as i32 + 1) * col_w, y),
                    font.clone(),
                ))?;
            }
        }

        Ok(())
    }

    fn draw_map(root: &Area, title: &str, points: &[[f64; 2]]) -> Result<(), RenderError> {
        let (x_min, x_max) = padded_range(points.iter().map(|p| p[0]));
        let (y_min, y_max) = padded_range(points.iter().map(|p| p[1]));

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 22))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        chart
            .configure_mesh()
            .x_desc("longitude")
            .y_desc("latitude")
            .draw()?;

        let color = rgb(palette_color(1)).mix(0.5);
        chart.draw_series(
            points
                .iter()
                .map(|p| Circle::new((p[0], p[1]), 1, color.filled())),
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_label() {
        let labels = vec!["no".to_string(), "yes".to_string()];
        assert_eq!(category_label(&labels, 0.0), "no");
        assert_eq!(category_label(&labels, 1.0000000001), "yes");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, -1.0), "");
        assert_eq!(category_label(&labels, 2.0), "");
    }

    #[test]
    fn test_bar_value_range_includes_zero() {
        let (lo, hi) = bar_value_range(&[10.0, 20.0]);
        assert_eq!(lo, 0.0);
        assert!((hi - 22.0).abs() < 1e-9);
        let (lo, hi) = bar_value_range(&[-10.0, 5.0]);
        assert!(lo < -10.0 && hi > 5.0);
        assert_eq!(bar_value_range(&[]), (0.0, 1.0));
    }

    #[test]
    fn test_encode_png_signature() {
        let bytes = encode_png(vec![255u8; 4 * 3 * 3], 4, 3).unwrap();
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn test_encode_png_rejects_short_buffer() {
        assert!(matches!(
            encode_png(vec![0u8; 5], 4, 3),
            Err(RenderError::InvalidSize(4, 3))
        ));
    }

    #[test]
    fn test_zero_size_rejected() {
        let chart = Chart::Pie { slices: Vec::new() };
        assert!(matches!(
            ChartRenderer::render_png(&chart, "empty", 0, 100),
            Err(RenderError::InvalidSize(0, 100))
        ));
    }
}
