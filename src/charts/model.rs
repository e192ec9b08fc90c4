//! Chart description model.
//!
//! Report computations produce a [`Chart`]; the interactive plotter and the
//! static PNG renderer both draw from it.

/// Shared color palette (RGB)
pub const PALETTE: [(u8, u8, u8); 10] = [
    (52, 152, 219),  // Blue
    (231, 76, 60),   // Red
    (46, 204, 113),  // Green
    (155, 89, 182),  // Purple
    (243, 156, 18),  // Orange
    (26, 188, 156),  // Teal
    (233, 30, 99),   // Pink
    (0, 188, 212),   // Cyan
    (121, 85, 72),   // Brown
    (96, 125, 139),  // Blue Grey
];

pub const PASTEL: [(u8, u8, u8); 4] = [
    (161, 201, 244), // Blue
    (255, 180, 130), // Orange
    (141, 229, 161), // Green
    (255, 159, 155), // Red
];

pub fn palette_color(idx: usize) -> (u8, u8, u8) {
    PALETTE[idx % PALETTE.len()]
}

pub fn pastel_color(idx: usize) -> (u8, u8, u8) {
    PASTEL[idx % PASTEL.len()]
}

/// Named sample of values (one violin).
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub values: Vec<f64>,
}

/// Labelled scalar (one bar or pie slice).
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub label: String,
    pub value: f64,
}

impl Category {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// Contingency table of counts.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossTab {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    Violin {
        x_label: String,
        y_label: String,
        series: Vec<Series>,
    },
    Bars {
        x_label: String,
        y_label: String,
        orientation: Orientation,
        bars: Vec<Category>,
    },
    Line {
        x_label: String,
        y_label: String,
        points: Vec<(f64, f64)>,
        x_window: Option<(f64, f64)>,
        /// Replaces numeric x tick text where present.
        tick_labels: Vec<(f64, String)>,
    },
    Pie {
        slices: Vec<Category>,
    },
    CrossTab(CrossTab),
    /// Geographic scatter of `[lon, lat]` points.
    Map {
        points: Vec<[f64; 2]>,
    },
}

impl Chart {
    /// Short name used for ids and file names.
    pub fn kind(&self) -> &'static str {
        match self {
            Chart::Violin { .. } => "violin",
            Chart::Bars { .. } => "bars",
            Chart::Line { .. } => "line",
            Chart::Pie { .. } => "pie",
            Chart::CrossTab(_) => "crosstab",
            Chart::Map { .. } => "map",
        }
    }

    /// Points of a line chart restricted to its x window.
    pub fn visible_points(points: &[(f64, f64)], x_window: Option<(f64, f64)>) -> Vec<(f64, f64)> {
        match x_window {
            Some((lo, hi)) => points
                .iter()
                .copied()
                .filter(|(x, _)| *x >= lo && *x <= hi)
                .collect(),
            None => points.to_vec(),
        }
    }
}

/// Pie slice angles in radians, starting at 12 o'clock and going clockwise.
/// Returns `(start, end)` per slice; empty when the total is not positive.
pub fn pie_angles(values: &[f64]) -> Vec<(f64, f64)> {
    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut start = -std::f64::consts::FRAC_PI_2;
    values
        .iter()
        .map(|&v| {
            let sweep = v.max(0.0) / total * std::f64::consts::TAU;
            let range = (start, start + sweep);
            start += sweep;
            range
        })
        .collect()
}

/// Value-range padded by 5% on each side (for axis bounds).
pub fn padded_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        if v.is_finite() {
            min = min.min(v);
            max = max.max(v);
        }
    }
    if min.is_infinite() {
        return (0.0, 1.0);
    }
    if min == max {
        return (min - 1.0, max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_pie_angles_cover_circle() {
        let angles = pie_angles(&[1.0, 1.0, 2.0]);
        assert_eq!(angles.len(), 3);
        assert_eq!(angles[0].0, -FRAC_PI_2);
        assert!((angles[0].1 - angles[0].0 - PI / 2.0).abs() < 1e-12);
        assert!((angles[2].1 - angles[2].0 - PI).abs() < 1e-12);
        assert!((angles[2].1 - (-FRAC_PI_2 + 2.0 * PI)).abs() < 1e-12);
    }

    #[test]
    fn test_pie_angles_empty_total() {
        assert!(pie_angles(&[0.0, 0.0]).is_empty());
        assert!(pie_angles(&[]).is_empty());
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range([0.0, 100.0]), (-5.0, 105.0));
        assert_eq!(padded_range([3.0]), (2.0, 4.0));
        assert_eq!(padded_range(Vec::<f64>::new()), (0.0, 1.0));
        let (lo, hi) = padded_range([f64::NAN, 1.0, 3.0]);
        assert!((lo - 0.9).abs() < 1e-12);
        assert!((hi - 3.1).abs() < 1e-12);
    }

    #[test]
    fn test_visible_points() {
        let points = [(1999.0, 1.0), (2000.0, 2.0), (2020.0, 3.0), (2021.0, 4.0)];
        let visible = Chart::visible_points(&points, Some((2000.0, 2020.0)));
        assert_eq!(visible, vec![(2000.0, 2.0), (2020.0, 3.0)]);
        assert_eq!(Chart::visible_points(&points, None).len(), 4);
    }
}
