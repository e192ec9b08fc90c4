//! Report archive export.
//!
//! Writes a zip holding a markdown summary, the buy and sell tables as CSV and
//! one PNG per chart.

use crate::charts::ChartRenderer;
use crate::config::CurrencyFormat;
use crate::report::{format, Insight, InsightsReport, TableView};
use polars::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};
use ::zip::write::FileOptions;
use ::zip::{CompressionMethod, ZipWriter};

pub const REPORT_FILE: &str = "report.md";
pub const BUY_FILE: &str = "buy_recommendations.csv";
pub const SELL_FILE: &str = "sell_prices.csv";

/// Rows of the buy table included in the markdown summary.
const MARKDOWN_ROW_LIMIT: usize = 20;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] ::zip::result::ZipError),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// A rendered chart ready to be archived.
#[derive(Debug, Clone)]
pub struct ChartImage {
    pub file_name: String,
    pub png: Vec<u8>,
}

/// Archive path of a chart: `charts/NN_<slug>.png`.
pub fn chart_file_name(index: usize, slug: &str) -> String {
    format!("charts/{:02}_{}.png", index, slug)
}

pub struct ReportExporter;

impl ReportExporter {
    /// Render the location map (index 0) and every hypothesis chart.
    /// Charts that fail to render are logged and skipped.
    pub fn render_charts(report: &InsightsReport, width: u32, height: u32) -> Vec<ChartImage> {
        let mut jobs = vec![(
            chart_file_name(0, "location_map"),
            "Location of houses".to_string(),
            &report.recommendation.map,
        )];
        jobs.extend(report.insights.iter().map(|insight| {
            (
                chart_file_name(insight.hypothesis.number(), insight.hypothesis.slug()),
                format::title(insight.hypothesis),
                &insight.chart,
            )
        }));

        jobs.into_iter()
            .filter_map(|(file_name, title, chart)| {
                match ChartRenderer::render_png(chart, &title, width, height) {
                    Ok(png) => Some(ChartImage { file_name, png }),
                    Err(e) => {
                        warn!("Skipping chart {}: {}", file_name, e);
                        None
                    }
                }
            })
            .collect()
    }

    /// Write the archive to `path`.
    pub fn export_archive(
        report: &InsightsReport,
        currency: &CurrencyFormat,
        charts: &[ChartImage],
        path: &Path,
    ) -> Result<(), ExportError> {
        let file = File::create(path)?;
        let mut zip = ZipWriter::new(file);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file(REPORT_FILE, options)?;
        zip.write_all(Self::render_markdown(report, currency).as_bytes())?;

        zip.start_file(BUY_FILE, options)?;
        zip.write_all(&Self::csv_bytes(&report.recommendation.buy_candidates)?)?;

        zip.start_file(SELL_FILE, options)?;
        zip.write_all(&Self::csv_bytes(&report.recommendation.sell_prices)?)?;

        // PNG data is already compressed
        let stored = FileOptions::default().compression_method(CompressionMethod::Stored);
        for chart in charts {
            zip.start_file(chart.file_name.as_str(), stored)?;
            zip.write_all(&chart.png)?;
        }

        zip.finish()?;
        info!(
            "Exported report archive with {} charts to {}",
            charts.len(),
            path.display()
        );
        Ok(())
    }

    fn csv_bytes(df: &DataFrame) -> Result<Vec<u8>, ExportError> {
        let mut df = df.clone();
        let mut bytes = Vec::new();
        CsvWriter::new(&mut bytes)
            .include_header(true)
            .finish(&mut df)?;
        Ok(bytes)
    }

    /// Markdown summary: headline, buy table excerpt, then one section per
    /// hypothesis with its statement and descriptive statistics.
    pub fn render_markdown(report: &InsightsReport, currency: &CurrencyFormat) -> String {
        let recommendation = &report.recommendation;
        let mut md = String::new();

        md.push_str("# House Insights Report\n\n");
        md.push_str(&format!("{} houses analyzed.\n\n", report.row_count));

        md.push_str("## Recommendations\n\n");
        md.push_str(&format!(
            "**{}** from {} buy candidates.\n\n",
            format::profit_headline(recommendation.total_profit, currency),
            recommendation.buy_count()
        ));
        if recommendation.buy_count() > 0 {
            md.push_str(
                &TableView::from_frame(&recommendation.buy_candidates)
                    .to_markdown(MARKDOWN_ROW_LIMIT),
            );
            md.push('\n');
        }

        md.push_str("## Hypotheses\n\n");
        for insight in &report.insights {
            Self::push_insight(&mut md, insight);
        }

        md
    }

    fn push_insight(md: &mut String, insight: &Insight) {
        md.push_str(&format!("### {}\n\n", format::title(insight.hypothesis)));
        md.push_str(&format!("{}\n\n", format::statement(insight)));
        if let Some(note) = format::significance_note(insight) {
            md.push_str(&format!("_{}_\n\n", note));
        }

        if insight.groups.is_empty() {
            return;
        }
        md.push_str("| group | count | mean | trimmed mean | median | std | p05 | p95 |\n");
        md.push_str("|---|---|---|---|---|---|---|---|\n");
        for g in &insight.groups {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
                g.group_name,
                g.count,
                format::stat_cell(g.mean),
                format::stat_cell(g.trimmed_mean),
                format::stat_cell(g.median),
                format::stat_cell(g.std),
                format::stat_cell(g.p05),
                format::stat_cell(g.p95),
            ));
        }
        md.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::recommend;
    use pretty_assertions::assert_eq;
    use std::io::Read;

    fn report() -> InsightsReport {
        let canonical = df! {
            "id" => [1i64, 2, 3],
            "price" => [100.0f64, 300.0, 150.0],
            "waterfront" => ["yes", "yes", "no"],
            "condition_type" => ["good", "good", "good"],
            "season" => ["winter", "winter", "summer"],
            "zipcode" => [98001i64, 98001, 98001],
            "price_mean_by_zipcode" => [150.0f64, 150.0, 150.0],
            "lat" => [47.0f64, 47.1, 47.2],
            "lon" => [-122.0f64, -122.1, -122.2]
        }
        .unwrap();

        InsightsReport {
            row_count: canonical.height(),
            recommendation: recommend(&canonical).unwrap(),
            insights: Vec::new(),
        }
    }

    #[test]
    fn test_chart_file_name() {
        assert_eq!(chart_file_name(3, "year_over_year"), "charts/03_year_over_year.png");
        assert_eq!(chart_file_name(12, "large_living_area"), "charts/12_large_living_area.png");
    }

    #[test]
    fn test_markdown_headline() {
        let md = ReportExporter::render_markdown(&report(), &CurrencyFormat::en_us());
        assert!(md.starts_with("# House Insights Report\n"));
        assert!(md.contains("3 houses analyzed."));
        // row 1 only: 100 < 200 -> 30% markup
        assert!(md.contains("Estimated profit of $30.00"));
        assert!(md.contains("from 1 buy candidates"));
    }

    #[test]
    fn test_archive_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.zip");
        let charts = vec![ChartImage {
            file_name: chart_file_name(0, "location_map"),
            png: vec![1, 2, 3],
        }];

        ReportExporter::export_archive(&report(), &CurrencyFormat::pt_br(), &charts, &path)
            .unwrap();

        let mut archive = ::zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                BUY_FILE.to_string(),
                "charts/00_location_map.png".to_string(),
                REPORT_FILE.to_string(),
                SELL_FILE.to_string(),
            ]
        );

        let mut buy_csv = String::new();
        archive
            .by_name(BUY_FILE)
            .unwrap()
            .read_to_string(&mut buy_csv)
            .unwrap();
        let mut lines = buy_csv.lines();
        assert_eq!(lines.next(), Some("id,price,zipcode,lat,lon,season"));
        assert_eq!(lines.count(), 1);

        let mut sell_csv = String::new();
        archive
            .by_name(SELL_FILE)
            .unwrap()
            .read_to_string(&mut sell_csv)
            .unwrap();
        assert_eq!(sell_csv.lines().count(), 4);

        let mut png = Vec::new();
        archive
            .by_name("charts/00_location_map.png")
            .unwrap()
            .read_to_end(&mut png)
            .unwrap();
        assert_eq!(png, vec![1, 2, 3]);
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.zip");
        let result = ReportExporter::export_archive(&report(), &CurrencyFormat::pt_br(), &[], &path);
        assert!(matches!(result, Err(ExportError::Io(_))));
    }
}
