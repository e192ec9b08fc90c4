//! End-to-end runs over the sample dataset.

use house_insights::config::AnalysisSettings;
use house_insights::data::{DataLoader, HouseTransformer, LoaderError, CANONICAL_COLUMNS};
use house_insights::pipeline::{self, PipelineError, Stage};
use house_insights::report::{format, Finding, Hypothesis};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("kc_house_sample.csv")
}

fn floats(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect()
}

fn strings(df: &DataFrame, name: &str) -> Vec<String> {
    df.column(name)
        .unwrap()
        .str()
        .unwrap()
        .into_no_null_iter()
        .map(String::from)
        .collect()
}

#[test]
fn test_transform_preserves_rows_and_schema() {
    let raw = DataLoader::load_csv(&fixture()).unwrap();
    let canonical = HouseTransformer::transform(&raw).unwrap();

    assert_eq!(canonical.height(), raw.height());
    let names: Vec<String> = canonical
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(names, CANONICAL_COLUMNS.map(String::from).to_vec());
}

#[test]
fn test_zipcode_mean_deviations_cancel() {
    let raw = DataLoader::load_csv(&fixture()).unwrap();
    let canonical = HouseTransformer::transform(&raw).unwrap();

    let sums = canonical
        .lazy()
        .group_by([col("zipcode")])
        .agg([(col("price") - col("price_mean_by_zipcode"))
            .sum()
            .alias("deviation")])
        .collect()
        .unwrap();

    for deviation in floats(&sums, "deviation") {
        assert!(deviation.abs() < 1e-6, "deviation {}", deviation);
    }
}

#[test]
fn test_pipeline_reports_stages_in_order() {
    let mut stages = Vec::new();
    let report = pipeline::run_with_progress(&fixture(), &AnalysisSettings::default(), |stage| {
        stages.push(stage)
    })
    .unwrap();

    assert_eq!(
        stages,
        vec![Stage::Loading, Stage::Transforming, Stage::Reporting]
    );
    assert_eq!(report.row_count, 15);
}

#[test]
fn test_full_report() {
    let report = pipeline::run(&fixture(), &AnalysisSettings::default()).unwrap();

    // Only the cheap 2015 waterfront house in 98136 qualifies
    let recommendation = &report.recommendation;
    assert_eq!(recommendation.buy_count(), 1);
    assert_eq!(
        floats(&recommendation.buy_candidates, "id"),
        vec![2391600320.0]
    );
    assert!((recommendation.total_profit - 135_000.0).abs() < 1e-6);
    assert_eq!(recommendation.sell_prices.height(), 15);

    let order: Vec<Hypothesis> = report.insights.iter().map(|i| i.hypothesis).collect();
    assert_eq!(order, Hypothesis::ALL.to_vec());

    for insight in &report.insights {
        let statement = format::statement(insight);
        assert!(!statement.is_empty());
        assert!(!statement.contains("NaN"), "{}", statement);
    }
}

#[test]
fn test_buy_and_sell_rules_hold_for_every_row() {
    let report = pipeline::run(&fixture(), &AnalysisSettings::default()).unwrap();
    let table = &report.recommendation.table;

    let prices = floats(table, "price");
    let region_means = floats(table, "price_mean_by_zipcode");
    let season_means = floats(table, "price_mean_by_zipcode_and_season");
    let sell = floats(table, "sell_price");
    let conditions = strings(table, "condition_type");
    let waterfront = strings(table, "waterfront");
    let buy = strings(table, "buy");

    for i in 0..table.height() {
        let expected_buy = conditions[i] == "good"
            && waterfront[i] == "yes"
            && prices[i] < region_means[i];
        assert_eq!(buy[i] == "yes", expected_buy, "row {}", i);

        let factor = if prices[i] < season_means[i] { 1.3 } else { 1.1 };
        assert!((sell[i] - prices[i] * factor).abs() < 1e-6, "row {}", i);
    }
}

#[test]
fn test_waterfront_hypothesis_on_sample() {
    let report = pipeline::run(&fixture(), &AnalysisSettings::default()).unwrap();
    let waterfront = &report.insights[0];

    assert_eq!(waterfront.hypothesis, Hypothesis::Waterfront);
    match waterfront.finding {
        Finding::Comparison {
            change: Some(change),
            ..
        } => assert!(change > 0.0),
        ref other => panic!("unexpected finding {:?}", other),
    }
}

#[test]
fn test_missing_dataset_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("kc_house_data.csv");

    match pipeline::run(&missing, &AnalysisSettings::default()) {
        Err(PipelineError::Load(LoaderError::NotFound(path))) => assert_eq!(path, missing),
        other => panic!("expected NotFound, got {:?}", other.map(|r| r.row_count)),
    }
}
