//! Buy/sell recommendation pass.
//!
//! Buy a house when it is in good condition, has a waterfront view and costs
//! less than its region's mean price. Resell at a 30% markup when it is below
//! the mean of its region in the same season, 10% otherwise.

use crate::charts::Chart;
use crate::data::{NO, YES};
use crate::report::ReportError;
use polars::prelude::*;
use tracing::info;

pub const LOW_PRICE_MARKUP: f64 = 0.3;
pub const DEFAULT_MARKUP: f64 = 0.1;

pub const BUY_COLUMNS: [&str; 6] = ["id", "price", "zipcode", "lat", "lon", "season"];
pub const SELL_COLUMNS: [&str; 6] = ["id", "sell_price", "zipcode", "lat", "lon", "season"];

/// Output of the recommendation pass. Owns its own annotated copy of the table.
#[derive(Debug, Clone)]
pub struct RecommendationReport {
    pub table: DataFrame,
    pub total_profit: f64,
    pub buy_candidates: DataFrame,
    pub sell_prices: DataFrame,
    pub map: Chart,
}

impl RecommendationReport {
    pub fn buy_count(&self) -> usize {
        self.buy_candidates.height()
    }
}

/// `yes` iff condition is good, waterfront, and price below the region mean.
pub fn buy_expr() -> Expr {
    when(
        col("condition_type")
            .eq(lit("good"))
            .and(col("waterfront").eq(lit(YES)))
            .and(col("price").lt(col("price_mean_by_zipcode"))),
    )
    .then(lit(YES))
    .otherwise(lit(NO))
}

pub fn sell_price_expr() -> Expr {
    when(col("price").lt(col("price_mean_by_zipcode_and_season")))
        .then(col("price") * lit(1.0 + LOW_PRICE_MARKUP))
        .otherwise(col("price") * lit(1.0 + DEFAULT_MARKUP))
}

/// Annotate a copy of the canonical table with buy / sell columns.
pub fn annotate(df: &DataFrame) -> PolarsResult<DataFrame> {
    df.clone()
        .lazy()
        .with_column(buy_expr().alias("buy"))
        .with_column(
            col("price")
                .mean()
                .over([col("zipcode"), col("season")])
                .alias("price_mean_by_zipcode_and_season"),
        )
        .with_column(sell_price_expr().alias("sell_price"))
        .with_column((col("sell_price") - col("price")).alias("profit"))
        .collect()
}

/// Run the recommendation pass over the canonical table.
pub fn recommend(df: &DataFrame) -> Result<RecommendationReport, ReportError> {
    let table = annotate(df)?;

    let buy_candidates = table
        .clone()
        .lazy()
        .filter(col("buy").eq(lit(YES)))
        .select(BUY_COLUMNS.iter().map(|c| col(*c)).collect::<Vec<_>>())
        .collect()?;

    let total_profit = table
        .clone()
        .lazy()
        .filter(col("buy").eq(lit(YES)))
        .select([col("profit").sum()])
        .collect()?
        .column("profit")?
        .f64()?
        .get(0)
        .unwrap_or(0.0);

    let sell_prices = table
        .clone()
        .lazy()
        .select(SELL_COLUMNS.iter().map(|c| col(*c)).collect::<Vec<_>>())
        .collect()?;

    let map = location_map(&table)?;

    info!(
        "Recommendation: {} buy candidates, estimated profit {:.2}",
        buy_candidates.height(),
        total_profit
    );

    Ok(RecommendationReport {
        table,
        total_profit,
        buy_candidates,
        sell_prices,
        map,
    })
}

/// Scatter of every row's (lon, lat).
pub fn location_map(df: &DataFrame) -> PolarsResult<Chart> {
    let lon = df.column("lon")?.cast(&DataType::Float64)?;
    let lat = df.column("lat")?.cast(&DataType::Float64)?;

    let points = lon
        .f64()?
        .into_iter()
        .zip(lat.f64()?.into_iter())
        .filter_map(|(x, y)| Some([x?, y?]))
        .collect();

    Ok(Chart::Map { points })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical() -> DataFrame {
        df! {
            "id" => [1i64, 2, 3, 4, 5, 6],
            "price" => [100.0f64, 300.0, 150.0, 50.0, 400.0, 200.0],
            "waterfront" => ["yes", "yes", "no", "yes", "yes", "yes"],
            "condition_type" => ["good", "good", "good", "regular", "good", "good"],
            "season" => ["winter", "winter", "summer", "summer", "summer", "summer"],
            "zipcode" => [98001i64, 98001, 98001, 98001, 98002, 98002],
            "price_mean_by_zipcode" => [150.0f64, 150.0, 150.0, 150.0, 300.0, 300.0],
            "lat" => [47.0f64, 47.1, 47.2, 47.3, 47.4, 47.5],
            "lon" => [-122.0f64, -122.1, -122.2, -122.3, -122.4, -122.5]
        }
        .unwrap()
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

    fn floats(df: &DataFrame, name: &str) -> Vec<f64> {
        df.column(name).unwrap().f64().unwrap().into_no_null_iter().collect()
    }

    #[test]
    fn test_buy_rule() {
        let table = annotate(&canonical()).unwrap();
        // 1: all three hold; 2: above mean; 3: no waterfront; 4: not good;
        // 5: above mean; 6: all three hold
        assert_eq!(strings(&table, "buy"), vec!["yes", "no", "no", "no", "no", "yes"]);
    }

    #[test]
    fn test_sell_price_markup() {
        let table = annotate(&canonical()).unwrap();
        let prices = floats(&table, "price");
        let season_means = floats(&table, "price_mean_by_zipcode_and_season");
        let sell = floats(&table, "sell_price");

        // 98001/winter = 200, 98001/summer = 100, 98002/summer = 300
        assert_eq!(season_means, vec![200.0, 200.0, 100.0, 100.0, 300.0, 300.0]);

        for ((price, mean), sell) in prices.iter().zip(&season_means).zip(&sell) {
            let factor = if price < mean { 1.3 } else { 1.1 };
            assert!((sell - price * factor).abs() < 1e-9);
        }
    }

    #[test]
    fn test_total_profit_counts_buy_rows_only() {
        let report = recommend(&canonical()).unwrap();
        // row 1: 100 < 200 -> 30; row 6: 200 < 300 -> 60
        assert!((report.total_profit - 90.0).abs() < 1e-9);
        assert_eq!(report.buy_count(), 2);
        assert_eq!(report.sell_prices.height(), 6);
        assert_eq!(
            report
                .buy_candidates
                .get_column_names()
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>(),
            BUY_COLUMNS.map(String::from).to_vec()
        );
    }

    #[test]
    fn test_no_candidates_zero_profit() {
        let df = canonical()
            .lazy()
            .with_column(lit("no").alias("waterfront"))
            .collect()
            .unwrap();
        let report = recommend(&df).unwrap();
        assert_eq!(report.total_profit, 0.0);
        assert_eq!(report.buy_count(), 0);
    }

    #[test]
    fn test_input_table_untouched() {
        let df = canonical();
        let _ = recommend(&df).unwrap();
        assert!(df.column("buy").is_err());
        assert!(df.column("sell_price").is_err());
    }

    #[test]
    fn test_location_map_points() {
        match location_map(&canonical()).unwrap() {
            Chart::Map { points } => {
                assert_eq!(points.len(), 6);
                assert_eq!(points[0], [-122.0, 47.0]);
            }
            other => panic!("expected map, got {}", other.kind()),
        }
    }
}
