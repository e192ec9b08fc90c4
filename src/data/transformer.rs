//! Data Transformer Module
//! Derives the canonical analysis table from the raw sales table.
//!
//! Each derivation is a pure `LazyFrame -> LazyFrame` step so that it can be
//! tested on its own. [`HouseTransformer::transform`] chains them in order and
//! collects once:
//!
//! 1. `parse_dates`
//! 2. `coerce_counts`
//! 3. `recode_waterfront`
//! 4. `convert_areas`
//! 5. `derive_has_basement`
//! 6. `add_price_mean_by_zipcode`
//! 7. `bucket_condition`, `bucket_season`
//! 8. `project_canonical`

use polars::prelude::*;
use thiserror::Error;
use tracing::info;

/// Multiplicative constant applied to every sqft area column.
pub const AREA_FACTOR: f64 = 0.3048;

/// Text format of the source `date` column, e.g. `20141013T000000`.
pub const DATE_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Sentinel for values outside every bucket.
pub const NOT_AVAILABLE: &str = "NA";

pub const YES: &str = "yes";
pub const NO: &str = "no";

/// Column set of the canonical table, in output order.
pub const CANONICAL_COLUMNS: [&str; 19] = [
    "id",
    "date",
    "price",
    "bedrooms",
    "bathrooms",
    "m2_living",
    "m2_lot",
    "floors",
    "waterfront",
    "condition_type",
    "season",
    "has_basement",
    "m2_basement",
    "yr_built",
    "yr_renovated",
    "zipcode",
    "price_mean_by_zipcode",
    "lat",
    "lon",
];

// Bucket boundaries
const CONDITION_BAD: (i64, i64) = (1, 2);
const CONDITION_REGULAR: (i64, i64) = (3, 4);
const CONDITION_GOOD: i64 = 5;

const WINTER_END: u32 = 2;
const WINTER_START: u32 = 12;
const SPRING: (u32, u32) = (3, 5);
const SUMMER: (u32, u32) = (6, 8);
const FALL: (u32, u32) = (9, 11);

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("Row count changed during transform: {before} -> {after}")]
    RowCountChanged { before: usize, after: usize },
}

fn between(expr: Expr, low: i64, high: i64) -> Expr {
    expr.clone().gt_eq(lit(low)).and(expr.lt_eq(lit(high)))
}

fn yes_no(predicate: Expr) -> Expr {
    when(predicate).then(lit(YES)).otherwise(lit(NO))
}

/// Builds the canonical table. Stateless.
pub struct HouseTransformer;

impl HouseTransformer {
    /// Run every derivation step in order.
    pub fn transform(raw: &DataFrame) -> Result<DataFrame, TransformError> {
        let before = raw.height();

        let lf = raw.clone().lazy();
        let lf = Self::parse_dates(lf);
        let lf = Self::coerce_counts(lf);
        let lf = Self::recode_waterfront(lf);
        let lf = Self::convert_areas(lf);
        let lf = Self::derive_has_basement(lf);
        let lf = Self::add_price_mean_by_zipcode(lf);
        let lf = Self::bucket_condition(lf);
        let lf = Self::bucket_season(lf);
        let df = Self::project_canonical(lf).collect()?;

        if df.height() != before {
            return Err(TransformError::RowCountChanged {
                before,
                after: df.height(),
            });
        }

        info!("Transformed {} rows into {} columns", df.height(), df.width());
        Ok(df)
    }

    /// Parse `date` into a datetime; unparsable values become null.
    pub fn parse_dates(lf: LazyFrame) -> LazyFrame {
        let options = StrptimeOptions {
            format: Some(DATE_FORMAT.into()),
            strict: false,
            ..Default::default()
        };
        lf.with_column(
            col("date")
                .cast(DataType::String)
                .str()
                .to_datetime(Some(TimeUnit::Milliseconds), None, options, lit("raise"))
                .alias("date"),
        )
    }

    /// Truncate fractional bathroom and floor counts; normalize price to f64.
    pub fn coerce_counts(lf: LazyFrame) -> LazyFrame {
        lf.with_columns([
            col("bathrooms").cast(DataType::Int64),
            col("floors").cast(DataType::Int64),
            col("price").cast(DataType::Float64),
        ])
    }

    pub fn recode_waterfront(lf: LazyFrame) -> LazyFrame {
        lf.with_column(yes_no(col("waterfront").eq(lit(1))).alias("waterfront"))
    }

    /// Scale sqft areas by [`AREA_FACTOR`] and expose `long` as `lon`.
    pub fn convert_areas(lf: LazyFrame) -> LazyFrame {
        lf.with_columns([
            (col("sqft_basement").cast(DataType::Float64) * lit(AREA_FACTOR)).alias("m2_basement"),
            (col("sqft_living").cast(DataType::Float64) * lit(AREA_FACTOR)).alias("m2_living"),
            (col("sqft_lot").cast(DataType::Float64) * lit(AREA_FACTOR)).alias("m2_lot"),
            col("long").alias("lon"),
        ])
    }

    pub fn derive_has_basement(lf: LazyFrame) -> LazyFrame {
        lf.with_column(yes_no(col("m2_basement").gt(lit(0.0))).alias("has_basement"))
    }

    /// Broadcast the mean price of each zipcode onto its rows.
    pub fn add_price_mean_by_zipcode(lf: LazyFrame) -> LazyFrame {
        lf.with_column(
            col("price")
                .mean()
                .over([col("zipcode")])
                .alias("price_mean_by_zipcode"),
        )
    }

    pub fn bucket_condition(lf: LazyFrame) -> LazyFrame {
        let score = col("condition").cast(DataType::Int64);
        lf.with_column(
            when(between(score.clone(), CONDITION_BAD.0, CONDITION_BAD.1))
                .then(lit("bad"))
                .when(between(score.clone(), CONDITION_REGULAR.0, CONDITION_REGULAR.1))
                .then(lit("regular"))
                .when(score.eq(lit(CONDITION_GOOD)))
                .then(lit("good"))
                .otherwise(lit(NOT_AVAILABLE))
                .alias("condition_type"),
        )
    }

    /// Requires `date` to be parsed already.
    pub fn bucket_season(lf: LazyFrame) -> LazyFrame {
        let month = col("date").dt().month().cast(DataType::Int64);
        lf.with_column(
            when(
                month
                    .clone()
                    .eq(lit(WINTER_START as i64))
                    .or(between(month.clone(), 1, WINTER_END as i64)),
            )
            .then(lit("winter"))
            .when(between(month.clone(), SPRING.0 as i64, SPRING.1 as i64))
            .then(lit("spring"))
            .when(between(month.clone(), SUMMER.0 as i64, SUMMER.1 as i64))
            .then(lit("summer"))
            .when(between(month, FALL.0 as i64, FALL.1 as i64))
            .then(lit("fall"))
            .otherwise(lit(NOT_AVAILABLE))
            .alias("season"),
        )
    }

    pub fn project_canonical(lf: LazyFrame) -> LazyFrame {
        lf.select(CANONICAL_COLUMNS.iter().map(|c| col(*c)).collect::<Vec<_>>())
    }
}
