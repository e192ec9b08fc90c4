//! Business hypothesis pass.
//!
//! Every hypothesis partitions the canonical table, reduces each partition to
//! a statistic (10% trimmed mean by default, or a count share) and describes
//! a chart of the same partitions. Nothing here formats text; see
//! [`crate::report::format`].

use crate::charts::{Category, Chart, CrossTab, Orientation, Series};
use crate::config::AnalysisSettings;
use crate::data::{NO, YES};
use crate::report::ReportError;
use crate::stats::{GroupStats, StatsCalculator};
use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info};

const BUILT_CUTOFF: i64 = 1955;
const RENOVATION_CUTOFF: i64 = 2012;
const LARGE_LIVING_M2: f64 = 50.0;
const YOY_YEARS: (i64, i64) = (2014, 2015);
const MOM_YEAR: i32 = 2015;
const MOM_MONTHS: (i64, i64) = (1, 2);
const MOM_BATHROOMS: i64 = 3;
const YOY_WINDOW: (f64, f64) = (2000.0, 2020.0);

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// The twelve analyses, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hypothesis {
    Waterfront,
    BuiltBefore1955,
    BasementLotSize,
    YearOverYear,
    MonthOverMonth,
    BasementPrice,
    ConditionBefore2005,
    WinterSales,
    WaterfrontBasement,
    RecentRenovation,
    MultipleFloors,
    LargeLivingArea,
}

/// Outcome of a hypothesis, before any wording.
#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    /// Signed percentage change of the first partition over the second.
    /// `None` when either partition is empty.
    Comparison {
        change: Option<f64>,
        p_value: Option<f64>,
    },
    /// Period-over-period growth in percent.
    Growth { change: Option<f64> },
    /// Share of a population, in percent.
    Share { percent: f64 },
}

impl Finding {
    fn comparison(a: &[f64], b: &[f64], trim: f64) -> Self {
        let change = match (
            StatsCalculator::trimmed_mean(a, trim),
            StatsCalculator::trimmed_mean(b, trim),
        ) {
            (Some(ma), Some(mb)) => Some(StatsCalculator::percentage_change(ma, mb)),
            _ => None,
        };
        Finding::Comparison {
            change,
            p_value: StatsCalculator::welch_ttest(a, b),
        }
    }

    /// Change of the earlier period relative to the later one.
    fn growth(earlier: &[f64], later: &[f64], trim: f64) -> Self {
        let change = match (
            StatsCalculator::trimmed_mean(earlier, trim),
            StatsCalculator::trimmed_mean(later, trim),
        ) {
            (Some(me), Some(ml)) => Some(StatsCalculator::percentage_change(me, ml)),
            _ => None,
        };
        Finding::Growth { change }
    }
}

/// Computed result of one hypothesis.
#[derive(Debug, Clone, PartialEq)]
pub struct Insight {
    pub hypothesis: Hypothesis,
    pub finding: Finding,
    pub groups: Vec<GroupStats>,
    pub chart: Chart,
}

impl Hypothesis {
    pub const ALL: [Hypothesis; 12] = [
        Hypothesis::Waterfront,
        Hypothesis::BuiltBefore1955,
        Hypothesis::BasementLotSize,
        Hypothesis::YearOverYear,
        Hypothesis::MonthOverMonth,
        Hypothesis::BasementPrice,
        Hypothesis::ConditionBefore2005,
        Hypothesis::WinterSales,
        Hypothesis::WaterfrontBasement,
        Hypothesis::RecentRenovation,
        Hypothesis::MultipleFloors,
        Hypothesis::LargeLivingArea,
    ];

    /// 1-based position in the report.
    pub fn number(&self) -> usize {
        Self::ALL.iter().position(|h| h == self).map_or(0, |i| i + 1)
    }

    /// The claim under test.
    pub fn claim(&self) -> &'static str {
        match self {
            Hypothesis::Waterfront => "Waterfront houses are 30% more expensive on average",
            Hypothesis::BuiltBefore1955 => {
                "Houses built before 1955 are 50% cheaper on average"
            }
            Hypothesis::BasementLotSize => {
                "Houses without a basement have 50% larger lots than houses with one"
            }
            Hypothesis::YearOverYear => "House prices grow 10% year over year",
            Hypothesis::MonthOverMonth => {
                "Houses with 3 bathrooms grow 15% month over month"
            }
            Hypothesis::BasementPrice => "Houses with a basement are 20% more expensive on average",
            Hypothesis::ConditionBefore2005 => {
                "More than 80% of houses built before 2005 are not in good condition"
            }
            Hypothesis::WinterSales => "Houses sold in winter are 10% cheaper on average",
            Hypothesis::WaterfrontBasement => "70% of waterfront houses have no basement",
            Hypothesis::RecentRenovation => {
                "Houses renovated after 2012 are 10% more expensive on average"
            }
            Hypothesis::MultipleFloors => {
                "Houses with 2 or more floors are 20% more expensive on average"
            }
            Hypothesis::LargeLivingArea => {
                "80% of houses with more than 50 m2 of living area are priced above their region's mean"
            }
        }
    }

    /// File-name friendly identifier.
    pub fn slug(&self) -> &'static str {
        match self {
            Hypothesis::Waterfront => "waterfront",
            Hypothesis::BuiltBefore1955 => "built_before_1955",
            Hypothesis::BasementLotSize => "basement_lot_size",
            Hypothesis::YearOverYear => "year_over_year",
            Hypothesis::MonthOverMonth => "month_over_month",
            Hypothesis::BasementPrice => "basement_price",
            Hypothesis::ConditionBefore2005 => "condition_before_2005",
            Hypothesis::WinterSales => "winter_sales",
            Hypothesis::WaterfrontBasement => "waterfront_basement",
            Hypothesis::RecentRenovation => "recent_renovation",
            Hypothesis::MultipleFloors => "multiple_floors",
            Hypothesis::LargeLivingArea => "large_living_area",
        }
    }

    /// Compute this hypothesis over the canonical table.
    pub fn evaluate(
        &self,
        df: &DataFrame,
        settings: &AnalysisSettings,
    ) -> Result<Insight, ReportError> {
        let trim = settings.trim_proportion;
        let insight = match self {
            Hypothesis::Waterfront => waterfront(df, trim)?,
            Hypothesis::BuiltBefore1955 => built_before_1955(df, trim)?,
            Hypothesis::BasementLotSize => basement_lot_size(df, trim)?,
            Hypothesis::YearOverYear => year_over_year(df, trim)?,
            Hypothesis::MonthOverMonth => month_over_month(df, trim)?,
            Hypothesis::BasementPrice => basement_price(df, trim)?,
            Hypothesis::ConditionBefore2005 => condition_before_2005(df)?,
            Hypothesis::WinterSales => winter_sales(df, trim)?,
            Hypothesis::WaterfrontBasement => waterfront_basement(df)?,
            Hypothesis::RecentRenovation => recent_renovation(df, trim)?,
            Hypothesis::MultipleFloors => multiple_floors(df, trim)?,
            Hypothesis::LargeLivingArea => large_living_area(df)?,
        };
        debug!("Evaluated hypothesis {}: {:?}", self.number(), insight.finding);
        Ok(insight)
    }
}

/// Evaluate all twelve hypotheses in parallel; results keep presentation order.
pub fn report_hypotheses(
    df: &DataFrame,
    settings: &AnalysisSettings,
) -> Result<Vec<Insight>, ReportError> {
    let insights: Vec<Insight> = Hypothesis::ALL
        .par_iter()
        .map(|h| h.evaluate(df, settings))
        .collect::<Result<_, _>>()?;

    info!("Evaluated {} hypotheses", insights.len());
    Ok(insights)
}

// ----- shared helpers -----

fn stats(name: &str, values: &[f64], trim: f64) -> GroupStats {
    StatsCalculator::descriptive_stats(name, values, trim)
}

fn plain_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Two-partition comparison of a value column, charted as mean bars.
struct Split<'a> {
    value: &'a str,
    first: (&'a str, Expr),
    second: (&'a str, Expr),
}

impl Split<'_> {
    fn values(&self, df: &DataFrame) -> PolarsResult<(Vec<f64>, Vec<f64>)> {
        Ok((
            StatsCalculator::values_where(df, self.value, self.first.1.clone())?,
            StatsCalculator::values_where(df, self.value, self.second.1.clone())?,
        ))
    }

    fn bar_insight(
        &self,
        df: &DataFrame,
        hypothesis: Hypothesis,
        trim: f64,
        orientation: Orientation,
        axis_labels: (&str, &str),
    ) -> PolarsResult<Insight> {
        let (a, b) = self.values(df)?;
        Ok(Insight {
            hypothesis,
            finding: Finding::comparison(&a, &b, trim),
            groups: vec![stats(self.first.0, &a, trim), stats(self.second.0, &b, trim)],
            chart: Chart::Bars {
                x_label: axis_labels.0.to_string(),
                y_label: axis_labels.1.to_string(),
                orientation,
                bars: vec![
                    Category::new(self.first.0, plain_mean(&a)),
                    Category::new(self.second.0, plain_mean(&b)),
                ],
            },
        })
    }
}

// ----- the twelve analyses -----

fn waterfront(df: &DataFrame, trim: f64) -> PolarsResult<Insight> {
    let yes = StatsCalculator::values_where(df, "price", col("waterfront").eq(lit(YES)))?;
    let no = StatsCalculator::values_where(df, "price", col("waterfront").eq(lit(NO)))?;

    Ok(Insight {
        hypothesis: Hypothesis::Waterfront,
        finding: Finding::comparison(&yes, &no, trim),
        groups: vec![stats("waterfront", &yes, trim), stats("no waterfront", &no, trim)],
        chart: Chart::Violin {
            x_label: "waterfront view".to_string(),
            y_label: "price".to_string(),
            series: vec![
                Series {
                    label: "yes".to_string(),
                    values: yes,
                },
                Series {
                    label: "no".to_string(),
                    values: no,
                },
            ],
        },
    })
}

fn built_before_1955(df: &DataFrame, trim: f64) -> PolarsResult<Insight> {
    Split {
        value: "price",
        first: ("built before 1955", col("yr_built").lt(lit(BUILT_CUTOFF))),
        second: ("built from 1955", col("yr_built").gt_eq(lit(BUILT_CUTOFF))),
    }
    .bar_insight(
        df,
        Hypothesis::BuiltBefore1955,
        trim,
        Orientation::Vertical,
        ("construction year", "price"),
    )
}

fn basement_lot_size(df: &DataFrame, trim: f64) -> PolarsResult<Insight> {
    Split {
        value: "m2_lot",
        first: ("without basement", col("m2_basement").eq(lit(0.0))),
        second: ("with basement", col("m2_basement").gt(lit(0.0))),
    }
    .bar_insight(
        df,
        Hypothesis::BasementLotSize,
        trim,
        Orientation::Horizontal,
        ("lot size (m2)", ""),
    )
}

fn year_over_year(df: &DataFrame, trim: f64) -> PolarsResult<Insight> {
    let earlier = StatsCalculator::values_where(df, "price", col("yr_built").eq(lit(YOY_YEARS.0)))?;
    let later = StatsCalculator::values_where(df, "price", col("yr_built").eq(lit(YOY_YEARS.1)))?;
    let points = StatsCalculator::mean_by(df, "yr_built", "price", lit(true))?;

    Ok(Insight {
        hypothesis: Hypothesis::YearOverYear,
        finding: Finding::growth(&earlier, &later, trim),
        groups: vec![
            stats(&YOY_YEARS.0.to_string(), &earlier, trim),
            stats(&YOY_YEARS.1.to_string(), &later, trim),
        ],
        chart: Chart::Line {
            x_label: "construction year".to_string(),
            y_label: "price".to_string(),
            points,
            x_window: Some(YOY_WINDOW),
            tick_labels: Vec::new(),
        },
    })
}

fn month_over_month(df: &DataFrame, trim: f64) -> PolarsResult<Insight> {
    let sale_year = col("date").dt().year().eq(lit(MOM_YEAR));
    let three_baths = col("bathrooms").eq(lit(MOM_BATHROOMS));
    let in_month = |m: i64| {
        three_baths
            .clone()
            .and(sale_year.clone())
            .and(col("date").dt().month().cast(DataType::Int64).eq(lit(m)))
    };

    let january = StatsCalculator::values_where(df, "price", in_month(MOM_MONTHS.0))?;
    let february = StatsCalculator::values_where(df, "price", in_month(MOM_MONTHS.1))?;

    let monthly = df
        .clone()
        .lazy()
        .with_column(col("date").dt().month().cast(DataType::Int64).alias("month"))
        .collect()?;
    let points = StatsCalculator::mean_by(&monthly, "month", "price", three_baths.and(sale_year))?;
    let tick_labels = points
        .iter()
        .filter_map(|(m, _)| {
            let idx = (*m as usize).checked_sub(1)?;
            MONTH_NAMES.get(idx).map(|name| (*m, name.to_string()))
        })
        .collect();

    Ok(Insight {
        hypothesis: Hypothesis::MonthOverMonth,
        finding: Finding::growth(&january, &february, trim),
        groups: vec![
            stats("January 2015", &january, trim),
            stats("February 2015", &february, trim),
        ],
        chart: Chart::Line {
            x_label: "month".to_string(),
            y_label: "price".to_string(),
            points,
            x_window: None,
            tick_labels,
        },
    })
}

fn basement_price(df: &DataFrame, trim: f64) -> PolarsResult<Insight> {
    Split {
        value: "price",
        first: ("with basement", col("m2_basement").gt(lit(0.0))),
        second: ("without basement", col("m2_basement").eq(lit(0.0))),
    }
    .bar_insight(
        df,
        Hypothesis::BasementPrice,
        trim,
        Orientation::Horizontal,
        ("price", ""),
    )
}

/// Counted over every house regardless of construction year.
fn condition_before_2005(df: &DataFrame) -> PolarsResult<Insight> {
    let count =
        |bucket: &str| StatsCalculator::count_where(df, col("condition_type").eq(lit(bucket)));

    let bad = count("bad")?;
    let regular = count("regular")?;
    let good = count("good")?;
    let total = StatsCalculator::count_where(df, col("condition_type").is_not_null())?;

    Ok(Insight {
        hypothesis: Hypothesis::ConditionBefore2005,
        finding: Finding::Share {
            percent: StatsCalculator::share(total - good, total),
        },
        groups: Vec::new(),
        chart: Chart::Pie {
            slices: vec![
                Category::new("bad", bad as f64),
                Category::new("good", good as f64),
                Category::new("regular", regular as f64),
            ],
        },
    })
}

fn winter_sales(df: &DataFrame, trim: f64) -> PolarsResult<Insight> {
    let season_prices = |name: &str| {
        StatsCalculator::values_where(df, "price", col("season").eq(lit(name)))
    };

    let winter = season_prices("winter")?;
    let not_winter =
        StatsCalculator::values_where(df, "price", col("season").neq(lit("winter")))?;

    let mut groups = Vec::new();
    let mut bars = Vec::new();
    for name in ["winter", "spring", "summer", "fall"] {
        let values = season_prices(name)?;
        let group = stats(name, &values, trim);
        let trimmed = if group.trimmed_mean.is_nan() {
            0.0
        } else {
            group.trimmed_mean
        };
        bars.push(Category::new(name, trimmed));
        groups.push(group);
    }

    Ok(Insight {
        hypothesis: Hypothesis::WinterSales,
        finding: Finding::comparison(&winter, &not_winter, trim),
        groups,
        chart: Chart::Bars {
            x_label: "trimmed mean price".to_string(),
            y_label: "season".to_string(),
            orientation: Orientation::Horizontal,
            bars,
        },
    })
}

fn waterfront_basement(df: &DataFrame) -> PolarsResult<Insight> {
    let waterfront = col("waterfront").eq(lit(YES));
    let no_waterfront = col("waterfront").neq(lit(YES));
    let basement = col("has_basement").eq(lit(YES));
    let no_basement = col("has_basement").neq(lit(YES));

    let count = |a: &Expr, b: &Expr| StatsCalculator::count_where(df, a.clone().and(b.clone()));

    let counts = vec![
        vec![count(&waterfront, &basement)?, count(&waterfront, &no_basement)?],
        vec![count(&no_waterfront, &basement)?, count(&no_waterfront, &no_basement)?],
    ];

    let waterfront_total = counts[0][0] + counts[0][1];
    let waterfront_without_basement = counts[0][1];

    Ok(Insight {
        hypothesis: Hypothesis::WaterfrontBasement,
        finding: Finding::Share {
            percent: StatsCalculator::share(waterfront_without_basement, waterfront_total),
        },
        groups: Vec::new(),
        chart: Chart::CrossTab(CrossTab {
            row_labels: vec!["waterfront".to_string(), "no waterfront".to_string()],
            column_labels: vec!["with basement".to_string(), "without basement".to_string()],
            counts,
        }),
    })
}

fn recent_renovation(df: &DataFrame, trim: f64) -> PolarsResult<Insight> {
    Split {
        value: "price",
        first: (
            "renovated after 2012",
            col("yr_renovated").gt(lit(RENOVATION_CUTOFF)),
        ),
        second: (
            "renovated up to 2012",
            col("yr_renovated").lt_eq(lit(RENOVATION_CUTOFF)),
        ),
    }
    .bar_insight(
        df,
        Hypothesis::RecentRenovation,
        trim,
        Orientation::Vertical,
        ("renovation year", "price"),
    )
}

fn multiple_floors(df: &DataFrame, trim: f64) -> PolarsResult<Insight> {
    Split {
        value: "price",
        first: ("two or more floors", col("floors").gt_eq(lit(2))),
        second: ("one floor", col("floors").eq(lit(1))),
    }
    .bar_insight(
        df,
        Hypothesis::MultipleFloors,
        trim,
        Orientation::Horizontal,
        ("price", "number of floors"),
    )
}

fn large_living_area(df: &DataFrame) -> PolarsResult<Insight> {
    let large = col("m2_living").gt(lit(LARGE_LIVING_M2));
    let total = StatsCalculator::count_where(df, large.clone())?;
    let above = StatsCalculator::count_where(
        df,
        large
            .clone()
            .and(col("price").gt(col("price_mean_by_zipcode"))),
    )?;
    let below = StatsCalculator::count_where(
        df,
        large.and(col("price").lt_eq(col("price_mean_by_zipcode"))),
    )?;

    Ok(Insight {
        hypothesis: Hypothesis::LargeLivingArea,
        finding: Finding::Share {
            percent: StatsCalculator::share(above, total),
        },
        groups: Vec::new(),
        chart: Chart::Pie {
            slices: vec![
                Category::new("above region mean", above as f64),
                Category::new("at or below region mean", below as f64),
            ],
        },
    })
}
