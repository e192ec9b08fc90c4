//! Statistics Calculator Module
//! Trimmed means, percentage deltas, descriptive stats and Welch t-tests.

use polars::prelude::*;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Significance threshold for t-test
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Statistics for a single partition of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub group_name: String,
    pub count: usize,
    pub mean: f64,
    pub trimmed_mean: f64,
    pub median: f64,
    pub std: f64,
    pub p95: f64,
    pub p05: f64,
}

impl Default for GroupStats {
    fn default() -> Self {
        Self {
            group_name: String::new(),
            count: 0,
            mean: f64::NAN,
            trimmed_mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            p95: f64::NAN,
            p05: f64::NAN,
        }
    }
}

/// One bin of a density outline: bin centre and normalized height (max = 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityPoint {
    pub value: f64,
    pub density: f64,
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Mean after discarding `floor(proportion * n)` values from each end of
    /// the sorted sample.
    pub fn trimmed_mean(values: &[f64], proportion: f64) -> Option<f64> {
        let n = values.len();
        let cut = (proportion * n as f64).floor() as usize;
        if n == 0 || 2 * cut >= n {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let kept = &sorted[cut..n - cut];
        Some(kept.iter().sum::<f64>() / kept.len() as f64)
    }

    /// Signed change of `a` relative to `b`, in percent. Defined as 100 when
    /// `b` is zero.
    pub fn percentage_change(a: f64, b: f64) -> f64 {
        if b == 0.0 {
            return 100.0;
        }
        (a - b) / b * 100.0
    }

    /// `part` as a percentage of `whole`; 0 for an empty whole.
    pub fn share(part: usize, whole: usize) -> f64 {
        if whole == 0 {
            return 0.0;
        }
        part as f64 * 100.0 / whole as f64
    }

    /// Compute descriptive statistics for an array of values.
    pub fn descriptive_stats(name: &str, values: &[f64], trim: f64) -> GroupStats {
        let n = values.len();
        if n == 0 {
            return GroupStats {
                group_name: name.to_string(),
                ..Default::default()
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mean = values.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        let variance = if n > 1 {
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };

        GroupStats {
            group_name: name.to_string(),
            count: n,
            mean,
            trimmed_mean: Self::trimmed_mean(values, trim).unwrap_or(f64::NAN),
            median,
            std: variance.sqrt(),
            p95: Self::percentile(&sorted, 95.0),
            p05: Self::percentile(&sorted, 5.0),
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Two-tailed p-value of Welch's t-test (unequal variances).
    pub fn welch_ttest(a: &[f64], b: &[f64]) -> Option<f64> {
        let n1 = a.len() as f64;
        let n2 = b.len() as f64;

        if n1 < 2.0 || n2 < 2.0 {
            return None;
        }

        let mean1 = a.iter().sum::<f64>() / n1;
        let mean2 = b.iter().sum::<f64>() / n2;
        let var1 = a.iter().map(|x| (x - mean1).powi(2)).sum::<f64>() / (n1 - 1.0);
        let var2 = b.iter().map(|x| (x - mean2).powi(2)).sum::<f64>() / (n2 - 1.0);

        let se = (var1 / n1 + var2 / n2).sqrt();
        if se == 0.0 {
            return Some(1.0);
        }

        let t = (mean1 - mean2) / se;

        // Welch-Satterthwaite degrees of freedom
        let df_num = (var1 / n1 + var2 / n2).powi(2);
        let df_denom = (var1 / n1).powi(2) / (n1 - 1.0) + (var2 / n2).powi(2) / (n2 - 1.0);
        let df = df_num / df_denom;

        let dist = StudentsT::new(0.0, 1.0, df).ok()?;
        Some(2.0 * (1.0 - dist.cdf(t.abs())))
    }

    pub fn is_significant(p_value: f64) -> bool {
        p_value <= SIGNIFICANCE_THRESHOLD
    }

    /// Histogram density over `bins` equal-width bins, scaled so the tallest
    /// bin is 1. Used for violin outlines.
    pub fn density_profile(values: &[f64], bins: usize) -> Vec<DensityPoint> {
        if values.is_empty() || bins == 0 {
            return Vec::new();
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if min == max {
            return vec![DensityPoint {
                value: min,
                density: 1.0,
            }];
        }

        let width = (max - min) / bins as f64;
        let mut counts = vec![0usize; bins];
        for &v in values {
            let idx = (((v - min) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        // Light 3-bin smoothing keeps the outline from looking jagged
        let smoothed: Vec<f64> = (0..bins)
            .map(|i| {
                let lo = i.saturating_sub(1);
                let hi = (i + 1).min(bins - 1);
                let total: usize = counts[lo..=hi].iter().sum();
                total as f64 / (hi - lo + 1) as f64
            })
            .collect();
        let peak = smoothed.iter().copied().fold(0.0, f64::max);

        smoothed
            .iter()
            .enumerate()
            .map(|(i, &d)| DensityPoint {
                value: min + width * (i as f64 + 0.5),
                density: if peak > 0.0 { d / peak } else { 0.0 },
            })
            .collect()
    }

    /// Values of `column` (as f64) for the rows matching `predicate`.
    pub fn values_where(
        df: &DataFrame,
        column: &str,
        predicate: Expr,
    ) -> PolarsResult<Vec<f64>> {
        let filtered = df
            .clone()
            .lazy()
            .filter(predicate)
            .select([col(column).cast(DataType::Float64)])
            .collect()?;

        let values = filtered
            .column(column)?
            .f64()?
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .collect();
        Ok(values)
    }

    /// Number of rows matching `predicate`.
    pub fn count_where(df: &DataFrame, predicate: Expr) -> PolarsResult<usize> {
        Ok(df.clone().lazy().filter(predicate).collect()?.height())
    }

    /// Mean of `value` per distinct `key` over rows matching `predicate`,
    /// sorted by key.
    pub fn mean_by(
        df: &DataFrame,
        key: &str,
        value: &str,
        predicate: Expr,
    ) -> PolarsResult<Vec<(f64, f64)>> {
        let grouped = df
            .clone()
            .lazy()
            .filter(predicate)
            .group_by([col(key)])
            .agg([col(value).cast(DataType::Float64).mean().alias(value)])
            .sort([key], SortMultipleOptions::default())
            .collect()?;

        let keys = grouped.column(key)?.cast(&DataType::Float64)?;
        let means = grouped.column(value)?.cast(&DataType::Float64)?;

        let pairs = keys
            .f64()?
            .into_iter()
            .zip(means.f64()?.into_iter())
            .filter_map(|(k, m)| Some((k?, m?)))
            .collect();
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_change() {
        assert_eq!(StatsCalculator::percentage_change(150.0, 100.0), 50.0);
        assert_eq!(StatsCalculator::percentage_change(50.0, 100.0), -50.0);
        assert_eq!(StatsCalculator::percentage_change(42.0, 0.0), 100.0);
        assert_eq!(StatsCalculator::percentage_change(0.0, 0.0), 100.0);
        assert_eq!(StatsCalculator::percentage_change(-7.5, 0.0), 100.0);
    }

    #[test]
    fn test_trimmed_mean_discards_tails() {
        // 10 values, 10% trim drops 1 from each end
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 1000.0];
        let trimmed = StatsCalculator::trimmed_mean(&values, 0.1).unwrap();
        assert_eq!(trimmed, 5.5);

        // Fewer than 10 values: nothing is cut
        let small = [1.0, 2.0, 3.0, 100.0];
        assert_eq!(StatsCalculator::trimmed_mean(&small, 0.1).unwrap(), 26.5);
    }

    #[test]
    fn test_trimmed_mean_unsorted_input() {
        let values = [9.0, 1.0, 5.0, 3.0, 7.0, 2.0, 8.0, 4.0, 6.0, -500.0];
        assert_eq!(StatsCalculator::trimmed_mean(&values, 0.1).unwrap(), 5.0);
    }

    #[test]
    fn test_trimmed_mean_empty() {
        assert_eq!(StatsCalculator::trimmed_mean(&[], 0.1), None);
    }

    #[test]
    fn test_share_zero_whole() {
        assert_eq!(StatsCalculator::share(3, 0), 0.0);
        assert_eq!(StatsCalculator::share(7, 10), 70.0);
    }

    #[test]
    fn test_descriptive_stats() {
        let stats = StatsCalculator::descriptive_stats("g", &[4.0, 1.0, 3.0, 2.0], 0.1);
        assert_eq!(stats.group_name, "g");
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.median, 2.5);
        assert!((stats.p05 - 1.15).abs() < 1e-12);
        assert!((stats.p95 - 3.85).abs() < 1e-12);

        let empty = StatsCalculator::descriptive_stats("e", &[], 0.1);
        assert_eq!(empty.count, 0);
        assert!(empty.mean.is_nan());
    }

    #[test]
    fn test_welch_ttest() {
        let a = [10.0, 11.0, 12.0, 10.5, 11.5];
        let b = [20.0, 21.0, 22.0, 20.5, 21.5];
        let p = StatsCalculator::welch_ttest(&a, &b).unwrap();
        assert!(StatsCalculator::is_significant(p));

        let same = StatsCalculator::welch_ttest(&a, &a).unwrap();
        assert!(same > 0.99);

        assert_eq!(StatsCalculator::welch_ttest(&[1.0], &b), None);
    }

    #[test]
    fn test_density_profile_normalized() {
        let values = [1.0, 1.0, 1.0, 2.0, 5.0, 9.0, 10.0];
        let profile = StatsCalculator::density_profile(&values, 5);
        assert_eq!(profile.len(), 5);
        let peak = profile.iter().map(|p| p.density).fold(0.0, f64::max);
        assert_eq!(peak, 1.0);
        assert!(profile.windows(2).all(|w| w[0].value < w[1].value));

        assert!(StatsCalculator::density_profile(&[], 5).is_empty());
        assert_eq!(StatsCalculator::density_profile(&[3.0, 3.0], 5).len(), 1);
    }

    #[test]
    fn test_frame_helpers() {
        let df = df! {
            "key" => [1i64, 1, 2, 2, 3],
            "value" => [10.0f64, 20.0, 30.0, 50.0, 70.0]
        }
        .unwrap();

        let values = StatsCalculator::values_where(&df, "value", col("key").eq(lit(2))).unwrap();
        assert_eq!(values, vec![30.0, 50.0]);

        let count = StatsCalculator::count_where(&df, col("value").gt(lit(15.0))).unwrap();
        assert_eq!(count, 4);

        let means = StatsCalculator::mean_by(&df, "key", "value", col("key").lt(lit(3))).unwrap();
        assert_eq!(means, vec![(1.0, 15.0), (2.0, 40.0)]);
    }
}
