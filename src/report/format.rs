//! Text rendering of computed report values.

use crate::config::CurrencyFormat;
use crate::report::hypotheses::{Finding, Hypothesis, Insight};
use crate::stats::StatsCalculator;

/// Wording for a two-partition comparison.
struct Wording {
    subject: &'static str,
    more: &'static str,
    less: &'static str,
}

const MORE_EXPENSIVE: &str = "more expensive";
const CHEAPER: &str = "cheaper";

fn comparison_wording(hypothesis: Hypothesis) -> Wording {
    let (subject, more, less) = match hypothesis {
        Hypothesis::Waterfront => ("with a waterfront view", MORE_EXPENSIVE, CHEAPER),
        Hypothesis::BuiltBefore1955 => ("built before 1955", MORE_EXPENSIVE, CHEAPER),
        Hypothesis::BasementLotSize => ("without a basement", "larger", "smaller"),
        Hypothesis::BasementPrice => ("with a basement", MORE_EXPENSIVE, CHEAPER),
        Hypothesis::WinterSales => ("sold during winter", MORE_EXPENSIVE, CHEAPER),
        Hypothesis::RecentRenovation => ("renovated after 2012", MORE_EXPENSIVE, CHEAPER),
        Hypothesis::MultipleFloors => ("with two or more floors", MORE_EXPENSIVE, CHEAPER),
        _ => ("in this group", "higher", "lower"),
    };
    Wording {
        subject,
        more,
        less,
    }
}

fn growth_wording(hypothesis: Hypothesis) -> &'static str {
    match hypothesis {
        Hypothesis::YearOverYear => "Year-over-year price growth from 2014 to 2015 was",
        Hypothesis::MonthOverMonth => {
            "Month-over-month price growth of 3-bathroom houses from January to February 2015 was"
        }
        _ => "Growth was",
    }
}

fn share_wording(hypothesis: Hypothesis) -> &'static str {
    match hypothesis {
        Hypothesis::ConditionBefore2005 => "of houses built before 2005 are not in good condition",
        Hypothesis::WaterfrontBasement => "of waterfront houses have no basement",
        Hypothesis::LargeLivingArea => {
            "of houses with more than 50 m2 of living area are priced above their region's mean"
        }
        _ => "of houses match",
    }
}

/// "Houses {subject} are {x}% {more|less} on average", using the absolute
/// value and the `less` label for negative changes.
pub fn describe_change(subject: &str, more: &str, less: &str, change: f64) -> String {
    let (value, label) = if change >= 0.0 {
        (change, more)
    } else {
        (-change, less)
    };
    format!("Houses {} are {:.2}% {} on average", subject, value, label)
}

/// One-line natural-language result of an insight.
pub fn statement(insight: &Insight) -> String {
    match &insight.finding {
        Finding::Comparison { change, .. } => {
            let wording = comparison_wording(insight.hypothesis);
            match change {
                Some(change) => describe_change(wording.subject, wording.more, wording.less, *change),
                None => format!(
                    "Houses {}: not enough data to compare",
                    wording.subject
                ),
            }
        }
        Finding::Growth { change } => match change {
            Some(change) => format!("{} {:.2}%", growth_wording(insight.hypothesis), change),
            None => format!("{} not measurable (no sales in one period)", growth_wording(insight.hypothesis)),
        },
        Finding::Share { percent } => {
            format!("{:.2}% {}", percent, share_wording(insight.hypothesis))
        }
    }
}

/// Significance note for comparisons that carry a p-value.
pub fn significance_note(insight: &Insight) -> Option<String> {
    match insight.finding {
        Finding::Comparison {
            p_value: Some(p), ..
        } => {
            let verdict = if StatsCalculator::is_significant(p) {
                "significant"
            } else {
                "not significant"
            };
            Some(format!("Welch t-test p = {:.4} ({} at 5%)", p, verdict))
        }
        _ => None,
    }
}

/// Title line, e.g. "Hypothesis 1 - Waterfront houses are 30% ...".
pub fn title(hypothesis: Hypothesis) -> String {
    format!("Hypothesis {} - {}", hypothesis.number(), hypothesis.claim())
}

pub fn profit_headline(total_profit: f64, currency: &CurrencyFormat) -> String {
    format!("Estimated profit of {}", currency.format(total_profit))
}

/// Statistic cell: "-" for NaN, three decimals otherwise.
pub fn stat_cell(value: f64) -> String {
    if value.is_nan() {
        "-".to_string()
    } else {
        format!("{:.3}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::Chart;
    use pretty_assertions::assert_eq;

    fn insight(hypothesis: Hypothesis, finding: Finding) -> Insight {
        Insight {
            hypothesis,
            finding,
            groups: Vec::new(),
            chart: Chart::Pie { slices: Vec::new() },
        }
    }

    #[test]
    fn test_describe_change_sign() {
        assert_eq!(
            describe_change("with a basement", "more expensive", "cheaper", 12.346),
            "Houses with a basement are 12.35% more expensive on average"
        );
        assert_eq!(
            describe_change("with a basement", "more expensive", "cheaper", -8.0),
            "Houses with a basement are 8.00% cheaper on average"
        );
    }

    #[test]
    fn test_comparison_statement() {
        let i = insight(
            Hypothesis::BasementLotSize,
            Finding::Comparison {
                change: Some(-3.5),
                p_value: None,
            },
        );
        assert_eq!(
            statement(&i),
            "Houses without a basement are 3.50% smaller on average"
        );
        assert_eq!(significance_note(&i), None);
    }

    #[test]
    fn test_missing_data_statement() {
        let i = insight(
            Hypothesis::Waterfront,
            Finding::Comparison {
                change: None,
                p_value: None,
            },
        );
        assert!(statement(&i).contains("not enough data"));
    }

    #[test]
    fn test_share_and_growth_statements() {
        let share = insight(Hypothesis::WaterfrontBasement, Finding::Share { percent: 62.5 });
        assert_eq!(statement(&share), "62.50% of waterfront houses have no basement");

        let growth = insight(Hypothesis::YearOverYear, Finding::Growth { change: Some(-1.0) });
        assert_eq!(
            statement(&growth),
            "Year-over-year price growth from 2014 to 2015 was -1.00%"
        );
    }

    #[test]
    fn test_significance_note() {
        let i = insight(
            Hypothesis::Waterfront,
            Finding::Comparison {
                change: Some(10.0),
                p_value: Some(0.001),
            },
        );
        assert_eq!(
            significance_note(&i).unwrap(),
            "Welch t-test p = 0.0010 (significant at 5%)"
        );
    }

    #[test]
    fn test_headline_uses_currency_format() {
        assert_eq!(
            profit_headline(1234567.891, &CurrencyFormat::pt_br()),
            "Estimated profit of R$ 1.234.567,89"
        );
        assert_eq!(
            profit_headline(1234567.891, &CurrencyFormat::en_us()),
            "Estimated profit of $1,234,567.89"
        );
    }

    #[test]
    fn test_title_numbering() {
        assert!(title(Hypothesis::Waterfront).starts_with("Hypothesis 1 - "));
        assert!(title(Hypothesis::LargeLivingArea).starts_with("Hypothesis 12 - "));
    }
}
