//! Configuration Module
//! Dataset location, analysis settings and currency formatting.
//!
//! Currency rendering is driven by an explicit [`CurrencyFormat`] handed to the
//! report layer instead of a process-wide locale.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory at startup.
pub const CONFIG_FILE_NAME: &str = "house_insights.json";

/// Dataset read when no configuration overrides it.
pub const DEFAULT_DATASET_PATH: &str = "datasets/kc_house_data.csv";

pub const DEFAULT_LOCALE: &str = "pt_BR";

/// Fraction cut from each tail before averaging prices.
pub const DEFAULT_TRIM_PROPORTION: f64 = 0.1;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unsupported locale '{0}' (expected one of: pt_BR, en_US)")]
    UnsupportedLocale(String),
    #[error("Trim proportion must be in [0, 0.5), got {0}")]
    InvalidTrimProportion(f64),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    pub dataset_path: PathBuf,
    pub locale: String,
    pub trim_proportion: f64,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            locale: DEFAULT_LOCALE.to_string(),
            trim_proportion: DEFAULT_TRIM_PROPORTION,
        }
    }
}

impl InsightsConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: InsightsConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `house_insights.json` from `dir` if it exists, defaults otherwise.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::from_file(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Locale is not checked here; callers resolve it through
    /// [`InsightsConfig::currency`] and may fall back to the default format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..0.5).contains(&self.trim_proportion) {
            return Err(ConfigError::InvalidTrimProportion(self.trim_proportion));
        }
        Ok(())
    }

    /// Currency format for the configured locale.
    pub fn currency(&self) -> Result<CurrencyFormat, ConfigError> {
        CurrencyFormat::for_locale(&self.locale)
    }

    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            trim_proportion: self.trim_proportion,
        }
    }
}

/// Knobs read by the hypothesis pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisSettings {
    pub trim_proportion: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            trim_proportion: DEFAULT_TRIM_PROPORTION,
        }
    }
}

/// Locale-specific money formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub symbol_first: bool,
    pub separated_by_space: bool,
    pub thousands_separator: char,
    pub decimal_separator: char,
    pub decimals: usize,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::pt_br()
    }
}

impl CurrencyFormat {
    /// Locales with a built-in format.
    pub const SUPPORTED_LOCALES: [&'static str; 2] = ["pt_BR", "en_US"];

    pub fn pt_br() -> Self {
        Self {
            symbol: "R$".to_string(),
            symbol_first: true,
            separated_by_space: true,
            thousands_separator: '.',
            decimal_separator: ',',
            decimals: 2,
        }
    }

    pub fn en_us() -> Self {
        Self {
            symbol: "$".to_string(),
            symbol_first: true,
            separated_by_space: false,
            thousands_separator: ',',
            decimal_separator: '.',
            decimals: 2,
        }
    }

    /// Resolve a locale tag such as `pt_BR` or `en-US.UTF-8`.
    pub fn for_locale(tag: &str) -> Result<Self, ConfigError> {
        let base = tag.split('.').next().unwrap_or(tag).replace('-', "_");
        match base.to_ascii_lowercase().as_str() {
            "pt_br" => Ok(Self::pt_br()),
            "en_us" | "c" | "posix" => Ok(Self::en_us()),
            _ => Err(ConfigError::UnsupportedLocale(tag.to_string())),
        }
    }

    /// Format an amount with grouping, e.g. `R$ 1.234.567,89`.
    pub fn format(&self, amount: f64) -> String {
        if !amount.is_finite() {
            return format!("{} {}", self.symbol, amount);
        }

        let fixed = format!("{:.*}", self.decimals, amount.abs());
        let (int_part, frac_part) = match fixed.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (fixed.as_str(), None),
        };

        let mut number = group_digits(int_part, self.thousands_separator);
        if let Some(frac) = frac_part {
            number.push(self.decimal_separator);
            number.push_str(frac);
        }

        let space = if self.separated_by_space { " " } else { "" };
        let body = if self.symbol_first {
            format!("{}{}{}", self.symbol, space, number)
        } else {
            format!("{}{}{}", number, space, self.symbol)
        };

        // Rounding can turn a tiny negative amount into zero
        let is_negative = amount < 0.0 && number.chars().any(|c| c.is_ascii_digit() && c != '0');
        if is_negative {
            format!("-{}", body)
        } else {
            body
        }
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pt_br_currency_grouping() {
        let fmt = CurrencyFormat::pt_br();
        assert_eq!(fmt.format(1234567.891), "R$ 1.234.567,89");
        assert_eq!(fmt.format(0.0), "R$ 0,00");
        assert_eq!(fmt.format(999.5), "R$ 999,50");
    }

    #[test]
    fn test_en_us_currency_and_negative() {
        let fmt = CurrencyFormat::en_us();
        assert_eq!(fmt.format(1000.0), "$1,000.00");
        assert_eq!(fmt.format(-2500.25), "-$2,500.25");
        assert_eq!(fmt.format(-0.001), "$0.00");
    }

    #[test]
    fn test_locale_resolution() {
        assert_eq!(CurrencyFormat::for_locale("pt_BR.UTF-8").unwrap(), CurrencyFormat::pt_br());
        assert_eq!(CurrencyFormat::for_locale("en-US").unwrap(), CurrencyFormat::en_us());
        assert!(matches!(
            CurrencyFormat::for_locale("xx_YY"),
            Err(ConfigError::UnsupportedLocale(_))
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: InsightsConfig = serde_json::from_str(r#"{"locale": "en_US"}"#).unwrap();
        assert_eq!(config.locale, "en_US");
        assert_eq!(config.dataset_path, PathBuf::from(DEFAULT_DATASET_PATH));
        assert_eq!(config.trim_proportion, DEFAULT_TRIM_PROPORTION);
    }

    #[test]
    fn test_invalid_trim_rejected() {
        let config = InsightsConfig {
            trim_proportion: 0.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTrimProportion(_))
        ));
    }

    #[test]
    fn test_discover_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{"dataset_path": "other.csv", "trim_proportion": 0.2}"#,
        )
        .unwrap();

        let config = InsightsConfig::discover(dir.path()).unwrap();
        assert_eq!(config.dataset_path, PathBuf::from("other.csv"));
        assert_eq!(config.trim_proportion, 0.2);
        assert_eq!(config.locale, DEFAULT_LOCALE);
    }

    #[test]
    fn test_unsupported_locale_keeps_other_settings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{"dataset_path": "other.csv", "locale": "fr_FR"}"#,
        )
        .unwrap();

        let config = InsightsConfig::discover(dir.path()).unwrap();
        assert_eq!(config.dataset_path, PathBuf::from("other.csv"));
        assert!(matches!(
            config.currency(),
            Err(ConfigError::UnsupportedLocale(_))
        ));
    }

    #[test]
    fn test_discover_without_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(InsightsConfig::discover(dir.path()).unwrap(), InsightsConfig::default());
    }
}
