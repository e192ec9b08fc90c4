//! CSV Data Loader Module
//! Reads the house-sales CSV into a Polars DataFrame.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Input columns every dataset must provide. Extra columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 16] = [
    "id",
    "date",
    "price",
    "bedrooms",
    "bathrooms",
    "sqft_living",
    "sqft_lot",
    "floors",
    "waterfront",
    "condition",
    "sqft_basement",
    "yr_built",
    "yr_renovated",
    "zipcode",
    "lat",
    "long",
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Dataset not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Dataset is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Column '{column}' must be numeric, found {dtype}")]
    InvalidColumnType { column: String, dtype: String },
    #[error("Dataset has empty values in columns: {}", .0.join(", "))]
    MissingValues(Vec<String>),
}

/// Loads the raw sales table.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file using Polars.
    pub fn load_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        if !path.is_file() {
            return Err(LoaderError::NotFound(path.to_path_buf()));
        }

        debug!("Reading {}", path.display());
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .finish()?
            .collect()?;

        Self::check_columns(&df)?;
        Self::check_values(&df)?;

        info!(
            "Loaded {} rows, {} columns from {}",
            df.height(),
            df.width(),
            path.display()
        );
        Ok(df)
    }

    /// Verify every required input column is present.
    pub fn check_columns(df: &DataFrame) -> Result<(), LoaderError> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|required| !names.iter().any(|n| n == *required))
            .map(|s| s.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(LoaderError::MissingColumns(missing))
        }
    }

    /// Reject text in numeric columns and rows with empty required fields.
    /// Assumes `check_columns` passed.
    pub fn check_values(df: &DataFrame) -> Result<(), LoaderError> {
        for name in REQUIRED_COLUMNS.iter().filter(|n| **n != "date") {
            let dtype = df.column(name)?.dtype();
            if !(dtype.is_integer() || dtype.is_float()) {
                return Err(LoaderError::InvalidColumnType {
                    column: name.to_string(),
                    dtype: dtype.to_string(),
                });
            }
        }

        let with_nulls: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| {
                df.column(name)
                    .map(|c| c.null_count() > 0)
                    .unwrap_or(false)
            })
            .map(|s| s.to_string())
            .collect();

        if with_nulls.is_empty() {
            Ok(())
        } else {
            debug!("Empty values in {:?}", with_nulls);
            Err(LoaderError::MissingValues(with_nulls))
        }
    }
}
