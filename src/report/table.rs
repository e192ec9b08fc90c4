//! Display-ready projection of a DataFrame.

use polars::prelude::*;

/// Column headers plus stringified cells, ready for a grid widget.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    /// Render every cell of `df`. Floats get two decimals, nulls are blank.
    pub fn from_frame(df: &DataFrame) -> Self {
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let rows = (0..df.height())
            .map(|i| {
                df.get_columns()
                    .iter()
                    .map(|column| {
                        column
                            .get(i)
                            .map(|value| Self::format_cell(&value))
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    fn format_cell(value: &AnyValue) -> String {
        match value {
            AnyValue::Null => String::new(),
            AnyValue::Float64(v) => format!("{:.2}", v),
            AnyValue::Float32(v) => format!("{:.2}", v),
            AnyValue::String(s) => s.to_string(),
            other => other.to_string().trim_matches('"').to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Markdown table of at most `limit` rows.
    pub fn to_markdown(&self, limit: usize) -> String {
        let mut out = String::new();
        out.push_str(&format!("| {} |\n", self.columns.join(" | ")));
        out.push_str(&format!(
            "|{}|\n",
            self.columns.iter().map(|_| "---").collect::<Vec<_>>().join("|")
        ));
        for row in self.rows.iter().take(limit) {
            out.push_str(&format!("| {} |\n", row.join(" | ")));
        }
        if self.rows.len() > limit {
            out.push_str(&format!("\n_{} more rows not shown_\n", self.rows.len() - limit));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_frame_formats_cells() {
        let df = df! {
            "id" => [7i64, 8],
            "price" => [Some(1234.5f64), None],
            "season" => ["winter", "fall"]
        }
        .unwrap();

        let view = TableView::from_frame(&df);
        assert_eq!(view.columns, vec!["id", "price", "season"]);
        assert_eq!(
            view.rows,
            vec![
                vec!["7".to_string(), "1234.50".to_string(), "winter".to_string()],
                vec!["8".to_string(), String::new(), "fall".to_string()],
            ]
        );
    }

    #[test]
    fn test_markdown_limit() {
        let df = df! { "a" => [1i64, 2, 3] }.unwrap();
        let md = TableView::from_frame(&df).to_markdown(2);
        assert!(md.starts_with("| a |\n|---|\n| 1 |\n| 2 |\n"));
        assert!(md.contains("1 more rows not shown"));
    }
}
