// Error taxonomy for dataset loading
// All query-time operations (filter/aggregate/ranking) are total and never
// appear here; only startup loading can fail.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// One flag column that held unrecognized categorical literals, batched
/// across every offending row so the user sees a single report per column
/// instead of one error per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidColumnReport {
    /// CSV header of the offending column
    pub column: String,
    /// Row indices (store order, 0-based) that held an invalid literal
    pub rows: Vec<usize>,
    /// Distinct offending literals, in first-seen order
    pub literals: Vec<String>,
}

impl fmt::Display for InvalidColumnReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "column '{}': {} row(s) with unrecognized value(s) {:?} (rows {:?})",
            self.column,
            self.rows.len(),
            self.literals,
            self.rows
        )
    }
}

/// Errors raised while constructing the record store or loading the
/// supplementary tables. All variants are fatal at startup.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("source file not found: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("failed to read {}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: missing mandatory column '{column}'", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    /// Tri-state flag columns only accept "Yes"/"No"/"Unknown"; anything
    /// else would silently corrupt every downstream aggregate, so loading
    /// aborts with one batched report per offending column.
    #[error("invalid categorical values: {}", format_reports(.0))]
    InvalidCategorical(Vec<InvalidColumnReport>),
}

fn format_reports(reports: &[InvalidColumnReport]) -> String {
    reports
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_categorical_lists_every_column_once() {
        let err = LoadError::InvalidCategorical(vec![
            InvalidColumnReport {
                column: "Predicted_World_Record_Breaker".to_string(),
                rows: vec![2, 7],
                literals: vec!["Maybe".to_string()],
            },
            InvalidColumnReport {
                column: "Actual_World_Record_Breaker".to_string(),
                rows: vec![7],
                literals: vec!["TRUE".to_string()],
            },
        ]);

        let msg = err.to_string();
        assert!(msg.contains("Predicted_World_Record_Breaker"));
        assert!(msg.contains("Actual_World_Record_Breaker"));
        assert!(msg.contains("[2, 7]"));
    }

    #[test]
    fn test_missing_column_names_source_and_column() {
        let err = LoadError::MissingColumn {
            path: PathBuf::from("men.csv"),
            column: "Sex".to_string(),
        };
        assert_eq!(err.to_string(), "men.csv: missing mandatory column 'Sex'");
    }
}
