// Aggregator
// Scalar summaries over a filtered subset. Every metric is fail-soft: an
// empty subset or an absent column yields a "not available" sentinel, never
// an error at query time.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::store::{FlagColumn, NumericColumn, Record, RecordStore};

// ============================================================================
// METRIC SENTINEL
// ============================================================================

/// A scalar metric that may be undefined for the given subset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Value(f64),
    NotAvailable,
}

impl Metric {
    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(v),
            Metric::NotAvailable => None,
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, Metric::Value(_))
    }

    /// Render with a fixed number of decimals, or "N/A"
    pub fn format(self, decimals: usize) -> String {
        match self {
            Metric::Value(v) => format!("{v:.decimals$}"),
            Metric::NotAvailable => "N/A".to_string(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Value(v) => write!(f, "{v}"),
            Metric::NotAvailable => write!(f, "N/A"),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Metric::Value(v) => serializer.serialize_f64(*v),
            Metric::NotAvailable => serializer.serialize_none(),
        }
    }
}

// ============================================================================
// SCALAR AGGREGATES
// ============================================================================

/// Row count; always defined, 0 for an empty subset.
pub fn count(subset: &[&Record]) -> usize {
    subset.len()
}

/// Arithmetic mean over the present values of a numeric column.
/// Not available when the subset is empty or every value is missing.
pub fn mean(subset: &[&Record], column: NumericColumn) -> Metric {
    let mut sum = 0.0;
    let mut present = 0usize;
    for record in subset {
        if let Some(value) = column.of(record) {
            sum += value;
            present += 1;
        }
    }
    if present == 0 {
        Metric::NotAvailable
    } else {
        Metric::Value(sum / present as f64)
    }
}

/// Count of rows where the flag is Yes. Unknown contributes nothing,
/// exactly like No; it is never coerced to a zero that could then be
/// mistaken for an observed "No".
pub fn sum_true(subset: &[&Record], column: FlagColumn) -> usize {
    subset.iter().filter(|r| column.of(r).is_yes()).count()
}

/// Count of rows where the flag has a known value.
pub fn count_known(subset: &[&Record], column: FlagColumn) -> usize {
    subset.iter().filter(|r| column.of(r).is_known()).count()
}

/// Prediction accuracy as a percentage, restricted to rows whose actual
/// outcome is known. A row with an unknown actual never enters the
/// denominator, whatever its predicted value. Not available when no row
/// has a known actual.
pub fn accuracy(subset: &[&Record], predicted: FlagColumn, actual: FlagColumn) -> Metric {
    let mut known = 0usize;
    let mut matched = 0usize;
    for record in subset {
        if let Some(actual_value) = actual.of(record).known() {
            known += 1;
            if predicted.of(record).known() == Some(actual_value) {
                matched += 1;
            }
        }
    }
    if known == 0 {
        Metric::NotAvailable
    } else {
        Metric::Value(matched as f64 / known as f64 * 100.0)
    }
}

// ============================================================================
// DASHBOARD SUMMARY
// ============================================================================

/// The dashboard's metric block, computed in one pass over the subset.
///
/// `Option<usize>` counts are `None` when the metric is not available:
/// either the optional predicted column is absent from the store, or no row
/// in the subset has a known value for the flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub total_records: usize,
    pub mean_mark: Metric,
    pub mean_probability: Metric,
    pub predicted_world_record_breakers: usize,
    pub actual_world_record_breakers: usize,
    pub world_record_accuracy: Metric,
    pub predicted_national_record_breakers: Option<usize>,
    pub actual_national_record_breakers: Option<usize>,
    pub predicted_personal_best_breakers: Option<usize>,
    pub actual_personal_best_breakers: Option<usize>,
}

/// Compute the full metric block for a filtered subset. The store is
/// consulted only for optional-column presence.
pub fn summary(store: &RecordStore, subset: &[&Record]) -> MetricsSummary {
    MetricsSummary {
        total_records: count(subset),
        mean_mark: mean(subset, NumericColumn::Mark),
        mean_probability: mean(subset, NumericColumn::Probability),
        predicted_world_record_breakers: sum_true(subset, FlagColumn::PredictedWorldRecord),
        actual_world_record_breakers: sum_true(subset, FlagColumn::ActualWorldRecord),
        world_record_accuracy: accuracy(
            subset,
            FlagColumn::PredictedWorldRecord,
            FlagColumn::ActualWorldRecord,
        ),
        predicted_national_record_breakers: optional_sum(
            store,
            subset,
            FlagColumn::PredictedNationalRecord,
        ),
        actual_national_record_breakers: known_sum(subset, FlagColumn::ActualNationalRecord),
        predicted_personal_best_breakers: optional_sum(
            store,
            subset,
            FlagColumn::PredictedPersonalBest,
        ),
        actual_personal_best_breakers: known_sum(subset, FlagColumn::ActualPersonalBest),
    }
}

/// Yes-count for a column that may be absent from every source.
fn optional_sum(store: &RecordStore, subset: &[&Record], column: FlagColumn) -> Option<usize> {
    if store.has_column(column) {
        Some(sum_true(subset, column))
    } else {
        None
    }
}

/// Yes-count restricted to rows with a known value; not available when the
/// flag is unknown across the whole subset.
fn known_sum(subset: &[&Record], column: FlagColumn) -> Option<usize> {
    if count_known(subset, column) == 0 {
        None
    } else {
        Some(sum_true(subset, column))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{filter, FilterCriteria};
    use crate::store::test_fixtures::{store_of, test_record};
    use crate::store::TriState;

    fn approx(metric: Metric, expected: f64) -> bool {
        metric.value().is_some_and(|v| (v - expected).abs() < 1e-9)
    }

    #[test]
    fn test_count_and_mean_on_empty_subset() {
        assert_eq!(count(&[]), 0);
        assert_eq!(mean(&[], NumericColumn::Mark), Metric::NotAvailable);
        assert_eq!(
            accuracy(&[], FlagColumn::PredictedWorldRecord, FlagColumn::ActualWorldRecord),
            Metric::NotAvailable
        );
    }

    #[test]
    fn test_mean_skips_missing_values() {
        let mut a = test_record("A", "Men", "100m", "USA");
        a.mark_numeric = Some(9.0);
        let mut b = test_record("B", "Men", "100m", "USA");
        b.mark_numeric = None;
        let mut c = test_record("C", "Men", "100m", "USA");
        c.mark_numeric = Some(11.0);

        let store = store_of(vec![a, b, c]);
        let subset: Vec<&_> = store.records().iter().collect();
        assert!(approx(mean(&subset, NumericColumn::Mark), 10.0));
    }

    #[test]
    fn test_sum_true_treats_unknown_like_no() {
        let mut yes = test_record("A", "Men", "100m", "USA");
        yes.predicted_world_record_breaker = TriState::Yes;
        let mut no = test_record("B", "Men", "100m", "USA");
        no.predicted_world_record_breaker = TriState::No;
        let unknown = test_record("C", "Men", "100m", "USA");

        let store = store_of(vec![yes, no, unknown]);
        let subset: Vec<&_> = store.records().iter().collect();
        assert_eq!(sum_true(&subset, FlagColumn::PredictedWorldRecord), 1);
    }

    #[test]
    fn test_accuracy_excludes_unknown_actuals() {
        // Predicted right, actual known
        let mut hit = test_record("A", "Men", "100m", "USA");
        hit.predicted_world_record_breaker = TriState::Yes;
        hit.actual_world_record_breaker = TriState::Yes;

        // Predicted wrong, actual known
        let mut miss = test_record("B", "Men", "100m", "USA");
        miss.predicted_world_record_breaker = TriState::Yes;
        miss.actual_world_record_breaker = TriState::No;

        // Actual unknown: must not affect the metric at all
        let mut out = test_record("C", "Men", "100m", "USA");
        out.predicted_world_record_breaker = TriState::Yes;
        out.actual_world_record_breaker = TriState::Unknown;

        let store = store_of(vec![hit, miss, out]);
        let subset: Vec<&_> = store.records().iter().collect();
        let metric = accuracy(
            &subset,
            FlagColumn::PredictedWorldRecord,
            FlagColumn::ActualWorldRecord,
        );
        assert!(approx(metric, 50.0));
    }

    #[test]
    fn test_unknown_prediction_counts_as_mismatch() {
        let mut record = test_record("A", "Men", "100m", "USA");
        record.predicted_world_record_breaker = TriState::Unknown;
        record.actual_world_record_breaker = TriState::No;

        let store = store_of(vec![record]);
        let subset: Vec<&_> = store.records().iter().collect();
        let metric = accuracy(
            &subset,
            FlagColumn::PredictedWorldRecord,
            FlagColumn::ActualWorldRecord,
        );
        // Denominator 1 (actual known), numerator 0 (unknown != No)
        assert!(approx(metric, 0.0));
    }

    #[test]
    fn test_known_sum_not_available_when_all_unknown() {
        let store = store_of(vec![
            test_record("A", "Men", "100m", "USA"),
            test_record("B", "Men", "100m", "USA"),
        ]);
        let subset: Vec<&_> = store.records().iter().collect();
        let block = summary(&store, &subset);
        assert_eq!(block.actual_national_record_breakers, None);
        assert_eq!(block.actual_personal_best_breakers, None);
    }

    #[test]
    fn test_metric_formatting() {
        assert_eq!(Metric::Value(9.583).format(2), "9.58");
        assert_eq!(Metric::NotAvailable.format(2), "N/A");
        assert_eq!(
            serde_json::to_string(&Metric::NotAvailable).unwrap(),
            "null"
        );
    }

    #[test]
    fn test_end_to_end_scenario() {
        // Two-record scenario: filter by sex, aggregate the survivor, and
        // check accuracy over the unfiltered pair.
        let mut a = test_record("A", "Men", "100m", "USA");
        a.mark_numeric = Some(9.58);
        a.probability_world_record_breaker = Some(0.91);
        a.predicted_world_record_breaker = TriState::Yes;
        a.actual_world_record_breaker = TriState::Yes;

        let mut b = test_record("B", "Women", "100m", "JAM");
        b.mark_numeric = Some(10.49);
        b.probability_world_record_breaker = Some(0.40);
        b.predicted_world_record_breaker = TriState::No;
        b.actual_world_record_breaker = TriState::Unknown;

        let store = store_of(vec![a, b]);

        let criteria = FilterCriteria {
            sexes: ["Men".to_string()].into_iter().collect(),
            disciplines: ["100m".to_string()].into_iter().collect(),
            ..FilterCriteria::default()
        };
        let men = filter(&store, &criteria);
        assert_eq!(men.len(), 1);
        assert_eq!(men[0].competitor.as_deref(), Some("A"));

        assert_eq!(count(&men), 1);
        assert!(approx(mean(&men, NumericColumn::Mark), 9.58));
        assert_eq!(sum_true(&men, FlagColumn::PredictedWorldRecord), 1);

        // Unfiltered accuracy: B's unknown actual leaves only A in the
        // denominator, and A was predicted correctly.
        let all: Vec<&_> = store.records().iter().collect();
        let metric = accuracy(
            &all,
            FlagColumn::PredictedWorldRecord,
            FlagColumn::ActualWorldRecord,
        );
        assert!(approx(metric, 100.0));
    }
}
