// Ranking View
// Top-N selection over a filtered subset: keep rows where a required flag
// is Yes, stable-sort by a numeric column, truncate.

use std::cmp::Ordering;

use crate::store::{FlagColumn, NumericColumn, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Lower is better (time-based marks)
    Ascending,
    /// Higher is more notable (probabilities)
    Descending,
}

/// First `n` rows with `required_flag` = Yes, ordered by `sort_column`.
///
/// The sort is stable, so ties keep their original subset order. Rows with
/// a missing sort value order last in either direction. Returns fewer than
/// `n` rows (possibly none) without error when the subset runs short.
pub fn top_n<'a>(
    subset: &[&'a Record],
    sort_column: NumericColumn,
    direction: SortDirection,
    n: usize,
    required_flag: FlagColumn,
) -> Vec<&'a Record> {
    let mut rows: Vec<&Record> = subset
        .iter()
        .copied()
        .filter(|r| required_flag.of(r).is_yes())
        .collect();

    rows.sort_by(|a, b| compare(sort_column.of(a), sort_column.of(b), direction));
    rows.truncate(n);
    rows
}

fn compare(a: Option<f64>, b: Option<f64>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let ordering = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_fixtures::{store_of, test_record};
    use crate::store::TriState;

    fn breaker(name: &str, mark: Option<f64>) -> Record {
        let mut record = test_record(name, "Men", "100m", "USA");
        record.mark_numeric = mark;
        record.actual_national_record_breaker = TriState::Yes;
        record
    }

    #[test]
    fn test_top_n_sorted_flagged_and_bounded() {
        let mut non_breaker = breaker("E", Some(1.0));
        non_breaker.actual_national_record_breaker = TriState::No;

        let store = store_of(vec![
            breaker("A", Some(9.8)),
            breaker("B", Some(9.6)),
            non_breaker,
            breaker("C", Some(9.9)),
            breaker("D", Some(9.7)),
        ]);
        let subset: Vec<&_> = store.records().iter().collect();

        let top = top_n(
            &subset,
            NumericColumn::Mark,
            SortDirection::Ascending,
            3,
            FlagColumn::ActualNationalRecord,
        );

        assert_eq!(top.len(), 3);
        // Non-decreasing marks, flag Yes on every row
        let marks: Vec<f64> = top.iter().map(|r| r.mark_numeric.unwrap()).collect();
        assert_eq!(marks, vec![9.6, 9.7, 9.8]);
        assert!(top
            .iter()
            .all(|r| r.actual_national_record_breaker == TriState::Yes));
    }

    #[test]
    fn test_top_n_descending_by_probability() {
        let mut a = test_record("A", "Men", "100m", "USA");
        a.probability_world_record_breaker = Some(0.3);
        a.predicted_world_record_breaker = TriState::Yes;
        let mut b = test_record("B", "Men", "100m", "USA");
        b.probability_world_record_breaker = Some(0.9);
        b.predicted_world_record_breaker = TriState::Yes;

        let store = store_of(vec![a, b]);
        let subset: Vec<&_> = store.records().iter().collect();

        let top = top_n(
            &subset,
            NumericColumn::Probability,
            SortDirection::Descending,
            10,
            FlagColumn::PredictedWorldRecord,
        );

        let names: Vec<_> = top.iter().map(|r| r.competitor.as_deref().unwrap()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_ties_keep_original_order() {
        let store = store_of(vec![
            breaker("first", Some(9.7)),
            breaker("second", Some(9.7)),
            breaker("third", Some(9.7)),
        ]);
        let subset: Vec<&_> = store.records().iter().collect();

        let top = top_n(
            &subset,
            NumericColumn::Mark,
            SortDirection::Ascending,
            10,
            FlagColumn::ActualNationalRecord,
        );
        let names: Vec<_> = top.iter().map(|r| r.competitor.as_deref().unwrap()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_missing_values_sort_last_in_both_directions() {
        let store = store_of(vec![
            breaker("missing", None),
            breaker("present", Some(9.7)),
        ]);
        let subset: Vec<&_> = store.records().iter().collect();

        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let top = top_n(
                &subset,
                NumericColumn::Mark,
                direction,
                10,
                FlagColumn::ActualNationalRecord,
            );
            assert_eq!(top[0].competitor.as_deref(), Some("present"));
            assert_eq!(top[1].competitor.as_deref(), Some("missing"));
        }
    }

    #[test]
    fn test_empty_subset_returns_empty() {
        let top = top_n(
            &[],
            NumericColumn::Mark,
            SortDirection::Ascending,
            10,
            FlagColumn::ActualNationalRecord,
        );
        assert!(top.is_empty());
    }
}
