// Chart dataset builders
// Plain structured data for the presentation layer: histograms, grouped
// counts, scatter points, and flag distributions. No rendering dependency
// here, so everything stays testable without a terminal.

use std::collections::BTreeMap;

use crate::store::{FlagColumn, NumericColumn, Record, TriState};

/// Bin count matching the original probability histogram.
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

// ============================================================================
// HISTOGRAM
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width bins over the observed min..max of a numeric column.
/// Missing values are skipped; an empty subset (or one with no present
/// values) yields no bins. When every value is identical the result is a
/// single degenerate bin holding all of them.
pub fn histogram(subset: &[&Record], column: NumericColumn, bins: usize) -> Vec<HistogramBin> {
    let values: Vec<f64> = subset.iter().filter_map(|r| column.of(r)).collect();
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for value in &values {
        let mut index = ((value - min) / width) as usize;
        if index >= bins {
            index = bins - 1; // max value lands in the last bin
        }
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count,
        })
        .collect()
}

// ============================================================================
// GROUPED BAR COUNTS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct DisciplineFlagCount {
    pub discipline: String,
    pub value: TriState,
    pub count: usize,
}

/// Per-discipline counts of a flag column, disciplines sorted, values in
/// Yes/No/Unknown order, zero-count pairs omitted.
pub fn counts_by_discipline(subset: &[&Record], column: FlagColumn) -> Vec<DisciplineFlagCount> {
    let mut grouped: BTreeMap<&str, [usize; 3]> = BTreeMap::new();
    for record in subset {
        let slot = match column.of(record) {
            TriState::Yes => 0,
            TriState::No => 1,
            TriState::Unknown => 2,
        };
        grouped.entry(record.discipline.as_str()).or_default()[slot] += 1;
    }

    let mut result = Vec::new();
    for (discipline, counts) in grouped {
        for (slot, value) in [TriState::Yes, TriState::No, TriState::Unknown]
            .into_iter()
            .enumerate()
        {
            if counts[slot] > 0 {
                result.push(DisciplineFlagCount {
                    discipline: discipline.to_string(),
                    value,
                    count: counts[slot],
                });
            }
        }
    }
    result
}

// ============================================================================
// SCATTER
// ============================================================================

/// One scatter point with the hover fields the original dashboard showed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub flag: TriState,
    pub competitor: Option<String>,
    pub discipline: String,
    pub nationality: String,
}

/// Mark-vs-probability style scatter data, colored by a flag column.
/// Rows missing either coordinate are skipped.
pub fn scatter(
    subset: &[&Record],
    x: NumericColumn,
    y: NumericColumn,
    color: FlagColumn,
) -> Vec<ScatterPoint> {
    subset
        .iter()
        .filter_map(|record| {
            let x = x.of(record)?;
            let y = y.of(record)?;
            Some(ScatterPoint {
                x,
                y,
                flag: color.of(record),
                competitor: record.competitor.clone(),
                discipline: record.discipline.clone(),
                nationality: record.nationality.clone(),
            })
        })
        .collect()
}

// ============================================================================
// DISTRIBUTIONS
// ============================================================================

/// Yes/No/Unknown counts of one flag column (pie-chart input).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagDistribution {
    pub yes: usize,
    pub no: usize,
    pub unknown: usize,
}

impl FlagDistribution {
    pub fn known_total(self) -> usize {
        self.yes + self.no
    }

    pub fn total(self) -> usize {
        self.yes + self.no + self.unknown
    }
}

pub fn flag_distribution(subset: &[&Record], column: FlagColumn) -> FlagDistribution {
    let mut distribution = FlagDistribution::default();
    for record in subset {
        match column.of(record) {
            TriState::Yes => distribution.yes += 1,
            TriState::No => distribution.no += 1,
            TriState::Unknown => distribution.unknown += 1,
        }
    }
    distribution
}

/// One slice of the predicted-vs-actual comparison pie.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesCount {
    /// CSV header of the source column
    pub series: &'static str,
    pub value: bool,
    pub count: usize,
}

/// Melted comparison of two flag columns: for each column, counts of its
/// known values. Unknown rows are dropped from the melt, matching the
/// original dashboard's null exclusion.
pub fn predicted_vs_actual(
    subset: &[&Record],
    predicted: FlagColumn,
    actual: FlagColumn,
) -> Vec<SeriesCount> {
    let mut result = Vec::new();
    for column in [predicted, actual] {
        let distribution = flag_distribution(subset, column);
        for (value, count) in [(true, distribution.yes), (false, distribution.no)] {
            if count > 0 {
                result.push(SeriesCount {
                    series: column.header(),
                    value,
                    count,
                });
            }
        }
    }
    result
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_fixtures::{store_of, test_record};

    fn with_probability(name: &str, probability: f64) -> Record {
        let mut record = test_record(name, "Men", "100m", "USA");
        record.probability_world_record_breaker = Some(probability);
        record
    }

    #[test]
    fn test_histogram_bins_cover_range() {
        let store = store_of(vec![
            with_probability("A", 0.0),
            with_probability("B", 0.25),
            with_probability("C", 0.5),
            with_probability("D", 1.0),
        ]);
        let subset: Vec<&_> = store.records().iter().collect();

        let bins = histogram(&subset, NumericColumn::Probability, 4);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins[0].count, 1); // 0.0
        assert_eq!(bins[1].count, 1); // 0.25
        assert_eq!(bins[2].count, 1); // 0.5
        assert_eq!(bins[3].count, 1); // 1.0 lands in the last bin
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);
    }

    #[test]
    fn test_histogram_degenerate_cases() {
        assert!(histogram(&[], NumericColumn::Probability, 20).is_empty());

        let store = store_of(vec![with_probability("A", 0.5), with_probability("B", 0.5)]);
        let subset: Vec<&_> = store.records().iter().collect();
        let bins = histogram(&subset, NumericColumn::Probability, 20);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 2);
    }

    #[test]
    fn test_counts_by_discipline_sorted_and_sparse() {
        let mut sprint_yes = test_record("A", "Men", "200m", "USA");
        sprint_yes.predicted_world_record_breaker = TriState::Yes;
        let mut dash_no = test_record("B", "Men", "100m", "USA");
        dash_no.predicted_world_record_breaker = TriState::No;
        let mut dash_no_2 = test_record("C", "Men", "100m", "JAM");
        dash_no_2.predicted_world_record_breaker = TriState::No;

        let store = store_of(vec![sprint_yes, dash_no, dash_no_2]);
        let subset: Vec<&_> = store.records().iter().collect();

        let counts = counts_by_discipline(&subset, FlagColumn::PredictedWorldRecord);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].discipline, "100m");
        assert_eq!(counts[0].value, TriState::No);
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[1].discipline, "200m");
        assert_eq!(counts[1].value, TriState::Yes);
    }

    #[test]
    fn test_scatter_skips_rows_missing_coordinates() {
        let mut complete = test_record("A", "Men", "100m", "USA");
        complete.mark_numeric = Some(9.58);
        complete.probability_world_record_breaker = Some(0.91);
        complete.actual_world_record_breaker = TriState::Yes;

        let mut incomplete = test_record("B", "Men", "100m", "JAM");
        incomplete.probability_world_record_breaker = Some(0.4);

        let store = store_of(vec![complete, incomplete]);
        let subset: Vec<&_> = store.records().iter().collect();

        let points = scatter(
            &subset,
            NumericColumn::Mark,
            NumericColumn::Probability,
            FlagColumn::ActualWorldRecord,
        );
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].competitor.as_deref(), Some("A"));
        assert_eq!(points[0].flag, TriState::Yes);
    }

    #[test]
    fn test_predicted_vs_actual_drops_unknown() {
        let mut a = test_record("A", "Men", "100m", "USA");
        a.predicted_world_record_breaker = TriState::Yes;
        a.actual_world_record_breaker = TriState::Unknown;
        let mut b = test_record("B", "Men", "100m", "USA");
        b.predicted_world_record_breaker = TriState::No;
        b.actual_world_record_breaker = TriState::Yes;

        let store = store_of(vec![a, b]);
        let subset: Vec<&_> = store.records().iter().collect();

        let slices = predicted_vs_actual(
            &subset,
            FlagColumn::PredictedWorldRecord,
            FlagColumn::ActualWorldRecord,
        );

        // Predicted contributes one Yes and one No; actual contributes a
        // single Yes (A's unknown actual is dropped).
        assert_eq!(slices.len(), 3);
        let actual_total: usize = slices
            .iter()
            .filter(|s| s.series == FlagColumn::ActualWorldRecord.header())
            .map(|s| s.count)
            .sum();
        assert_eq!(actual_total, 1);
    }
}
