// Record Store & Field Normalizer
// Loads the per-sex comparison CSVs into one immutable in-memory table and
// converts the raw "Yes"/"No"/"Unknown" columns into explicit tri-state flags.

use anyhow::Result as AnyResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{InvalidColumnReport, LoadError};

// ============================================================================
// TRI-STATE FLAGS
// ============================================================================

/// Outcome flag with an explicit unknown state.
///
/// `Unknown` is a first-class value: it never folds into `No`, and every
/// aggregate that depends on a flag must exclude unknown rows explicitly
/// rather than treating them as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TriState {
    Yes,
    No,
    #[default]
    Unknown,
}

impl TriState {
    pub fn is_yes(self) -> bool {
        matches!(self, TriState::Yes)
    }

    pub fn is_known(self) -> bool {
        !matches!(self, TriState::Unknown)
    }

    /// Known value as a bool; `None` for unknown
    pub fn known(self) -> Option<bool> {
        match self {
            TriState::Yes => Some(true),
            TriState::No => Some(false),
            TriState::Unknown => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TriState::Yes => "Yes",
            TriState::No => "No",
            TriState::Unknown => "Unknown",
        }
    }

    /// Parse a raw categorical cell. Empty/absent cells are unknown; any
    /// literal outside the fixed mapping is rejected (batched by the loader).
    fn parse(raw: &str) -> Option<TriState> {
        match raw.trim() {
            "Yes" => Some(TriState::Yes),
            "No" => Some(TriState::No),
            "Unknown" | "" => Some(TriState::Unknown),
            _ => None,
        }
    }
}

// ============================================================================
// COLUMN SELECTORS
// ============================================================================

/// Tri-state flag columns, selectable by value so the filter, aggregator,
/// ranking, and chart builders never pass column names as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagColumn {
    PredictedWorldRecord,
    WorldRecordCorrect,
    ActualWorldRecord,
    ActualNationalRecord,
    ActualPersonalBest,
    PredictedNationalRecord,
    PredictedPersonalBest,
}

impl FlagColumn {
    /// CSV header for this column
    pub fn header(self) -> &'static str {
        match self {
            FlagColumn::PredictedWorldRecord => "Predicted_World_Record_Breaker",
            FlagColumn::WorldRecordCorrect => "World_Record_Correct",
            FlagColumn::ActualWorldRecord => "Actual_World_Record_Breaker",
            FlagColumn::ActualNationalRecord => "Actual_National_Record_Breaker",
            FlagColumn::ActualPersonalBest => "Actual_Personal_Best_Breaker",
            FlagColumn::PredictedNationalRecord => "Predicted_National_Record_Breaker",
            FlagColumn::PredictedPersonalBest => "Predicted_Personal_Best_Breaker",
        }
    }

    /// Read this column's value from a record
    pub fn of(self, record: &Record) -> TriState {
        match self {
            FlagColumn::PredictedWorldRecord => record.predicted_world_record_breaker,
            FlagColumn::WorldRecordCorrect => record.world_record_correct,
            FlagColumn::ActualWorldRecord => record.actual_world_record_breaker,
            FlagColumn::ActualNationalRecord => record.actual_national_record_breaker,
            FlagColumn::ActualPersonalBest => record.actual_personal_best_breaker,
            FlagColumn::PredictedNationalRecord => record.predicted_national_record_breaker,
            FlagColumn::PredictedPersonalBest => record.predicted_personal_best_breaker,
        }
    }
}

/// Numeric columns usable for means, rankings, and chart axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericColumn {
    Mark,
    Probability,
}

impl NumericColumn {
    pub fn header(self) -> &'static str {
        match self {
            NumericColumn::Mark => "mark_numeric",
            NumericColumn::Probability => "Probability_World_Record_Breaker",
        }
    }

    pub fn of(self, record: &Record) -> Option<f64> {
        match self {
            NumericColumn::Mark => record.mark_numeric,
            NumericColumn::Probability => record.probability_world_record_breaker,
        }
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// Raw CSV row before normalization. Flag columns stay as text here so the
/// normalizer can batch invalid literals per column instead of failing on
/// the first bad row.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "competitor")]
    competitor: Option<String>,

    #[serde(rename = "Sex")]
    sex: String,

    #[serde(rename = "Discipline")]
    discipline: String,

    #[serde(rename = "Nationality")]
    nationality: String,

    #[serde(rename = "mark_numeric")]
    mark_numeric: Option<f64>,

    #[serde(rename = "Probability_World_Record_Breaker")]
    probability_world_record_breaker: Option<f64>,

    #[serde(rename = "Predicted_World_Record_Breaker", default)]
    predicted_world_record_breaker: Option<String>,

    #[serde(rename = "World_Record_Correct", default)]
    world_record_correct: Option<String>,

    #[serde(rename = "Actual_World_Record_Breaker", default)]
    actual_world_record_breaker: Option<String>,

    #[serde(rename = "Actual_National_Record_Breaker", default)]
    actual_national_record_breaker: Option<String>,

    #[serde(rename = "Actual_Personal_Best_Breaker", default)]
    actual_personal_best_breaker: Option<String>,

    // Only present in some prediction exports
    #[serde(rename = "Predicted_National_Record_Breaker", default)]
    predicted_national_record_breaker: Option<String>,

    #[serde(rename = "Predicted_Personal_Best_Breaker", default)]
    predicted_personal_best_breaker: Option<String>,
}

/// One competitor-discipline observation, normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub competitor: Option<String>,
    pub sex: String,
    pub discipline: String,
    pub nationality: String,
    pub mark_numeric: Option<f64>,
    pub probability_world_record_breaker: Option<f64>,
    pub predicted_world_record_breaker: TriState,
    pub world_record_correct: TriState,
    pub actual_world_record_breaker: TriState,
    pub actual_national_record_breaker: TriState,
    pub actual_personal_best_breaker: TriState,
    pub predicted_national_record_breaker: TriState,
    pub predicted_personal_best_breaker: TriState,
}

// ============================================================================
// RECORD STORE
// ============================================================================

/// Columns every comparison source must carry. The two predicted
/// national/personal-best columns are optional and tracked separately.
const MANDATORY_COLUMNS: &[&str] = &[
    "competitor",
    "Sex",
    "Discipline",
    "Nationality",
    "mark_numeric",
    "Probability_World_Record_Breaker",
    "Predicted_World_Record_Breaker",
    "World_Record_Correct",
    "Actual_World_Record_Breaker",
    "Actual_National_Record_Breaker",
    "Actual_Personal_Best_Breaker",
];

/// Flag columns the normalizer converts, in report order.
const FLAG_COLUMNS: &[FlagColumn] = &[
    FlagColumn::PredictedWorldRecord,
    FlagColumn::WorldRecordCorrect,
    FlagColumn::ActualWorldRecord,
    FlagColumn::ActualNationalRecord,
    FlagColumn::ActualPersonalBest,
    FlagColumn::PredictedNationalRecord,
    FlagColumn::PredictedPersonalBest,
];

/// Immutable in-memory table of all comparison rows.
///
/// Built once at startup by concatenating the input sources in order (each
/// source's internal row order preserved, no deduplication) and normalizing
/// the categorical flag columns. Read-only thereafter; every filtered
/// subset, aggregate, and ranking is a freshly computed view.
#[derive(Debug, Clone)]
pub struct RecordStore {
    records: Vec<Record>,
    has_predicted_national: bool,
    has_predicted_personal_best: bool,
}

impl RecordStore {
    /// Load and normalize all sources. Fails on a missing file, a missing
    /// mandatory column, or (batched per column) invalid categorical values.
    pub fn load<P: AsRef<Path>>(sources: &[P]) -> Result<RecordStore, LoadError> {
        let mut raws: Vec<RawRecord> = Vec::new();
        let mut has_predicted_national = false;
        let mut has_predicted_personal_best = false;

        for source in sources {
            let path = source.as_ref();
            if !path.exists() {
                return Err(LoadError::SourceMissing(path.to_path_buf()));
            }

            let mut rdr = csv::Reader::from_path(path).map_err(|e| LoadError::Csv {
                path: path.to_path_buf(),
                source: e,
            })?;

            let headers = rdr
                .headers()
                .map_err(|e| LoadError::Csv {
                    path: path.to_path_buf(),
                    source: e,
                })?
                .clone();

            for column in MANDATORY_COLUMNS {
                if !headers.iter().any(|h| h == *column) {
                    return Err(LoadError::MissingColumn {
                        path: path.to_path_buf(),
                        column: (*column).to_string(),
                    });
                }
            }

            has_predicted_national |= headers
                .iter()
                .any(|h| h == FlagColumn::PredictedNationalRecord.header());
            has_predicted_personal_best |= headers
                .iter()
                .any(|h| h == FlagColumn::PredictedPersonalBest.header());

            for result in rdr.deserialize() {
                let raw: RawRecord = result.map_err(|e| LoadError::Csv {
                    path: path.to_path_buf(),
                    source: e,
                })?;
                raws.push(raw);
            }
        }

        let records = normalize(raws)?;

        Ok(RecordStore {
            records,
            has_predicted_national,
            has_predicted_personal_best,
        })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a flag column was present in at least one source. Metrics
    /// over an absent column report "not available" instead of zero.
    pub fn has_column(&self, column: FlagColumn) -> bool {
        match column {
            FlagColumn::PredictedNationalRecord => self.has_predicted_national,
            FlagColumn::PredictedPersonalBest => self.has_predicted_personal_best,
            _ => true,
        }
    }

    /// Distinct sex values in first-seen order (matches the source layout:
    /// men's file first, then women's)
    pub fn sex_options(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.sex) {
                seen.push(record.sex.clone());
            }
        }
        seen
    }

    /// Distinct disciplines, sorted
    pub fn discipline_options(&self) -> Vec<String> {
        sorted_distinct(self.records.iter().map(|r| r.discipline.as_str()))
    }

    /// Distinct nationalities, sorted
    pub fn nationality_options(&self) -> Vec<String> {
        sorted_distinct(self.records.iter().map(|r| r.nationality.as_str()))
    }
}

fn sorted_distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::new();
    for value in values {
        if !distinct.iter().any(|v| v == value) {
            distinct.push(value.to_string());
        }
    }
    distinct.sort();
    distinct
}

/// Convert raw flag text to tri-state values. Invalid literals are collected
/// per column across all rows and surfaced as one batched error.
fn normalize(raws: Vec<RawRecord>) -> Result<Vec<Record>, LoadError> {
    let mut invalid: BTreeMap<&'static str, InvalidColumnReport> = BTreeMap::new();
    let mut records = Vec::with_capacity(raws.len());

    for (row, raw) in raws.into_iter().enumerate() {
        let mut flag = |column: FlagColumn, cell: &Option<String>| -> TriState {
            let raw_value = cell.as_deref().unwrap_or("");
            match TriState::parse(raw_value) {
                Some(value) => value,
                None => {
                    let report =
                        invalid
                            .entry(column.header())
                            .or_insert_with(|| InvalidColumnReport {
                                column: column.header().to_string(),
                                rows: Vec::new(),
                                literals: Vec::new(),
                            });
                    report.rows.push(row);
                    if !report.literals.iter().any(|l| l == raw_value) {
                        report.literals.push(raw_value.to_string());
                    }
                    TriState::Unknown
                }
            }
        };

        let record = Record {
            predicted_world_record_breaker: flag(
                FlagColumn::PredictedWorldRecord,
                &raw.predicted_world_record_breaker,
            ),
            world_record_correct: flag(FlagColumn::WorldRecordCorrect, &raw.world_record_correct),
            actual_world_record_breaker: flag(
                FlagColumn::ActualWorldRecord,
                &raw.actual_world_record_breaker,
            ),
            actual_national_record_breaker: flag(
                FlagColumn::ActualNationalRecord,
                &raw.actual_national_record_breaker,
            ),
            actual_personal_best_breaker: flag(
                FlagColumn::ActualPersonalBest,
                &raw.actual_personal_best_breaker,
            ),
            predicted_national_record_breaker: flag(
                FlagColumn::PredictedNationalRecord,
                &raw.predicted_national_record_breaker,
            ),
            predicted_personal_best_breaker: flag(
                FlagColumn::PredictedPersonalBest,
                &raw.predicted_personal_best_breaker,
            ),
            competitor: raw.competitor,
            sex: raw.sex,
            discipline: raw.discipline,
            nationality: raw.nationality,
            mark_numeric: raw.mark_numeric,
            probability_world_record_breaker: raw.probability_world_record_breaker,
        };
        records.push(record);
    }

    if invalid.is_empty() {
        Ok(records)
    } else {
        // Report order follows the configured column order, not BTreeMap order
        let mut reports = Vec::new();
        for column in FLAG_COLUMNS {
            if let Some(report) = invalid.remove(column.header()) {
                reports.push(report);
            }
        }
        Err(LoadError::InvalidCategorical(reports))
    }
}

/// Convenience loader for the standard pair of comparison sources
/// (men first, then women, matching the original dashboard layout).
pub fn load_comparison_store(data_dir: &Path) -> AnyResult<RecordStore> {
    use anyhow::Context;

    let men = data_dir.join("Men_Track_Record_Comparison.csv");
    let women = data_dir.join("Women_Track_Record_Comparison.csv");

    RecordStore::load(&[men, women]).context("Failed to load comparison dataset")
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;

    /// Record with the given categoricals and everything else unset
    pub fn test_record(name: &str, sex: &str, discipline: &str, nationality: &str) -> Record {
        Record {
            competitor: Some(name.to_string()),
            sex: sex.to_string(),
            discipline: discipline.to_string(),
            nationality: nationality.to_string(),
            mark_numeric: None,
            probability_world_record_breaker: None,
            predicted_world_record_breaker: TriState::Unknown,
            world_record_correct: TriState::Unknown,
            actual_world_record_breaker: TriState::Unknown,
            actual_national_record_breaker: TriState::Unknown,
            actual_personal_best_breaker: TriState::Unknown,
            predicted_national_record_breaker: TriState::Unknown,
            predicted_personal_best_breaker: TriState::Unknown,
        }
    }

    /// Store over pre-built records, with every flag column considered present
    pub fn store_of(records: Vec<Record>) -> RecordStore {
        RecordStore {
            records,
            has_predicted_national: true,
            has_predicted_personal_best: true,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
