// Filter Engine
// Conjunctive predicate evaluation over the record store. Pure: never
// mutates the store, always preserves store row order.

use std::collections::BTreeSet;

use crate::store::{Record, RecordStore, TriState};

/// User-selected filter criteria.
///
/// Empty-set semantics are deliberately asymmetric, matching the observed
/// dashboard behavior: an empty `sexes` or `disciplines` selection excludes
/// every row, while an empty `nationalities` selection means "no nationality
/// restriction". See DESIGN.md before changing this.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    /// Accepted sex values; empty set passes no rows
    pub sexes: BTreeSet<String>,
    /// Accepted disciplines; empty set passes no rows
    pub disciplines: BTreeSet<String>,
    /// Accepted nationalities; empty set applies no restriction
    pub nationalities: BTreeSet<String>,
    /// Case-insensitive substring over `competitor`; rows with no
    /// competitor value never match an active search
    pub name_substring: Option<String>,
    /// When set, restricts `Predicted_World_Record_Breaker` to these known
    /// values; unknown rows are always excluded while active
    pub predicted_flag_values: Option<BTreeSet<bool>>,
    /// Same, for `Actual_World_Record_Breaker`
    pub actual_flag_values: Option<BTreeSet<bool>>,
}

impl FilterCriteria {
    /// The dashboard's initial state: every sex and discipline selected,
    /// no nationality restriction, no search, no flag filters.
    pub fn all_of(store: &RecordStore) -> FilterCriteria {
        FilterCriteria {
            sexes: store.sex_options().into_iter().collect(),
            disciplines: store.discipline_options().into_iter().collect(),
            ..FilterCriteria::default()
        }
    }
}

/// Select the rows satisfying every active criterion, in store order.
pub fn filter<'a>(store: &'a RecordStore, criteria: &FilterCriteria) -> Vec<&'a Record> {
    // Lowercase the needle once, not per row
    let needle: Option<String> = criteria
        .name_substring
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    store
        .records()
        .iter()
        .filter(|record| matches(record, criteria, needle.as_deref()))
        .collect()
}

fn matches(record: &Record, criteria: &FilterCriteria, needle: Option<&str>) -> bool {
    if !criteria.sexes.contains(&record.sex) {
        return false;
    }
    if !criteria.disciplines.contains(&record.discipline) {
        return false;
    }
    if !criteria.nationalities.is_empty() && !criteria.nationalities.contains(&record.nationality)
    {
        return false;
    }
    if let Some(needle) = needle {
        match &record.competitor {
            Some(name) => {
                if !name.to_lowercase().contains(needle) {
                    return false;
                }
            }
            None => return false,
        }
    }
    if !flag_accepted(record.predicted_world_record_breaker, &criteria.predicted_flag_values) {
        return false;
    }
    if !flag_accepted(record.actual_world_record_breaker, &criteria.actual_flag_values) {
        return false;
    }
    true
}

/// An active flag filter only ever offers {true, false}, so unknown rows
/// are excluded whenever the filter is set.
fn flag_accepted(value: TriState, accepted: &Option<BTreeSet<bool>>) -> bool {
    match accepted {
        None => true,
        Some(accepted) => match value.known() {
            Some(known) => accepted.contains(&known),
            None => false,
        },
    }
}

// ============================================================================
// TESTS
// ============================================================================
