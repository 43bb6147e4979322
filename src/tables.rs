// Supplementary top-10 tables
// Pre-computed per-sex/category breakdowns, displayed verbatim. No schema
// contract beyond a header row; cells stay strings.

use std::path::Path;

use crate::error::LoadError;

/// One verbatim reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplementaryTable {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SupplementaryTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The six standard tables produced by the offline prediction run, in
/// display order (men first, then women).
pub const STANDARD_TABLES: &[(&str, &str)] = &[
    (
        "top_10_men_national_record_breakers.csv",
        "Men's National Record Breakers",
    ),
    (
        "top_10_men_personal_best_breakers.csv",
        "Men's Personal Best Breakers",
    ),
    (
        "top_10_men_world_record_breakers.csv",
        "Men's World Record Breakers",
    ),
    (
        "top_10_women_national_record_breakers.csv",
        "Women's National Record Breakers",
    ),
    (
        "top_10_women_personal_best_breakers.csv",
        "Women's Personal Best Breakers",
    ),
    (
        "top_10_women_world_record_breakers.csv",
        "Women's World Record Breakers",
    ),
];

/// Load one table verbatim.
pub fn load_table(path: &Path, title: &str) -> Result<SupplementaryTable, LoadError> {
    if !path.exists() {
        return Err(LoadError::SourceMissing(path.to_path_buf()));
    }

    let mut rdr = csv::Reader::from_path(path).map_err(|e| LoadError::Csv {
        path: path.to_path_buf(),
        source: e,
    })?;

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| LoadError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| LoadError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(SupplementaryTable {
        title: title.to_string(),
        headers,
        rows,
    })
}

/// Load all six standard tables from a data directory.
pub fn load_standard_set(data_dir: &Path) -> Result<Vec<SupplementaryTable>, LoadError> {
    STANDARD_TABLES
        .iter()
        .map(|(file, title)| load_table(&data_dir.join(file), title))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_table_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("top.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        // Arbitrary columns: no schema is enforced beyond the header row
        file.write_all(b"competitor,Discipline,mark\nA,100m,9.58\nB,200m,19.19\n")
            .unwrap();

        let table = load_table(&path, "Test Table").unwrap();
        assert_eq!(table.title, "Test Table");
        assert_eq!(table.headers, vec!["competitor", "Discipline", "mark"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["B", "200m", "19.19"]);
    }

    #[test]
    fn test_missing_table_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_table(&dir.path().join("absent.csv"), "Absent").unwrap_err();
        assert!(matches!(err, LoadError::SourceMissing(_)));
    }

    #[test]
    fn test_standard_set_requires_all_six() {
        let dir = tempfile::tempdir().unwrap();
        for (file, _) in &STANDARD_TABLES[..5] {
            let mut f = std::fs::File::create(dir.path().join(file)).unwrap();
            f.write_all(b"competitor\nA\n").unwrap();
        }

        // Sixth file missing
        assert!(load_standard_set(dir.path()).is_err());

        let mut f =
            std::fs::File::create(dir.path().join(STANDARD_TABLES[5].0)).unwrap();
        f.write_all(b"competitor\nA\n").unwrap();

        let tables = load_standard_set(dir.path()).unwrap();
        assert_eq!(tables.len(), 6);
        assert_eq!(tables[0].title, "Men's National Record Breakers");
    }
}
