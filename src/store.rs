//! In-memory session store for fetched comparison and analysis payloads.
//!
//! The store owns the full, unfiltered record sets for the lifetime of one
//! displayed report. Filtering is a pure read: predicates and pages are
//! rebuilt by the caller on every render cycle and hold no state here.

use crate::model::{
    AnalysisResults, ComparisonResults, ConcatenatedEntry, DiffStatus, DifferenceRecord,
    FileComparison,
};
use crate::search::{SearchPredicate, SearchScope};

#[derive(Debug, Default)]
pub struct ResultStore {
    comparison: Option<ComparisonResults>,
    analysis: Option<AnalysisResults>,
}

impl ResultStore {
    pub fn new() -> ResultStore {
        ResultStore::default()
    }

    /// Replace the displayed comparison report.
    pub fn set_comparison(&mut self, results: ComparisonResults) {
        self.comparison = Some(results);
    }

    pub fn set_analysis(&mut self, results: AnalysisResults) {
        self.analysis = Some(results);
    }

    pub fn comparison(&self) -> Option<&ComparisonResults> {
        self.comparison.as_ref()
    }

    pub fn analysis(&self) -> Option<&AnalysisResults> {
        self.analysis.as_ref()
    }

    /// Drop everything for a fresh comparison run.
    pub fn clear(&mut self) {
        self.comparison = None;
        self.analysis = None;
    }

    /// Sheet names of the active report, in stable order.
    pub fn sheets(&self) -> Vec<&str> {
        self.comparison
            .as_ref()
            .map(|c| c.results.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Comparison files available for one sheet.
    pub fn files_for(&self, sheet: &str) -> Vec<&str> {
        self.comparison
            .as_ref()
            .and_then(|c| c.results.get(sheet))
            .map(|files| {
                files
                    .iter()
                    .map(|f| f.comparison_file.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The per-file result block for a sheet, falling back to the first
    /// file when `file` is absent from the report.
    pub fn file_comparison(&self, sheet: &str, file: Option<&str>) -> Option<&FileComparison> {
        let files = self.comparison.as_ref()?.results.get(sheet)?;
        match file {
            Some(name) => files
                .iter()
                .find(|f| f.comparison_file == name)
                .or_else(|| files.first()),
            None => files.first(),
        }
    }

    /// Difference rows for one sheet/file after the status filter and the
    /// search predicate. Pure and re-entrant.
    pub fn filtered_differences<'a>(
        &'a self,
        sheet: &str,
        file: Option<&str>,
        status: Option<DiffStatus>,
        predicate: &SearchPredicate,
        scope: &SearchScope,
    ) -> Vec<&'a DifferenceRecord> {
        let Some(block) = self.file_comparison(sheet, file) else {
            return Vec::new();
        };
        block
            .differences
            .iter()
            .filter(|rec| status.is_none_or(|s| rec.status == s))
            .filter(|rec| predicate.matches(rec, scope))
            .collect()
    }

    /// Concatenated analysis entries after the optional client/equipment/
    /// date filters: client is a containment match, equipment is exact,
    /// and the date (dashes stripped) must appear in either bound.
    pub fn filtered_concatenated(
        &self,
        client: Option<&str>,
        equipment: Option<&str>,
        date: Option<&str>,
    ) -> Vec<&ConcatenatedEntry> {
        let Some(analysis) = self.analysis.as_ref() else {
            return Vec::new();
        };
        let date_compact = date.map(|d| d.replace('-', ""));
        analysis
            .concatenated_data
            .iter()
            .filter(|entry| client.is_none_or(|c| entry.client.contains(c)))
            .filter(|entry| equipment.is_none_or(|e| entry.material_number == e))
            .filter(|entry| {
                date_compact.as_deref().is_none_or(|d| {
                    entry.date_debut.contains(d) || entry.date_fin.contains(d)
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ComparisonSummary;
    use std::collections::BTreeMap;

    fn record(key: &str, status: DiffStatus) -> DifferenceRecord {
        DifferenceRecord {
            key: key.to_string(),
            column: Some("Commentaire".to_string()),
            base_value: "avant".to_string(),
            comparison_value: "apres".to_string(),
            status,
        }
    }

    fn store_with_three_statuses() -> ResultStore {
        let mut results = BTreeMap::new();
        results.insert(
            "Lens".to_string(),
            vec![FileComparison {
                comparison_file: "planning.xlsx".to_string(),
                differences: vec![
                    record("K1", DiffStatus::Added),
                    record("K2", DiffStatus::Modified),
                    record("K3", DiffStatus::Removed),
                ],
                ..Default::default()
            }],
        );
        let mut store = ResultStore::new();
        store.set_comparison(ComparisonResults {
            results,
            summary: ComparisonSummary::default(),
            timestamp: String::new(),
        });
        store
    }

    #[test]
    fn test_status_filter_is_independent_of_search_term() {
        let store = store_with_three_statuses();
        // A term matching every row must not widen the status filter.
        let predicate = SearchPredicate::compile("K", false, false);
        let rows = store.filtered_differences(
            "Lens",
            None,
            Some(DiffStatus::Modified),
            &predicate,
            &SearchScope::All,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "K2");
    }

    #[test]
    fn test_filtered_differences_unknown_sheet_is_empty() {
        let store = store_with_three_statuses();
        let predicate = SearchPredicate::compile("", false, false);
        let rows = store.filtered_differences("Douai", None, None, &predicate, &SearchScope::All);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_missing_file_falls_back_to_first() {
        let store = store_with_three_statuses();
        let block = store.file_comparison("Lens", Some("absent.xlsx")).unwrap();
        assert_eq!(block.comparison_file, "planning.xlsx");
    }

    #[test]
    fn test_filtered_concatenated_date_strips_dashes() {
        let mut store = ResultStore::new();
        store.set_analysis(AnalysisResults {
            concatenated_data: vec![
                ConcatenatedEntry {
                    material_number: "E100".to_string(),
                    client: "SNCF, Alpha".to_string(),
                    date_debut: "20240115_0800".to_string(),
                    date_fin: "20240117_1700".to_string(),
                    ..Default::default()
                },
                ConcatenatedEntry {
                    material_number: "E200".to_string(),
                    client: "Beta".to_string(),
                    date_debut: "20240301_0800".to_string(),
                    date_fin: "20240302_1700".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        });

        let hits = store.filtered_concatenated(None, None, Some("2024-01-15"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].material_number, "E100");

        let hits = store.filtered_concatenated(Some("Alpha"), Some("E100"), None);
        assert_eq!(hits.len(), 1);

        let hits = store.filtered_concatenated(None, Some("E1"), None);
        assert!(hits.is_empty(), "equipment filter is exact, not prefix");
    }

    #[test]
    fn test_clear_drops_both_payloads() {
        let mut store = store_with_three_statuses();
        store.set_analysis(AnalysisResults::default());
        store.clear();
        assert!(store.comparison().is_none());
        assert!(store.analysis().is_none());
        assert!(store.sheets().is_empty());
    }
}
